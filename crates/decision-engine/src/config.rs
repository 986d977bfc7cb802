//! Decision engine configuration

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Decision timing and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Eye closure share of the window that warrants an alert (%)
    pub eye_closure_alert_pct: f64,
    /// Delay between scheduling and confirming an alert (ms)
    pub debounce_ms: u64,
    /// Minimum spacing between two fired alerts (ms)
    pub cooldown_ms: u64,
    /// Detection polling cadence (ms)
    pub poll_interval_ms: u64,
    /// Observations retained in the detection history
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eye_closure_alert_pct: 70.0,
            debounce_ms: 500,
            cooldown_ms: 3_000,
            poll_interval_ms: 300,
            history_capacity: ring_buffer::DEFAULT_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=100.0).contains(&self.eye_closure_alert_pct) {
            return Err(EngineError::Config(format!(
                "eye_closure_alert_pct must be within [0, 100], got {}",
                self.eye_closure_alert_pct
            )));
        }
        for (field, value) in [
            ("debounce_ms", self.debounce_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(EngineError::Config(format!("{} must be non-zero", field)));
            }
        }
        if self.history_capacity == 0 {
            return Err(EngineError::Config("history_capacity must be non-zero".into()));
        }
        Ok(())
    }
}
