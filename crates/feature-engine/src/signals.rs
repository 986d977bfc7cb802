//! Combined drowsiness signals

use dms::DetectionHistory;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blink::{BlinkAnalysis, BlinkFrequency};
use crate::closure::EyeClosure;
use crate::yawn::YawnDetector;
use crate::SignalError;

/// Windows and thresholds for the three aggregators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Eye closure window (ms)
    pub eye_closure_window_ms: u64,
    /// Yawn window (ms)
    pub yawn_window_ms: u64,
    /// Yawning share of the window that counts as sustained (%)
    pub yawn_threshold_pct: f64,
    /// Blink window (ms)
    pub blink_window_ms: u64,
    /// Observations needed before the blink rate is judged
    pub blink_min_observations: usize,
    /// Lower bound of the normal blink rate (per minute)
    pub blink_low_per_min: f64,
    /// Upper bound of the normal blink rate (per minute)
    pub blink_high_per_min: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            eye_closure_window_ms: 3_000,
            yawn_window_ms: 3_000,
            yawn_threshold_pct: 25.0,
            blink_window_ms: 10_000,
            blink_min_observations: 10,
            blink_low_per_min: 8.0,
            blink_high_per_min: 35.0,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        for (field, value) in [
            ("eye_closure_window_ms", self.eye_closure_window_ms),
            ("yawn_window_ms", self.yawn_window_ms),
            ("blink_window_ms", self.blink_window_ms),
        ] {
            if value == 0 {
                return Err(SignalError::ZeroWindow { field });
            }
        }
        if !(0.0..=100.0).contains(&self.yawn_threshold_pct) {
            return Err(SignalError::OutOfRange {
                field: "yawn_threshold_pct",
                value: self.yawn_threshold_pct,
                min: 0.0,
                max: 100.0,
            });
        }
        if !(self.blink_low_per_min >= 0.0 && self.blink_low_per_min < self.blink_high_per_min) {
            return Err(SignalError::OutOfRange {
                field: "blink_low_per_min",
                value: self.blink_low_per_min,
                min: 0.0,
                max: self.blink_high_per_min,
            });
        }
        Ok(())
    }
}

/// Signals computed for one polling tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessSignals {
    /// Share of the eye window with both eyes closed (0-100)
    pub eye_closure_pct: f64,
    /// Share of the yawn window spent yawning (0-100)
    pub yawn_pct: f64,
    /// Yawning beyond the configured share
    pub yawn_sustained: bool,
    /// Blink-rate analysis
    pub blink: BlinkAnalysis,
}

impl DrowsinessSignals {
    pub fn blink_anomaly(&self) -> bool {
        self.blink.anomalous
    }

    /// Any factor beyond its threshold
    pub fn should_alert(&self, eye_closure_threshold_pct: f64) -> bool {
        self.eye_closure_pct > eye_closure_threshold_pct || self.yawn_sustained || self.blink.anomalous
    }

    /// Number of factors currently active
    pub fn active_factors(&self, eye_closure_threshold_pct: f64) -> usize {
        usize::from(self.eye_closure_pct > eye_closure_threshold_pct)
            + usize::from(self.yawn_sustained)
            + usize::from(self.blink.anomalous)
    }
}

/// Runs all three aggregators over a detection history
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    config: SignalConfig,
    yawn: YawnDetector,
    blink: BlinkFrequency,
}

impl SignalExtractor {
    pub fn new(config: SignalConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            yawn: YawnDetector::new(config.yawn_threshold_pct),
            blink: BlinkFrequency {
                window_ms: config.blink_window_ms,
                min_observations: config.blink_min_observations,
                low_rate_per_min: config.blink_low_per_min,
                high_rate_per_min: config.blink_high_per_min,
            },
            config,
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Compute all signals for the history as of `now_ms`
    pub fn extract(&self, history: &DetectionHistory, now_ms: u64) -> DrowsinessSignals {
        let eye_window = history.read_window(self.config.eye_closure_window_ms, now_ms);
        let yawn_window = history.read_window(self.config.yawn_window_ms, now_ms);
        let blink_window = history.read_window(self.config.blink_window_ms, now_ms);

        let yawn_pct = YawnDetector::percentage(&yawn_window);
        let signals = DrowsinessSignals {
            eye_closure_pct: EyeClosure::percentage(&eye_window),
            yawn_pct,
            yawn_sustained: yawn_pct > self.yawn.threshold_pct,
            blink: self.blink.analyze(&blink_window),
        };

        debug!(
            eye_closure_pct = signals.eye_closure_pct,
            yawn_pct = signals.yawn_pct,
            blinks = signals.blink.blinks,
            blink_anomaly = signals.blink.anomalous,
            "Signals over {} observations",
            blink_window.len()
        );

        signals
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        let config = SignalConfig::default();
        Self {
            yawn: YawnDetector::new(config.yawn_threshold_pct),
            blink: BlinkFrequency::default(),
            config,
        }
    }
}
