//! Blink frequency anomaly detection

use dms::Observation;
use serde::{Deserialize, Serialize};

use crate::assessed;

/// Result of a blink-rate analysis over one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BlinkAnalysis {
    /// Assessed observations in the window
    pub observations: usize,
    /// Open-to-closed transitions in the window
    pub blinks: usize,
    /// Blinks per minute, `None` when there was too little data
    pub blinks_per_minute: Option<f64>,
    /// Rate outside the normal band
    pub anomalous: bool,
}

/// Flags blink rates that are too low or too high
///
/// A blink is a rising edge from open to closed. The count is scaled
/// linearly from the window length to one minute.
#[derive(Debug, Clone, Copy)]
pub struct BlinkFrequency {
    pub window_ms: u64,
    pub min_observations: usize,
    /// Rates strictly below this are anomalous (under-blinking)
    pub low_rate_per_min: f64,
    /// Rates strictly above this are anomalous (rapid blinking)
    pub high_rate_per_min: f64,
}

impl Default for BlinkFrequency {
    fn default() -> Self {
        Self {
            window_ms: 10_000,
            min_observations: 10,
            low_rate_per_min: 8.0,
            high_rate_per_min: 35.0,
        }
    }
}

impl BlinkFrequency {
    /// Count rising edges from open to closed, skipping frames without a face
    pub fn count_blinks(window: &[Observation]) -> usize {
        let mut blinks = 0;
        let mut was_open = true;
        for observation in assessed(window) {
            let closed = observation.eye_state.both_closed;
            if was_open && closed {
                blinks += 1;
            }
            was_open = !closed;
        }
        blinks
    }

    pub fn analyze(&self, window: &[Observation]) -> BlinkAnalysis {
        let observations = assessed(window).count();
        if observations < self.min_observations || self.window_ms == 0 {
            return BlinkAnalysis {
                observations,
                ..Default::default()
            };
        }

        let blinks = Self::count_blinks(window);
        let rate = blinks as f64 * 60_000.0 / self.window_ms as f64;

        BlinkAnalysis {
            observations,
            blinks,
            blinks_per_minute: Some(rate),
            anomalous: rate < self.low_rate_per_min || rate > self.high_rate_per_min,
        }
    }

    pub fn is_anomalous(&self, window: &[Observation]) -> bool {
        self.analyze(window).anomalous
    }
}
