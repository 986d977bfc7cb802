//! Driver alertness tracking

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Raw readings kept for smoothing
const RAW_HISTORY: usize = 10;
/// Readings averaged into the smoothed level
const SMOOTHING_WINDOW: usize = 5;

/// Alertness bucket shown to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertnessLevel {
    #[default]
    Alert,
    Moderate,
    Drowsy,
}

impl AlertnessLevel {
    /// Bucket a 0-100 alertness score
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            AlertnessLevel::Alert
        } else if score >= 40.0 {
            AlertnessLevel::Moderate
        } else {
            AlertnessLevel::Drowsy
        }
    }
}

/// Smoothed alertness score for a session
///
/// Each reading is `100 - eye closure %`. The reported score is the mean
/// of the last five readings, which damps single-tick swings.
#[derive(Debug, Clone, Default)]
pub struct AlertnessTracker {
    /// Most recent raw readings
    recent: VecDeque<f64>,
    /// Sum of smoothed scores, for the session average
    smoothed_total: f64,
    /// Number of readings this session
    samples: u64,
    /// Highest eye closure percentage seen
    max_eye_closure_pct: f64,
}

impl AlertnessTracker {
    /// Record one tick's eye closure percentage, returning the smoothed score
    pub fn record(&mut self, eye_closure_pct: f64) -> f64 {
        let pct = eye_closure_pct.clamp(0.0, 100.0);
        self.max_eye_closure_pct = self.max_eye_closure_pct.max(pct);

        self.recent.push_back(100.0 - pct);
        if self.recent.len() > RAW_HISTORY {
            self.recent.pop_front();
        }

        let score = self.score();
        self.smoothed_total += score;
        self.samples += 1;
        score
    }

    /// Current smoothed score (100 before any reading)
    pub fn score(&self) -> f64 {
        if self.recent.is_empty() {
            return 100.0;
        }
        let take = self.recent.len().min(SMOOTHING_WINDOW);
        self.recent.iter().rev().take(take).sum::<f64>() / take as f64
    }

    pub fn level(&self) -> AlertnessLevel {
        AlertnessLevel::from_score(self.score())
    }

    /// Mean smoothed score over the session (100 before any reading)
    pub fn session_average(&self) -> f64 {
        if self.samples == 0 {
            100.0
        } else {
            self.smoothed_total / self.samples as f64
        }
    }

    pub fn max_eye_closure_pct(&self) -> f64 {
        self.max_eye_closure_pct
    }

    /// Reset state (on session reset)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
