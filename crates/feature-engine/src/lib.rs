//! Drowsiness Signal Engine
//!
//! Windowed analyses over a session's detection history. Each aggregator
//! reads its own time window; only observations with a detected face
//! count, so "no data" never dilutes or inflates a signal.

mod blink;
mod closure;
mod signals;
mod yawn;

pub use blink::{BlinkAnalysis, BlinkFrequency};
pub use closure::EyeClosure;
pub use signals::{DrowsinessSignals, SignalConfig, SignalExtractor};
pub use yawn::YawnDetector;

use dms::Observation;
use thiserror::Error;

/// Signal configuration errors
#[derive(Debug, Clone, Error)]
pub enum SignalError {
    #[error("{field} must be greater than zero")]
    ZeroWindow { field: &'static str },

    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Observations that carry an assessment (face detected)
pub(crate) fn assessed(window: &[Observation]) -> impl Iterator<Item = &Observation> {
    window.iter().filter(|o| o.face_detected)
}
