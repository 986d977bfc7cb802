//! Drowsiness Decision Engine
//!
//! Turns the stream of per-frame observations into alert decisions:
//! - Windowed signals recomputed on every observation
//! - 500ms debounce before an alert is confirmed
//! - Eyes reopening cancels a pending confirmation
//! - At most one alert per cooldown period
//!
//! A [`MonitoringSession`] ties the landmarker, the engine, and the alert
//! orchestrator together for one driving session.

pub mod config;
pub mod engine;
pub mod incident;
pub mod pending;
pub mod preferences;
pub mod session;

pub use config::EngineConfig;
pub use engine::{DrowsinessEngine, Phase, TickOutcome};
pub use incident::{AlertReason, IncidentRecord, SessionSummary, Severity};
pub use pending::{cancel_pair, CancelHandle, CancelToken};
pub use preferences::{DetectionMode, Preferences};
pub use session::MonitoringSession;

use alerting::AlertError;
use dms::DmsError;
use feature_engine::SignalError;
use thiserror::Error;

/// Decision engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session already stopped")]
    SessionStopped,

    #[error("Detection error: {0}")]
    Dms(#[from] DmsError),

    #[error("Signal configuration error: {0}")]
    Signals(#[from] SignalError),

    #[error("Alert configuration error: {0}")]
    Alert(#[from] AlertError),
}
