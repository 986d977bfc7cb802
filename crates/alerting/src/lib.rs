//! Alerting System
//!
//! Delivers a drowsiness alert over speech, tone, and vibration with fixed
//! relative offsets. Every channel is fire-and-forget: one failing channel
//! never stops the others.

mod backends;
mod channels;
mod config;
mod orchestrator;

pub use backends::{DeliveryEvent, DeliveryKind, LogBackend, RecordingBackend};
pub use channels::{
    AlertChannels, Channel, SpeechOutput, Tone, TonePlayer, ToneStrategy, Unsupported,
    Utterance, VibrationOutput, Waveform,
};
pub use config::{AlertConfig, Phrase, VibrationIntensity};
pub use orchestrator::{AlertOrchestrator, AlertRequest};

use thiserror::Error;

/// Alert delivery errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlertError {
    #[error("{0} channel unavailable")]
    ChannelUnavailable(Channel),

    #[error("Playback failed on {channel}: {reason}")]
    Playback { channel: Channel, reason: String },

    #[error("No tone strategy succeeded ({attempted} tried)")]
    NoToneStrategy { attempted: usize },

    #[error("Tone already playing")]
    ToneBusy,

    #[error("Configuration error: {0}")]
    Config(String),
}
