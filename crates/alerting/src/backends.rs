//! Built-in delivery backends

use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;
use tracing::info;

use crate::channels::{
    AlertChannels, Channel, SpeechOutput, Tone, TonePlayer, ToneStrategy, Utterance,
    VibrationOutput,
};
use crate::AlertError;

/// Backend that only logs what it would deliver
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBackend;

impl ToneStrategy for LogBackend {
    fn name(&self) -> &'static str {
        "log"
    }

    fn play(&self, tone: &Tone) -> Result<(), AlertError> {
        info!(
            frequency_hz = tone.frequency_hz,
            waveform = ?tone.waveform,
            duration_ms = tone.duration_ms,
            volume = tone.volume,
            "Tone"
        );
        Ok(())
    }
}

impl SpeechOutput for LogBackend {
    fn speak(&self, utterance: &Utterance) -> Result<(), AlertError> {
        info!(text = %utterance.text, volume = utterance.volume, "Speech");
        Ok(())
    }

    fn cancel(&self) -> Result<(), AlertError> {
        info!("Speech cancelled");
        Ok(())
    }
}

impl VibrationOutput for LogBackend {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), AlertError> {
        info!(?pattern, "Vibration");
        Ok(())
    }

    fn stop(&self) -> Result<(), AlertError> {
        info!("Vibration stopped");
        Ok(())
    }
}

/// What a backend was asked to deliver
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryKind {
    Tone { frequency_hz: f32, volume: f32 },
    Speech { text: String },
    SpeechCancelled,
    Vibration { pattern: Vec<u64> },
    VibrationStopped,
}

impl DeliveryKind {
    pub fn channel(&self) -> Channel {
        match self {
            DeliveryKind::Tone { .. } => Channel::Tone,
            DeliveryKind::Speech { .. } | DeliveryKind::SpeechCancelled => Channel::Speech,
            DeliveryKind::Vibration { .. } | DeliveryKind::VibrationStopped => Channel::Vibration,
        }
    }
}

/// A delivery with the time it happened
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEvent {
    pub at: Instant,
    pub kind: DeliveryKind,
}

/// Backend that records every delivery with its timestamp
#[derive(Debug, Default)]
pub struct RecordingBackend {
    events: Mutex<Vec<DeliveryEvent>>,
    unsupported: Vec<Channel>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make one channel report itself as unavailable
    pub fn with_unsupported(mut self, channel: Channel) -> Self {
        self.unsupported.push(channel);
        self
    }

    pub fn events(&self) -> Vec<DeliveryEvent> {
        self.lock().clone()
    }

    /// Recorded deliveries on one channel
    pub fn events_on(&self, channel: Channel) -> Vec<DeliveryEvent> {
        self.lock()
            .iter()
            .filter(|event| event.kind.channel() == channel)
            .cloned()
            .collect()
    }

    /// Texts spoken so far, in order
    pub fn spoken(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match &event.kind {
                DeliveryKind::Speech { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DeliveryEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, channel: Channel, kind: DeliveryKind) -> Result<(), AlertError> {
        if self.unsupported.contains(&channel) {
            return Err(AlertError::ChannelUnavailable(channel));
        }
        self.lock().push(DeliveryEvent {
            at: Instant::now(),
            kind,
        });
        Ok(())
    }
}

impl ToneStrategy for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn play(&self, tone: &Tone) -> Result<(), AlertError> {
        self.record(
            Channel::Tone,
            DeliveryKind::Tone {
                frequency_hz: tone.frequency_hz,
                volume: tone.volume,
            },
        )
    }
}

impl SpeechOutput for RecordingBackend {
    fn speak(&self, utterance: &Utterance) -> Result<(), AlertError> {
        self.record(
            Channel::Speech,
            DeliveryKind::Speech {
                text: utterance.text.clone(),
            },
        )
    }

    fn cancel(&self) -> Result<(), AlertError> {
        self.record(Channel::Speech, DeliveryKind::SpeechCancelled)
    }
}

impl VibrationOutput for RecordingBackend {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), AlertError> {
        self.record(
            Channel::Vibration,
            DeliveryKind::Vibration {
                pattern: pattern.to_vec(),
            },
        )
    }

    fn stop(&self) -> Result<(), AlertError> {
        self.record(Channel::Vibration, DeliveryKind::VibrationStopped)
    }
}

impl AlertChannels {
    /// Every channel backed by [`LogBackend`]
    pub fn logging() -> Self {
        let backend = Arc::new(LogBackend);
        let tone: Arc<dyn ToneStrategy> = backend.clone();
        Self::new(TonePlayer::new(vec![tone]), backend.clone(), backend)
    }

    /// Every channel backed by one shared [`RecordingBackend`]
    pub fn recording(backend: Arc<RecordingBackend>) -> Self {
        let tone: Arc<dyn ToneStrategy> = backend.clone();
        Self::new(TonePlayer::new(vec![tone]), backend.clone(), backend)
    }
}
