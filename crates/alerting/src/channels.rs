//! Delivery channels
//!
//! Three independent capabilities: tone playback, speech, and vibration.
//! Each may be missing or failing on a given device.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::AlertError;

/// Delivery channel identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Tone,
    Speech,
    Vibration,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Tone => "tone",
            Channel::Speech => "speech",
            Channel::Vibration => "vibration",
        };
        f.write_str(name)
    }
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Square,
    Sawtooth,
    Sine,
}

/// A tone to play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub waveform: Waveform,
    pub duration_ms: u64,
    /// Volume fraction (0-1)
    pub volume: f32,
}

impl Tone {
    /// Harsh attention tone
    pub fn alert(frequency_hz: f32, duration_ms: u64, volume: f32) -> Self {
        Self {
            frequency_hz,
            waveform: Waveform::Square,
            duration_ms,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Low, quiet wind sound
    pub fn wind() -> Self {
        Self {
            frequency_hz: 100.0,
            waveform: Waveform::Sawtooth,
            duration_ms: 5_000,
            volume: 0.1,
        }
    }
}

/// A phrase to speak
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// One way of producing a tone
pub trait ToneStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn play(&self, tone: &Tone) -> Result<(), AlertError>;
}

/// Speech synthesis
pub trait SpeechOutput: Send + Sync {
    /// Speak, interrupting anything already being spoken
    fn speak(&self, utterance: &Utterance) -> Result<(), AlertError>;
    /// Stop speaking
    fn cancel(&self) -> Result<(), AlertError>;
}

/// Haptic feedback
pub trait VibrationOutput: Send + Sync {
    /// Vibrate with an on/off pattern in milliseconds
    fn vibrate(&self, pattern: &[u64]) -> Result<(), AlertError>;
    /// Stop any running pattern
    fn stop(&self) -> Result<(), AlertError>;
}

/// Channel implementation for devices lacking a capability
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl ToneStrategy for Unsupported {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn play(&self, _tone: &Tone) -> Result<(), AlertError> {
        Err(AlertError::ChannelUnavailable(Channel::Tone))
    }
}

impl SpeechOutput for Unsupported {
    fn speak(&self, _utterance: &Utterance) -> Result<(), AlertError> {
        Err(AlertError::ChannelUnavailable(Channel::Speech))
    }

    fn cancel(&self) -> Result<(), AlertError> {
        Err(AlertError::ChannelUnavailable(Channel::Speech))
    }
}

impl VibrationOutput for Unsupported {
    fn vibrate(&self, _pattern: &[u64]) -> Result<(), AlertError> {
        Err(AlertError::ChannelUnavailable(Channel::Vibration))
    }

    fn stop(&self) -> Result<(), AlertError> {
        Err(AlertError::ChannelUnavailable(Channel::Vibration))
    }
}

/// Plays tones through the first strategy that works.
///
/// While a tone is still sounding, further requests are skipped with
/// [`AlertError::ToneBusy`].
pub struct TonePlayer {
    strategies: Vec<Arc<dyn ToneStrategy>>,
    busy_until: Mutex<Option<Instant>>,
}

impl TonePlayer {
    pub fn new(strategies: Vec<Arc<dyn ToneStrategy>>) -> Self {
        Self {
            strategies,
            busy_until: Mutex::new(None),
        }
    }

    pub fn play(&self, tone: &Tone) -> Result<(), AlertError> {
        let now = Instant::now();
        let mut busy_until = self.busy_until.lock().unwrap_or_else(PoisonError::into_inner);
        if busy_until.is_some_and(|until| now < until) {
            return Err(AlertError::ToneBusy);
        }

        self.play_through(tone)?;
        *busy_until = Some(now + Duration::from_millis(tone.duration_ms));
        Ok(())
    }

    /// Play underneath whatever is sounding, without holding the overlap guard
    pub fn play_layered(&self, tone: &Tone) -> Result<(), AlertError> {
        self.play_through(tone)
    }

    fn play_through(&self, tone: &Tone) -> Result<(), AlertError> {
        for strategy in &self.strategies {
            match strategy.play(tone) {
                Ok(()) => return Ok(()),
                Err(e) => debug!("Tone strategy {} failed: {}", strategy.name(), e),
            }
        }

        Err(AlertError::NoToneStrategy {
            attempted: self.strategies.len(),
        })
    }

    /// Forget any tone still sounding
    pub fn reset(&self) {
        *self.busy_until.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// The delivery capabilities available to the orchestrator
#[derive(Clone)]
pub struct AlertChannels {
    pub tone: Arc<TonePlayer>,
    pub speech: Arc<dyn SpeechOutput>,
    pub vibration: Arc<dyn VibrationOutput>,
}

impl AlertChannels {
    pub fn new(
        tone: TonePlayer,
        speech: Arc<dyn SpeechOutput>,
        vibration: Arc<dyn VibrationOutput>,
    ) -> Self {
        Self {
            tone: Arc::new(tone),
            speech,
            vibration,
        }
    }

    /// Channels on a device with no output at all
    pub fn unsupported() -> Self {
        let tone: Arc<dyn ToneStrategy> = Arc::new(Unsupported);
        Self::new(
            TonePlayer::new(vec![tone]),
            Arc::new(Unsupported),
            Arc::new(Unsupported),
        )
    }

    pub fn play_tone(&self, tone: &Tone) -> Result<(), AlertError> {
        self.tone.play(tone)
    }

    pub fn speak(&self, utterance: &Utterance) -> Result<(), AlertError> {
        self.speech.speak(utterance)
    }

    pub fn vibrate(&self, pattern: &[u64]) -> Result<(), AlertError> {
        self.vibration.vibrate(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Counting {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    impl ToneStrategy for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn play(&self, _tone: &Tone) -> Result<(), AlertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AlertError::Playback {
                    channel: Channel::Tone,
                    reason: "device busy".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_in_order() {
        let first = Counting::new(true);
        let second = Counting::new(false);
        let third = Counting::new(false);
        let strategies: Vec<Arc<dyn ToneStrategy>> =
            vec![first.clone(), second.clone(), third.clone()];
        let player = TonePlayer::new(strategies);

        player.play(&Tone::alert(880.0, 1_000, 0.5)).unwrap();
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_strategies_fail() {
        let strategies: Vec<Arc<dyn ToneStrategy>> = vec![Counting::new(true), Arc::new(Unsupported)];
        let player = TonePlayer::new(strategies);
        assert_eq!(
            player.play(&Tone::wind()),
            Err(AlertError::NoToneStrategy { attempted: 2 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_tone_skipped() {
        let strategy: Arc<dyn ToneStrategy> = Counting::new(false);
        let player = TonePlayer::new(vec![strategy]);
        let tone = Tone::alert(880.0, 1_000, 0.5);

        player.play(&tone).unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(player.play(&tone), Err(AlertError::ToneBusy));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(player.play(&tone).is_ok());

        player.reset();
        assert!(player.play(&tone).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_layered_tone_ignores_guard() {
        let strategy: Arc<dyn ToneStrategy> = Counting::new(false);
        let player = TonePlayer::new(vec![strategy]);

        player.play_layered(&Tone::wind()).unwrap();
        assert!(player.play(&Tone::alert(880.0, 1_000, 0.5)).is_ok());
    }

    #[test]
    fn test_alert_tone_clamps_volume() {
        assert_eq!(Tone::alert(880.0, 1_000, 1.7).volume, 1.0);
    }
}
