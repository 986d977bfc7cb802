//! Alert Orchestrator Implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::channels::{AlertChannels, Channel, Tone, Utterance};
use crate::config::{AlertConfig, VibrationIntensity};
use crate::AlertError;

/// Parameters of a single alert
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRequest {
    /// Volume fraction (0-1)
    pub volume: f32,
    pub intensity: VibrationIntensity,
    /// Whether spoken steps run
    pub voice: bool,
}

impl Default for AlertRequest {
    fn default() -> Self {
        Self {
            volume: 0.7,
            intensity: VibrationIntensity::High,
            voice: true,
        }
    }
}

/// Runs alert sequences over the delivery channels
///
/// Overlapping sequences are not suppressed here; the caller rate-limits.
pub struct AlertOrchestrator {
    config: Arc<AlertConfig>,
    channels: AlertChannels,
    /// Sequences started so far, also drives phrase rotation
    alert_count: AtomicU64,
    /// Delayed steps of in-flight sequences
    pending: Mutex<Vec<AbortHandle>>,
}

impl AlertOrchestrator {
    pub fn new(config: AlertConfig, channels: AlertChannels) -> Result<Self, AlertError> {
        config.validate()?;
        info!("Creating alert orchestrator with {} phrases", config.phrases.len());
        Ok(Self {
            config: Arc::new(config),
            channels,
            alert_count: AtomicU64::new(0),
            pending: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Start an alert sequence and return its number (1-based).
    ///
    /// Vibration and the rotating phrase go out immediately, the tone
    /// follows after a short delay, the reinforcing tone and vibration only
    /// run if `condition` still reads true, and the safety reminder closes
    /// the sequence. Must be called within a tokio runtime.
    pub fn fire(&self, request: AlertRequest, condition: watch::Receiver<bool>) -> u64 {
        let number = self.alert_count.fetch_add(1, Ordering::SeqCst) + 1;
        let volume = request.volume.clamp(0.0, 1.0);
        let pattern = request.intensity.pattern();
        info!(
            alert = number,
            volume,
            intensity = ?request.intensity,
            voice = request.voice,
            "Firing drowsiness alert"
        );

        deliver(Channel::Vibration, self.channels.vibrate(pattern));

        if request.voice {
            let index = ((number - 1) % self.config.phrases.len() as u64) as usize;
            let phrase = &self.config.phrases[index];
            deliver(Channel::Speech, self.channels.speak(&self.utterance(&phrase.text)));
            if phrase.wind {
                deliver(Channel::Tone, self.channels.tone.play_layered(&Tone::wind()));
            }
        }

        let config = self.config.clone();
        let channels = self.channels.clone();
        let start = Instant::now();
        let task = tokio::spawn(async move {
            sleep_until(start + Duration::from_millis(config.tone_delay_ms)).await;
            let tone = Tone::alert(config.tone_frequency_hz, config.tone_duration_ms, volume);
            deliver(Channel::Tone, channels.play_tone(&tone));

            sleep_until(start + Duration::from_millis(config.secondary_delay_ms)).await;
            if *condition.borrow() {
                let tone = Tone::alert(
                    config.tone_frequency_hz,
                    config.tone_duration_ms,
                    volume * config.secondary_volume_factor,
                );
                deliver(Channel::Tone, channels.play_tone(&tone));
                deliver(Channel::Vibration, channels.vibrate(pattern));
            } else {
                debug!(alert = number, "Condition cleared, skipping reinforcement");
            }

            sleep_until(start + Duration::from_millis(config.reminder_delay_ms)).await;
            if request.voice {
                let reminder = Utterance {
                    text: config.safety_reminder.clone(),
                    rate: config.speech_rate,
                    pitch: config.speech_pitch,
                    volume: config.speech_volume,
                };
                deliver(Channel::Speech, channels.speak(&reminder));
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());
        pending.push(task.abort_handle());

        number
    }

    /// Abort every pending step and silence all channels
    pub fn stop_all(&self) {
        let handles: Vec<AbortHandle> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let aborted = handles.iter().filter(|handle| !handle.is_finished()).count();
        for handle in handles {
            handle.abort();
        }
        info!("Stopping all alerts ({} sequences in flight)", aborted);

        deliver(Channel::Speech, self.channels.speech.cancel());
        deliver(Channel::Vibration, self.channels.vibration.stop());
        self.channels.tone.reset();
    }

    /// Sequences started so far
    pub fn alert_count(&self) -> u64 {
        self.alert_count.load(Ordering::SeqCst)
    }

    /// Sequences with delayed steps still outstanding
    pub fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    fn utterance(&self, text: &str) -> Utterance {
        Utterance {
            text: text.to_string(),
            rate: self.config.speech_rate,
            pitch: self.config.speech_pitch,
            volume: self.config.speech_volume,
        }
    }
}

/// Log a channel failure without propagating it
fn deliver(channel: Channel, result: Result<(), AlertError>) {
    match result {
        Ok(()) => {}
        Err(AlertError::ToneBusy) => debug!("Tone still playing, skipped"),
        Err(e) => warn!("Alert delivery on {} channel failed: {}", channel, e),
    }
}
