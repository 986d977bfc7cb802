//! Alert delivery configuration

use serde::{Deserialize, Serialize};

use crate::AlertError;

/// Vibration strength chosen by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VibrationIntensity {
    Low,
    Medium,
    #[default]
    High,
}

impl VibrationIntensity {
    /// On/off pattern in milliseconds
    pub fn pattern(&self) -> &'static [u64] {
        match self {
            VibrationIntensity::Low => &[100, 50, 100],
            VibrationIntensity::Medium => &[200, 100, 200],
            VibrationIntensity::High => &[300, 100, 300, 100, 300],
        }
    }
}

/// One spoken alert phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub text: String,
    /// Accompany the phrase with a low wind sound
    #[serde(default)]
    pub wind: bool,
}

impl Phrase {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            wind: false,
        }
    }
}

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Delay of the main tone after speech starts (ms)
    pub tone_delay_ms: u64,
    /// Delay of the reinforcing tone and vibration (ms)
    pub secondary_delay_ms: u64,
    /// Delay of the spoken safety reminder (ms)
    pub reminder_delay_ms: u64,
    /// Tone pitch (Hz)
    pub tone_frequency_hz: f32,
    /// Tone length (ms)
    pub tone_duration_ms: u64,
    /// Reinforcing tone volume relative to the main tone
    pub secondary_volume_factor: f32,
    pub speech_rate: f32,
    pub speech_pitch: f32,
    pub speech_volume: f32,
    /// Phrases spoken in rotation, one per alert
    pub phrases: Vec<Phrase>,
    /// Spoken at the end of every alert sequence
    pub safety_reminder: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            tone_delay_ms: 200,
            secondary_delay_ms: 2_500,
            reminder_delay_ms: 5_000,
            tone_frequency_hz: 880.0,
            tone_duration_ms: 1_000,
            secondary_volume_factor: 0.5,
            speech_rate: 0.9,
            speech_pitch: 1.1,
            speech_volume: 0.8,
            phrases: vec![
                Phrase::plain("You look tired. Please take a break."),
                Phrase::plain("Stay alert! Your safety matters."),
                Phrase::plain("Hydrate yourself and stay focused."),
                Phrase {
                    text: "Fresh air might help. Opening window mode.".to_string(),
                    wind: true,
                },
                Phrase::plain("Consider pulling over for a rest."),
            ],
            safety_reminder: "Please pull over somewhere safe and rest before driving on."
                .to_string(),
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.phrases.is_empty() {
            return Err(AlertError::Config("phrase list is empty".into()));
        }
        if !(self.tone_delay_ms <= self.secondary_delay_ms
            && self.secondary_delay_ms <= self.reminder_delay_ms)
        {
            return Err(AlertError::Config(format!(
                "step delays must be ordered: tone {}ms, secondary {}ms, reminder {}ms",
                self.tone_delay_ms, self.secondary_delay_ms, self.reminder_delay_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.secondary_volume_factor) {
            return Err(AlertError::Config(format!(
                "secondary_volume_factor must be within [0, 1], got {}",
                self.secondary_volume_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_scale_with_intensity() {
        let total = |i: VibrationIntensity| i.pattern().iter().sum::<u64>();
        assert!(total(VibrationIntensity::Low) < total(VibrationIntensity::Medium));
        assert!(total(VibrationIntensity::Medium) < total(VibrationIntensity::High));
    }

    #[test]
    fn test_default_validates() {
        assert!(AlertConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unordered_delays_rejected() {
        let config = AlertConfig {
            secondary_delay_ms: 6_000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AlertError::Config(_))));
    }
}
