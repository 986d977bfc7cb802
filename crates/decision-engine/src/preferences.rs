//! Driver preferences, read once at session start

use alerting::{AlertRequest, VibrationIntensity};
use serde::{Deserialize, Serialize};

/// How eagerly drowsiness is flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    #[default]
    Standard,
    Sensitive,
    Relaxed,
}

impl DetectionMode {
    /// Multiplier applied to the eye closure threshold
    pub fn threshold_multiplier(&self) -> f64 {
        match self {
            DetectionMode::Standard => 1.0,
            DetectionMode::Sensitive => 0.7,
            DetectionMode::Relaxed => 1.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// 0-100, higher alerts earlier
    pub sensitivity: u8,
    /// 0-100
    pub alert_volume: u8,
    pub vibration_intensity: VibrationIntensity,
    pub voice_alerts: bool,
    pub detection_mode: DetectionMode,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sensitivity: 50,
            alert_volume: 70,
            vibration_intensity: VibrationIntensity::High,
            voice_alerts: true,
            detection_mode: DetectionMode::Standard,
        }
    }
}

impl Preferences {
    /// Eye closure threshold after mode and sensitivity adjustments (%)
    pub fn eye_closure_threshold(&self, base_pct: f64) -> f64 {
        let sensitivity = f64::from(self.sensitivity.min(100));
        let adjust = 1.0 + (50.0 - sensitivity) / 250.0;
        (base_pct * self.detection_mode.threshold_multiplier() * adjust).clamp(10.0, 95.0)
    }

    pub fn volume_fraction(&self) -> f32 {
        f32::from(self.alert_volume.min(100)) / 100.0
    }

    pub fn alert_request(&self) -> AlertRequest {
        AlertRequest {
            volume: self.volume_fraction(),
            intensity: self.vibration_intensity,
            voice: self.voice_alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_threshold_unchanged() {
        assert_eq!(Preferences::default().eye_closure_threshold(70.0), 70.0);
    }

    #[test]
    fn test_sensitivity_and_mode() {
        let eager = Preferences {
            sensitivity: 100,
            ..Default::default()
        };
        assert!(eager.eye_closure_threshold(70.0) < 70.0);

        let relaxed = Preferences {
            detection_mode: DetectionMode::Relaxed,
            sensitivity: 0,
            ..Default::default()
        };
        // 70 * 1.3 * 1.2 is past the ceiling
        assert_eq!(relaxed.eye_closure_threshold(70.0), 95.0);

        let sensitive = Preferences {
            detection_mode: DetectionMode::Sensitive,
            ..Default::default()
        };
        assert!((sensitive.eye_closure_threshold(70.0) - 49.0).abs() < 1e-9);
    }

    #[test]
    fn test_alert_request() {
        let prefs = Preferences {
            alert_volume: 40,
            voice_alerts: false,
            vibration_intensity: VibrationIntensity::Medium,
            ..Default::default()
        };
        let request = prefs.alert_request();
        assert!((request.volume - 0.4).abs() < 1e-6);
        assert!(!request.voice);
        assert_eq!(request.intensity, VibrationIntensity::Medium);
    }

    proptest! {
        #[test]
        fn threshold_stays_in_bounds(
            sensitivity in any::<u8>(),
            base in 0.0f64..=100.0,
            mode in prop_oneof![
                Just(DetectionMode::Standard),
                Just(DetectionMode::Sensitive),
                Just(DetectionMode::Relaxed),
            ],
        ) {
            let prefs = Preferences { sensitivity, detection_mode: mode, ..Default::default() };
            let threshold = prefs.eye_closure_threshold(base);
            prop_assert!((10.0..=95.0).contains(&threshold));
        }
    }
}
