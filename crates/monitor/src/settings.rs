//! Layered settings: built-in defaults, optional TOML file, environment

use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use decision_engine::{EngineConfig, Preferences};
use dms::DmsConfig;
use feature_engine::SignalConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scenario::Scenario;

/// Settings file read from the working directory when no path is given
pub const DEFAULT_SETTINGS_FILE: &str = "drowsy-guard.toml";

/// Prefix of environment overrides, e.g. `DROWSY__ENGINE__COOLDOWN_MS`
pub const ENV_PREFIX: &str = "DROWSY";

/// Longest simulated run, one day
pub const MAX_DURATION_SECS: u64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// trace, debug, info, warn, or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub scenario: Scenario,
    /// Stop after this long unless interrupted first
    pub duration_secs: u64,
}

impl RunSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 || self.duration_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Message(format!(
                "run.duration_secs must be in 1..={}, got {}",
                MAX_DURATION_SECS, self.duration_secs
            )));
        }
        Ok(())
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            scenario: Scenario::Drowsy,
            duration_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub run: RunSettings,
    pub dms: DmsConfig,
    pub signals: SignalConfig,
    pub engine: EngineConfig,
    pub alerts: AlertConfig,
    pub preferences: Preferences,
}

impl Settings {
    /// Load settings, layering the file at `path` (or the default file if
    /// present) and then environment variables over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(file).required(path.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.engine.debounce_ms, 500);
        assert_eq!(settings.engine.cooldown_ms, 3_000);
        assert_eq!(settings.alerts.phrases.len(), 5);
        assert_eq!(settings.dms.landmarks.mouth.len(), 9);
    }

    #[test]
    fn test_run_duration_bounds() {
        let mut run = RunSettings::default();
        assert!(run.validate().is_ok());

        run.duration_secs = u64::MAX;
        assert!(run.validate().is_err());

        run.duration_secs = 0;
        assert!(run.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("drowsy-guard-does-not-exist.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("drowsy-guard-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[run]
scenario = "yawning"
duration_secs = 8

[engine]
cooldown_ms = 5000

[preferences]
sensitivity = 80
vibration_intensity = "low"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.run.scenario, Scenario::Yawning);
        assert_eq!(settings.run.duration_secs, 8);
        assert_eq!(settings.engine.cooldown_ms, 5_000);
        assert_eq!(settings.engine.debounce_ms, 500);
        assert_eq!(settings.preferences.sensitivity, 80);
        assert_eq!(
            settings.preferences.vibration_intensity,
            alerting::VibrationIntensity::Low
        );
    }
}
