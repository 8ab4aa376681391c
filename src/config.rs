//! Navigator settings
//!
//! All tunables of the engine live in one serde-backed structure so a host can
//! ship a `navigator.toml` next to its other preferences. A missing file is not
//! an error: the engine falls back to defaults and stays usable.

use crate::modality::Mode;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR_NAME: &str = "tenfoot";
const CONFIG_FILE_NAME: &str = "navigator.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Thresholds applied by the decoder
///
/// Two independent thresholds are involved: `navigation_deadzone` decides
/// whether a stick produces a direction, `activity_deadzone` decides whether
/// the controller is being touched at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    /// |axis| must exceed this to produce a direction
    pub navigation_deadzone: f32,

    /// |axis| must exceed this to count as controller activity
    pub activity_deadzone: f32,

    /// Extra margin on `activity_deadzone` while the mode is pointer
    ///
    /// Only analog activity is affected; a pressed button always counts. Zero
    /// keeps the plain two-threshold behavior.
    pub activity_hysteresis: f32,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            navigation_deadzone: 0.5,
            activity_deadzone: 0.1,
            activity_hysteresis: 0.0,
        }
    }
}

/// Cool-downs of the two throttle windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Minimum spacing between two focus moves while a direction is held
    pub directional_cooldown_ms: u64,

    /// Minimum spacing between two confirm/cancel activations
    pub action_cooldown_ms: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            directional_cooldown_ms: 200,
            action_cooldown_ms: 500,
        }
    }
}

impl ThrottleSettings {
    pub fn directional_cooldown(&self) -> Duration {
        Duration::milliseconds(self.directional_cooldown_ms as i64)
    }

    pub fn action_cooldown(&self) -> Duration {
        Duration::milliseconds(self.action_cooldown_ms as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Delay between a synthetic key "down" and its "up"
    pub release_delay_ms: u64,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            release_delay_ms: 100,
        }
    }
}

impl RouterSettings {
    pub fn release_delay(&self) -> Duration {
        Duration::milliseconds(self.release_delay_ms as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Interval between two controller polls, one display frame at 60 Hz
    pub frame_interval_ms: u64,

    /// Capacity of the queue between sampler and engine
    pub queue_capacity: usize,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            queue_capacity: 256,
        }
    }
}

impl SamplerSettings {
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.frame_interval_ms)
    }
}

/// Complete engine configuration
///
/// # Examples
///
/// ```rust
/// use tenfoot::config::NavigatorSettings;
///
/// let settings: NavigatorSettings = toml::from_str(
///     r#"
///     [throttle]
///     directional_cooldown_ms = 150
///     "#,
/// )
/// .unwrap();
/// assert_eq!(settings.throttle.directional_cooldown_ms, 150);
/// assert_eq!(settings.throttle.action_cooldown_ms, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorSettings {
    pub decoder: DecoderSettings,
    pub throttle: ThrottleSettings,
    pub router: RouterSettings,
    pub sampler: SamplerSettings,

    /// Mode selected by keyboard activity
    pub keyboard_activity_mode: Mode,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            decoder: DecoderSettings::default(),
            throttle: ThrottleSettings::default(),
            router: RouterSettings::default(),
            sampler: SamplerSettings::default(),
            keyboard_activity_mode: Mode::Pointer,
        }
    }
}

impl NavigatorSettings {
    /// `$CONFIG_DIR/tenfoot/navigator.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads from the default location, falling back to defaults
    pub fn load_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                warn!("No config directory on this platform, using default settings");
                Ok(Self::default())
            }
        }
    }

    /// Loads `path`; a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!(
                "No settings file at {}, using default settings",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;

        debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let decoder = &self.decoder;
        for (name, value) in [
            ("navigation_deadzone", decoder.navigation_deadzone),
            ("activity_deadzone", decoder.activity_deadzone),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        if decoder.activity_hysteresis < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "activity_hysteresis must not be negative, got {}",
                decoder.activity_hysteresis
            )));
        }
        if self.throttle.directional_cooldown_ms >= self.throttle.action_cooldown_ms {
            return Err(SettingsError::Invalid(format!(
                "directional_cooldown_ms ({}) must be shorter than action_cooldown_ms ({})",
                self.throttle.directional_cooldown_ms, self.throttle.action_cooldown_ms
            )));
        }
        if self.sampler.frame_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "frame_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.sampler.queue_capacity == 0 {
            return Err(SettingsError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = NavigatorSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.throttle.directional_cooldown() < settings.throttle.action_cooldown());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings: NavigatorSettings = toml::from_str(
            r#"
            keyboard_activity_mode = "directional"

            [decoder]
            activity_hysteresis = 0.15
            "#,
        )
        .unwrap();
        assert_eq!(settings.keyboard_activity_mode, Mode::Directional);
        assert_eq!(settings.decoder.activity_hysteresis, 0.15);
        assert_eq!(settings.decoder.navigation_deadzone, 0.5);
        assert_eq!(settings.router.release_delay_ms, 100);
    }

    #[test]
    fn rejects_inverted_cooldowns() {
        let mut settings = NavigatorSettings::default();
        settings.throttle.directional_cooldown_ms = 600;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_deadzone() {
        let mut settings = NavigatorSettings::default();
        settings.decoder.navigation_deadzone = 1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("tenfoot-does-not-exist/navigator.toml");
        let settings = NavigatorSettings::load_or_default(&path).unwrap();
        assert_eq!(settings, NavigatorSettings::default());
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("tenfoot-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, "[throttle]\ndirectional_cooldown_ms = \"fast\"\n").unwrap();

        let result = NavigatorSettings::load_or_default(&path);
        assert!(matches!(result, Err(SettingsError::Parse { .. })));

        fs::remove_dir_all(&dir).unwrap();
    }
}
