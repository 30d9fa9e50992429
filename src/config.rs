//! Configuration for the Exam Proctor Agent.

use crate::core::alerts::DEFAULT_ALERT_CAPACITY;
use crate::core::risk::RiskProfile;
use crate::store::ConfigStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Key under which the whole configuration is kept in a [`ConfigStore`].
pub const CONFIG_KEY: &str = "config";

/// Default tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Longest accepted tick interval (one hour).
pub const MAX_TICK_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// What to do when a condition persists across consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Fire on every tick the condition holds
    #[default]
    EveryTick,
    /// Fire once when the condition starts; re-arm after a clear tick
    OnOnset,
}

impl FromStr for RepeatPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "every_tick" => Ok(RepeatPolicy::EveryTick),
            "on_onset" => Ok(RepeatPolicy::OnOnset),
            other => Err(ConfigError::Invalid(format!(
                "unknown repeat policy '{other}' (expected every_tick or on_onset)"
            ))),
        }
    }
}

/// Per-session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between ticks
    pub tick_interval_ms: u64,
    /// Maximum number of alerts retained in the session log
    pub alert_capacity: usize,
    /// Whether surveillance-model scores feed into the composite
    pub surveillance_enabled: bool,
    #[serde(default)]
    pub repeat_policy: RepeatPolicy,
    #[serde(default)]
    pub profile: RiskProfile,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            surveillance_enabled: false,
            repeat_policy: RepeatPolicy::EveryTick,
            profile: RiskProfile::default(),
        }
    }
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject out-of-range configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "tick_interval_ms must be at most {MAX_TICK_INTERVAL_MS}, got {}",
                self.tick_interval_ms
            )));
        }
        if self.alert_capacity == 0 {
            return Err(ConfigError::Invalid(
                "alert_capacity must be greater than zero".to_string(),
            ));
        }
        self.profile.validate().map_err(ConfigError::Invalid)
    }
}

/// Named configurations standing in for the proctoring UI levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Mock exam: short log, one alert per condition onset
    Practice,
    /// Regular exam with default weights and thresholds
    Standard,
    /// Standard plus the surveillance model
    Secure,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Practice, Preset::Standard, Preset::Secure];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Practice => "practice",
            Preset::Standard => "standard",
            Preset::Secure => "secure",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Practice => "12 alerts retained, surveillance off, alerts on onset only",
            Preset::Standard => "20 alerts retained, surveillance off, alerts every tick",
            Preset::Secure => "20 alerts retained, surveillance on, alerts every tick",
        }
    }

    /// Session configuration for this preset.
    pub fn session_config(&self) -> SessionConfig {
        let base = SessionConfig::default();
        match self {
            Preset::Practice => SessionConfig {
                alert_capacity: 12,
                repeat_policy: RepeatPolicy::OnOnset,
                ..base
            },
            Preset::Standard => base,
            Preset::Secure => SessionConfig {
                surveillance_enabled: true,
                ..base
            },
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown preset '{s}' (expected practice, standard or secure)"
                ))
            })
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main configuration for the agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset the session configuration was derived from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,
    pub session: SessionConfig,
}

impl Config {
    /// Configuration built from a preset.
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            preset: Some(preset),
            session: preset.session_config(),
        }
    }

    /// Load configuration from a store, falling back to defaults when absent.
    pub fn load(store: &dyn ConfigStore) -> Result<Self, ConfigError> {
        match store.get(CONFIG_KEY)? {
            Some(content) => {
                let config: Config = serde_json::from_str(&content)
                    .map_err(|e| ConfigError::Parse(e.to_string()))?;
                config.session.validate()?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Validate and save configuration to a store.
    pub fn save(&self, store: &dyn ConfigStore) -> Result<(), ConfigError> {
        self.session.validate()?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        store.set(CONFIG_KEY, &content)
    }

    /// Update a single option by name.
    ///
    /// Recognized keys: `tick_interval_ms`, `alert_capacity`,
    /// `surveillance_enabled`, `repeat_policy`, `preset`.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.clone();
        match key {
            "tick_interval_ms" => updated.session.tick_interval_ms = parse_value(key, value)?,
            "alert_capacity" => updated.session.alert_capacity = parse_value(key, value)?,
            "surveillance_enabled" => {
                updated.session.surveillance_enabled = parse_value(key, value)?
            }
            "repeat_policy" => updated.session.repeat_policy = value.parse()?,
            "preset" => updated = Config::from_preset(value.parse()?),
            other => {
                return Err(ConfigError::Invalid(format!("unknown option '{other}'")));
            }
        }
        if key != "preset" {
            // Hand-tuned options no longer match the preset
            updated.preset = None;
        }
        updated.session.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid value '{value}' for '{key}'")))
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryConfigStore;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session.tick_interval(), Duration::from_millis(1000));
        assert_eq!(config.session.alert_capacity, 20);
        assert!(!config.session.surveillance_enabled);
        assert_eq!(config.session.repeat_policy, RepeatPolicy::EveryTick);
        assert!(config.session.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_interval_and_capacity() {
        let mut session = SessionConfig {
            tick_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(session.validate(), Err(ConfigError::Invalid(_))));

        session.tick_interval_ms = 500;
        session.alert_capacity = 0;
        assert!(matches!(session.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation_rejects_oversized_interval() {
        let mut session = SessionConfig {
            tick_interval_ms: MAX_TICK_INTERVAL_MS,
            ..SessionConfig::default()
        };
        assert!(session.validate().is_ok());

        session.tick_interval_ms = MAX_TICK_INTERVAL_MS + 1;
        assert!(matches!(session.validate(), Err(ConfigError::Invalid(_))));

        session.tick_interval_ms = u64::MAX / 2 + 1;
        assert!(matches!(session.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        assert!(config
            .set_option("tick_interval_ms", &(u64::MAX / 2 + 1).to_string())
            .is_err());
        assert_eq!(config.session.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    }

    #[test]
    fn test_negative_interval_fails_to_parse() {
        let json = r#"{"session":{"tick_interval_ms":-5,"alert_capacity":20,"surveillance_enabled":false}}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_presets() {
        let practice = Preset::Practice.session_config();
        assert_eq!(practice.alert_capacity, 12);
        assert_eq!(practice.repeat_policy, RepeatPolicy::OnOnset);

        let secure = Preset::Secure.session_config();
        assert!(secure.surveillance_enabled);
        assert_eq!(secure.alert_capacity, 20);

        assert_eq!(Preset::Standard.session_config(), SessionConfig::default());
        assert_eq!("Secure".parse::<Preset>().unwrap(), Preset::Secure);
        assert!("level9".parse::<Preset>().is_err());
    }

    #[test]
    fn test_set_option() {
        let mut config = Config::from_preset(Preset::Standard);
        config.set_option("tick_interval_ms", "250").unwrap();
        assert_eq!(config.session.tick_interval_ms, 250);
        assert_eq!(config.preset, None);

        config.set_option("repeat_policy", "on-onset").unwrap();
        assert_eq!(config.session.repeat_policy, RepeatPolicy::OnOnset);

        config.set_option("preset", "secure").unwrap();
        assert_eq!(config.preset, Some(Preset::Secure));
        assert!(config.session.surveillance_enabled);

        // Invalid updates leave the config untouched
        let before = config.clone();
        assert!(config.set_option("alert_capacity", "0").is_err());
        assert!(config.set_option("alert_capacity", "many").is_err());
        assert!(config.set_option("volume", "11").is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn test_load_and_save_through_store() {
        let store = MemoryConfigStore::new();
        assert_eq!(Config::load(&store).unwrap(), Config::default());

        let config = Config::from_preset(Preset::Practice);
        config.save(&store).unwrap();
        assert_eq!(Config::load(&store).unwrap(), config);
    }
}
