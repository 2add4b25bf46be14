//! Server configuration.
//!
//! Defaults, then an optional JSON file named by `VEIL_CONFIG`, then single
//! value overrides from the environment.

use std::path::Path;

use log::{info, warn};
use serde::Deserialize;
use veil_shared::{
    AccessLevel, PotionKind, LOW_STEPS_WARNING_THRESHOLD, MAX_STEALTH_ARMOR_RATING,
    SERVER_TICK_RATE,
};

use crate::invisibility::InvisibilityRules;

/// Environment variable naming a JSON config file
pub const CONFIG_PATH_ENV: &str = "VEIL_CONFIG";
pub const TICK_RATE_ENV: &str = "VEIL_TICK_RATE";
pub const GREATER_STEALTH_CHANCE_ENV: &str = "VEIL_GREATER_STEALTH_CHANCE";

type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Json(String),
    InvalidEnv { key: &'static str, value: String },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read config file: {}", e),
            Self::Json(e) => write!(f, "Invalid config JSON: {}", e),
            Self::InvalidEnv { key, value } => write!(f, "Invalid value for {}: {:?}", key, value),
            Self::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Chance (0.0 to 1.0) that a greater potion grants stealth movement
    pub greater_stealth_chance: f64,
    pub max_stealth_armor_rating: i32,
    pub low_steps_warning_threshold: u32,
    /// Name of the player driven from the console
    pub console_player_name: String,
    pub console_access_level: AccessLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: SERVER_TICK_RATE,
            greater_stealth_chance: PotionKind::Greater.definition().stealth_success_chance,
            max_stealth_armor_rating: MAX_STEALTH_ARMOR_RATING,
            low_steps_warning_threshold: LOW_STEPS_WARNING_THRESHOLD,
            console_player_name: "Wanderer".into(),
            console_access_level: AccessLevel::Player,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment
    pub fn load() -> ConfigResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for environment values
    pub fn load_with<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => {
                info!("Loading config from {}", path);
                Self::from_file(Path::new(path.trim()))?
            }
            _ => Self::default(),
        };

        if let Some(value) = lookup(TICK_RATE_ENV) {
            config.tick_rate = value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnv {
                key: TICK_RATE_ENV,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(GREATER_STEALTH_CHANCE_ENV) {
            config.greater_stealth_chance =
                value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnv {
                    key: GREATER_STEALTH_CHANCE_ENV,
                    value: value.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be greater than 0".into()));
        }
        if !(0.0..=1.0).contains(&self.greater_stealth_chance) {
            return Err(ConfigError::Invalid(format!(
                "greater_stealth_chance must be between 0.0 and 1.0, got {}",
                self.greater_stealth_chance
            )));
        }
        if self.low_steps_warning_threshold == 0 {
            warn!("low_steps_warning_threshold is 0, players will never be warned");
        }
        Ok(())
    }

    pub fn invisibility_rules(&self) -> InvisibilityRules {
        InvisibilityRules {
            greater_stealth_chance: self.greater_stealth_chance,
            max_stealth_armor_rating: self.max_stealth_armor_rating,
            low_steps_warning_threshold: self.low_steps_warning_threshold,
        }
    }
}
