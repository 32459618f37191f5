//! Engine configuration file support.
//!
//! Settings are read from TOML; every field has a default, so an empty file
//! is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use qtty::{Quantity, Second};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{self, TimeWindow, SECONDS_PER_DAY};

/// Environment variable overriding `horizon.days`.
pub const ENV_HORIZON_DAYS: &str = "SLOTBROKER_HORIZON_DAYS";
/// Environment variable overriding `slots.min_duration_secs`.
pub const ENV_MIN_SLOT_SECS: &str = "SLOTBROKER_MIN_SLOT_SECS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub horizon: HorizonSettings,
    #[serde(default)]
    pub slots: SlotSettings,
}

/// How far ahead availability and slots are maintained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonSettings {
    #[serde(default = "default_horizon_days")]
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSettings {
    /// Intersections shorter than this are not offered as slots.
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,
}

fn default_horizon_days() -> u32 {
    7
}

fn default_min_duration_secs() -> f64 {
    60.0
}

impl Default for HorizonSettings {
    fn default() -> Self {
        Self {
            days: default_horizon_days(),
        }
    }
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration_secs(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("loading engine configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the first of `slotbroker.toml` or
    /// `config/slotbroker.toml` that exists in the working directory.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("slotbroker.toml"),
            PathBuf::from("config/slotbroker.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::Read {
            path: PathBuf::from("slotbroker.toml"),
            message: "no configuration file found in standard locations".to_string(),
        })
    }

    /// Apply `SLOTBROKER_*` environment variables on top of this configuration.
    ///
    /// # Environment Variables
    /// - `SLOTBROKER_HORIZON_DAYS`: horizon length in days
    /// - `SLOTBROKER_MIN_SLOT_SECS`: minimum slot duration in seconds
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::with_env_overrides`], reading variables through `lookup`.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_HORIZON_DAYS) {
            self.horizon.days = raw.trim().parse::<u32>().map_err(|e| {
                ConfigError::Parse(format!("{ENV_HORIZON_DAYS}={raw:?}: {e}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_MIN_SLOT_SECS) {
            self.slots.min_duration_secs = raw.trim().parse::<f64>().map_err(|e| {
                ConfigError::Parse(format!("{ENV_MIN_SLOT_SECS}={raw:?}: {e}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon.days == 0 {
            return Err(ConfigError::Invalid(
                "horizon.days must be at least 1".to_string(),
            ));
        }
        let min = self.slots.min_duration_secs;
        if !min.is_finite() || min < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "slots.min_duration_secs must be a non-negative number, got {min}"
            )));
        }
        Ok(())
    }

    pub fn min_slot_duration(&self) -> Quantity<Second> {
        Quantity::new(self.slots.min_duration_secs)
    }

    /// The maintenance horizon `[now, now + days)`.
    pub fn horizon_from(&self, now: DateTime<Utc>) -> Result<TimeWindow, ConfigError> {
        let start = time::to_axis(now);
        let end = start + Quantity::new(f64::from(self.horizon.days) * SECONDS_PER_DAY);
        TimeWindow::checked(start, end)
            .ok_or_else(|| ConfigError::Invalid("horizon.days must be at least 1".to_string()))
    }
}
