//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the bac-config.toml file.
//! It provides the default profile used for a fresh drink log, the timeline window
//! used for charts, and runtime parameters of the refresh loop.

use crate::{
    drink_log::DEFAULT_LOG_FILE, estimator::ELIMINATION_RATE, BacError, BacModel, Sex,
    TimelineWindow, UserProfile,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "bac-config.toml";

/// Application configuration loaded from bac-config.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when the drink log does not carry one yet
    pub profile: ProfileConfig,
    /// Chart window configuration
    pub timeline: TimelineConfig,
    /// Storage and refresh configuration
    pub app: AppConfig,
}

/// Physiological defaults
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProfileConfig {
    /// Body weight in kilograms
    pub weight_kg: f64,
    /// "male" or "female"; selects the Widmark ratio
    pub sex: Sex,
}

/// Timeline window around the current time
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// History shown before now
    pub past_hours: i64,
    /// Projection shown after now
    pub future_hours: i64,
    /// Spacing between samples
    pub step_minutes: i64,
}

/// Runtime parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Where the drink log is stored
    pub data_file: PathBuf,
    /// Seconds between re-evaluations in watch mode
    pub refresh_seconds: u64,
    /// Elimination rate in g/L per hour (0.015 reproduces the legacy behaviour)
    pub elimination_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            profile: ProfileConfig {
                weight_kg: 70.0,
                sex: Sex::Male,
            },
            timeline: TimelineConfig {
                past_hours: 8,
                future_hours: 4,
                step_minutes: 5,
            },
            app: AppConfig {
                data_file: PathBuf::from(DEFAULT_LOG_FILE),
                refresh_seconds: 1,
                elimination_rate: ELIMINATION_RATE,
            },
        }
    }
}

impl Config {
    /// Load configuration from bac-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                info!(path = %path.as_ref().display(), "loaded configuration");
                config
            }
            Err(BacError::Storage(_)) => {
                info!("no config file found, using default configuration");
                Self::default()
            }
            Err(e) => {
                warn!("invalid config file format: {e}; using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from specified path, reporting any failure
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, BacError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str::<Config>(&contents)?)
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BacError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Validated default profile
    pub fn profile(&self) -> Result<UserProfile, BacError> {
        UserProfile::new(self.profile.weight_kg, self.profile.sex)
    }

    /// Validated timeline window
    pub fn window(&self) -> Result<TimelineWindow, BacError> {
        let out_of_range = |field: &str, value: i64| {
            BacError::InvalidWindow(format!("timeline.{field} = {value} is out of range"))
        };
        let past = Duration::try_hours(self.timeline.past_hours)
            .ok_or_else(|| out_of_range("past_hours", self.timeline.past_hours))?;
        let future = Duration::try_hours(self.timeline.future_hours)
            .ok_or_else(|| out_of_range("future_hours", self.timeline.future_hours))?;
        let step = Duration::try_minutes(self.timeline.step_minutes)
            .ok_or_else(|| out_of_range("step_minutes", self.timeline.step_minutes))?;
        TimelineWindow::new(past, future, step)
    }

    /// Estimator with the configured elimination rate
    pub fn model(&self) -> BacModel {
        BacModel::new(self.app.elimination_rate)
    }
}
