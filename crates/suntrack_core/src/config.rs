//! Run configuration.
//!
//! # Responsibility
//! - Describe every externally supplied parameter of a run: observation
//!   point, window size, endpoint, and output paths.
//! - Load and validate TOML configuration files.
//!
//! # Invariants
//! - Every field has a default, so an empty file is a valid configuration.
//! - A value returned by `load_config` has passed `validate()`.

use crate::fetch::sunrise_api::DEFAULT_API_BASE_URL;
use crate::model::location::Location;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dates attempted per ingestion run.
pub const DEFAULT_WINDOW_DAYS: u32 = 25;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Synthetic date span drawn on the chart's x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for ChartRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default(),
        }
    }
}

/// Full configuration of one tracker run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    pub location: Location,
    pub window_days: u32,
    pub api_base_url: String,
    /// Applies to the HTTP client only; the pipeline itself has no timeout.
    pub request_timeout_secs: u64,
    pub db_path: PathBuf,
    pub report_path: PathBuf,
    pub chart_path: PathBuf,
    pub chart_range: ChartRange,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            location: Location::default(),
            window_days: DEFAULT_WINDOW_DAYS,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            db_path: PathBuf::from("sunrise_sunset.db"),
            report_path: PathBuf::from("calculated_data.txt"),
            chart_path: PathBuf::from("sunrise_sunset.png"),
            chart_range: ChartRange::default(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl TrackerConfig {
    /// Parses TOML text and validates the result.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    /// - `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.location.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "location ({}, {}) is outside latitude [-90, 90] / longitude [-180, 180]",
                self.location.latitude, self.location.longitude
            )));
        }
        if self.window_days == 0 {
            return Err(ConfigError::Invalid(
                "window_days must be at least 1".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "api_base_url cannot be empty".to_string(),
            ));
        }
        if self.chart_range.end <= self.chart_range.start {
            return Err(ConfigError::Invalid(format!(
                "chart_range end {} must be after start {}",
                self.chart_range.end, self.chart_range.start
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reads and validates a TOML configuration file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<TrackerConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    TrackerConfig::from_toml_str(&text)
}
