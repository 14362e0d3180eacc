//! Runtime configuration.

use std::path::Path;
use std::time::Duration;

use clinic_queue_announce::AnnouncerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::consultation::SUGGESTION_LIMIT;

/// Environment variable overriding [`ClinicConfig::database_path`].
pub const DATABASE_PATH_ENV: &str = "CLINIC_QUEUE_DB";

pub const DEFAULT_DATABASE_PATH: &str = "clinic-queue.db";

/// Once a day.
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 86_400;

/// ID of the aggregate document in the `stats` collection.
pub const DEFAULT_STATS_DOCUMENT_ID: &str = "statsDocID";

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    pub database_path: String,
    /// Seconds between full reloads of today's list
    pub reload_interval_secs: u64,
    pub suggestion_limit: usize,
    pub stats_document_id: String,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub announcer: AnnouncerConfig,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            reload_interval_secs: DEFAULT_RELOAD_INTERVAL_SECS,
            suggestion_limit: SUGGESTION_LIMIT,
            stats_document_id: DEFAULT_STATS_DOCUMENT_ID.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            announcer: AnnouncerConfig::default(),
        }
    }
}

impl ClinicConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file, then apply environment overrides.
    ///
    /// [`DATABASE_PATH_ENV`] only applies here; a path passed directly to
    /// `open_clinic` is used as given.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from a variable lookup (normally the environment).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.database_path = path;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reload_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reload_interval_secs must be positive".into(),
            ));
        }
        if self.suggestion_limit == 0 {
            return Err(ConfigError::Invalid("suggestion_limit must be positive".into()));
        }
        if let Err(e) = EnvFilter::try_new(&self.log_filter) {
            return Err(ConfigError::Invalid(format!(
                "log_filter {:?} is not a valid filter: {}",
                self.log_filter, e
            )));
        }
        if self.announcer.locales.is_empty() {
            return Err(ConfigError::Invalid("announcer.locales must not be empty".into()));
        }
        Ok(())
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs)
    }
}
