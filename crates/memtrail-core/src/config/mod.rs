//! Configuration system for memtrail.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MemtrailError, MemtrailResult};

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// History store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Path to the history database.
    pub db_path: PathBuf,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Use write-ahead logging so readers in other processes do not block appends.
    pub wal: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let memtrail_dir = dirs::home_dir()
            .map(|h| h.join(".memtrail"))
            .unwrap_or_else(|| PathBuf::from(".memtrail"));

        Self {
            db_path: memtrail_dir.join("history.db"),
            busy_timeout_ms: 5000,
            wal: true,
        }
    }
}

impl HistoryConfig {
    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(IN_MEMORY_PATH),
            wal: false,
            ..Self::default()
        }
    }

    /// Whether this configuration selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> MemtrailResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| MemtrailError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| MemtrailError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| MemtrailError::Configuration(e.to_string())),
            _ => Err(MemtrailError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
        .inspect_err(|e| tracing::error!(path = %path.as_ref().display(), "{}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults.
    ///
    /// Recognizes `MEMTRAIL_HISTORY_DB_PATH`, `MEMTRAIL_BUSY_TIMEOUT_MS` and
    /// `MEMTRAIL_WAL`.
    pub fn from_env() -> MemtrailResult<Self> {
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    pub fn merge_env<F>(mut self, lookup: F) -> MemtrailResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("MEMTRAIL_HISTORY_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("MEMTRAIL_BUSY_TIMEOUT_MS") {
            self.busy_timeout_ms = raw.trim().parse().map_err(|_| {
                let err = MemtrailError::Configuration(format!(
                    "MEMTRAIL_BUSY_TIMEOUT_MS must be a whole number of milliseconds, got '{}'",
                    raw
                ));
                tracing::error!("{}", err);
                err
            })?;
        }

        if let Some(raw) = lookup("MEMTRAIL_WAL") {
            self.wal = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    let err = MemtrailError::Configuration(format!(
                        "MEMTRAIL_WAL must be a boolean, got '{}'",
                        raw
                    ));
                    tracing::error!("{}", err);
                    return Err(err);
                }
            };
        }

        self.validate()?;
        Ok(self)
    }

    /// Check the configuration for values the store cannot open with.
    pub fn validate(&self) -> MemtrailResult<()> {
        if self.db_path.as_os_str().is_empty() {
            let err = MemtrailError::Configuration("db_path must not be empty".to_string());
            tracing::error!("{}", err);
            return Err(err);
        }
        if self.db_path.is_dir() {
            let err = MemtrailError::Configuration(format!(
                "db_path '{}' is a directory",
                self.db_path.display()
            ));
            tracing::error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> HistoryConfigBuilder {
        HistoryConfigBuilder::default()
    }
}

/// Builder for HistoryConfig.
#[derive(Default)]
pub struct HistoryConfigBuilder {
    config: HistoryConfig,
}

impl HistoryConfigBuilder {
    /// Set history database path.
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout_ms(mut self, ms: u64) -> Self {
        self.config.busy_timeout_ms = ms;
        self
    }

    /// Enable or disable write-ahead logging.
    pub fn wal(mut self, enabled: bool) -> Self {
        self.config.wal = enabled;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> MemtrailResult<HistoryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
