//! Configuration for bayes-rs

use crate::error::{BayesError, Result};
use crate::spam::CombineMethod;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model file location and persistence policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path of the model file
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Number of training calls between flushes
    #[serde(default = "default_save_threshold")]
    pub save_threshold: usize,
    /// Upper bound on waiting for the write lock (None = wait forever)
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

/// Rating policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Ratings strictly above this are spam
    #[serde(default = "default_spam_threshold")]
    pub spam_threshold: f64,
    /// How per-token ratings are folded into one score
    #[serde(default)]
    pub combine: CombineMethod,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("bayes.db")
}

fn default_save_threshold() -> usize {
    5
}

fn default_spam_threshold() -> f64 {
    0.9
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            save_threshold: default_save_threshold(),
            lock_timeout_ms: None,
        }
    }
}

impl StorageConfig {
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            spam_threshold: default_spam_threshold(),
            combine: CombineMethod::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            BayesError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| BayesError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.save_threshold == 0 {
            return Err(BayesError::Config(
                "storage.save_threshold must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.classifier.spam_threshold) {
            return Err(BayesError::Config(format!(
                "classifier.spam_threshold must be within [0, 1], got {}",
                self.classifier.spam_threshold
            )));
        }

        match self.logging.format.as_str() {
            "pretty" | "json" | "compact" => Ok(()),
            other => Err(BayesError::Config(format!(
                "Unknown logging.format '{}'",
                other
            ))),
        }
    }
}
