use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BayesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt model data in {}: {source}", path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Timed out after {timeout:?} waiting for lock on {}", path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BayesError {
    /// True when the model file simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BayesError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BayesError>;
