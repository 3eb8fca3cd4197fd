//! Worker errors

use splitsync_cache::CacheError;
use splitsync_net::NetError;

use crate::WorkerState;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid origin {origin}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("cannot resolve {path} against the origin: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Worker error
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Network error: {0}")]
    Net(#[from] NetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("worker is {actual}, expected {expected}")]
    InvalidState {
        expected: WorkerState,
        actual: WorkerState,
    },
}
