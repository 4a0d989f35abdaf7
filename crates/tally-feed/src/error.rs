//! Error types for the Tally feed.

use thiserror::Error;

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while hosting a voting session.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The post store rejected the vote with a rate limit
    #[error("Rate limited: retry in {cooldown_seconds}s")]
    RateLimited { cooldown_seconds: u64 },

    /// The post store failed to apply the vote
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Server-provided cooldown, if this is a rate limit.
    pub fn cooldown_seconds(&self) -> Option<u64> {
        match self {
            Error::RateLimited { cooldown_seconds } => Some(*cooldown_seconds),
            _ => None,
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
