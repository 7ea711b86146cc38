//! Error types for the sharded key-space.

use thiserror::Error;

/// Result type alias for sharding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sharded key-space.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration errors (zero shards, zero virtual nodes, empty ids).
    #[error("config error: {0}")]
    Config(String),

    /// The key could not be interpreted as a string key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A strategy resolved to a shard the coordinator does not hold.
    #[error("shard not found: {0}")]
    ShardNotFound(String),

    /// Shard ids must be unique within a coordinator.
    #[error("shard already exists: {0}")]
    DuplicateShard(String),

    /// Snapshot encoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Error returned when a strategy is asked to resolve against zero shards.
    pub(crate) fn no_shards() -> Self {
        Error::Config("cannot resolve a key against zero shards".to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
