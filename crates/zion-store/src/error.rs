//! Error types for zion-store.

use thiserror::Error;

/// Result type alias for coordination-store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to the coordination store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying Redis connection failed or a command errored.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The store is unreachable (connection refused, DNS failure, etc).
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),
}
