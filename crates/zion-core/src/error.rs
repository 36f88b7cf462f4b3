//! Error types for zion-core.

use thiserror::Error;

/// Result type alias for supervisor-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while running the supervisor's core components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error from the coordination store.
    #[error("coordination store error: {0}")]
    Store(#[from] zion_store::StoreError),

    /// Error from the container runtime.
    #[error("container runtime error: {0}")]
    Runtime(#[from] zion_runtime::RuntimeError),

    /// A function's cached metadata is missing one of the three required
    /// headers (`Function-Memory`, `Function-Timeout`, `Function-Main`).
    #[error("function {function} is missing required metadata field: {field}")]
    MissingMetadata {
        /// The function whose metadata is incomplete.
        function: String,
        /// The missing field name.
        field: &'static str,
    },

    /// Writing the "execute" control message to the slot's channel pipe
    /// failed.
    #[error("control channel send failed for slot {slot}: {reason}")]
    ChannelSend {
        /// The slot whose channel write failed.
        slot: String,
        /// Why the send failed.
        reason: String,
    },

    /// I/O error preparing or tearing down a slot's directory tree.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
