//! Error types for zion-runtime.

use thiserror::Error;

/// Result type alias for container-runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while driving the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The Docker daemon connection failed or a request to it errored.
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// No container exists with the given name or id.
    #[error("container not found: {0}")]
    NotFound(String),
}
