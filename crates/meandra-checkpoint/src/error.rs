//! Checkpoint error types.

use thiserror::Error;

/// Result type for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Errors that can occur during checkpoint operations.
///
/// Corrupted trailing records are not an error: the store recovers by
/// discarding them on load, treating the node as not yet completed.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Store I/O failed.
    #[error("checkpoint io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
