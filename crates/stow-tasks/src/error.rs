//! Error types for task ledger operations.

use thiserror::Error;

/// Errors that can occur during task ledger operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The record is unusable: missing id, unsafe id, or a reserved key in
    /// its extension fields.
    #[error("invalid task: {0}")]
    InvalidArgument(String),

    /// No task exists with this id.
    #[error("task not found: {id}")]
    NotFound { id: String },

    /// A task document could not be encoded or decoded.
    #[error("serialization error for task {id}: {reason}")]
    Serialization { id: String, reason: String },

    /// I/O error from the filesystem backend.
    #[error("storage backend unavailable: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ledger operations.
pub type Result<T> = std::result::Result<T, TaskError>;
