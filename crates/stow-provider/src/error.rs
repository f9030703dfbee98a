use stow_store::StoreError;
use stow_tasks::TaskError;

/// Contract-level classification of a provider failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Content or task target does not exist.
    NotFound,
    /// The caller passed an unusable record or configuration.
    InvalidArgument,
    /// The storage substrate failed (filesystem I/O).
    BackendUnavailable,
    /// Stored data failed an integrity or decoding check.
    Corrupt,
}

/// Errors from provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Map this failure onto the provider's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(StoreError::HashMismatch { .. }) => ErrorKind::Corrupt,
            Self::Store(StoreError::Io(_)) => ErrorKind::BackendUnavailable,
            Self::Task(TaskError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Task(TaskError::InvalidArgument(_)) => ErrorKind::InvalidArgument,
            Self::Task(TaskError::Serialization { .. }) => ErrorKind::Corrupt,
            Self::Task(TaskError::Io(_)) => ErrorKind::BackendUnavailable,
            Self::Config(_) => ErrorKind::InvalidArgument,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
