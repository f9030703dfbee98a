use stow_types::Cid;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested content was never stored or has been deleted.
    #[error("content not found for CID: {0}")]
    NotFound(Cid),

    /// Content read back does not hash to the digest in its identifier.
    #[error("hash mismatch for {cid}: content hashes to {computed}")]
    HashMismatch { cid: Cid, computed: Cid },

    /// I/O error from the underlying storage backend.
    #[error("storage backend unavailable: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for the absent-content case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
