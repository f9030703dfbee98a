use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid content identifier {cid:?}: {reason}")]
    InvalidCid { cid: String, reason: String },

    #[error("unknown cid scheme: {0}")]
    UnknownScheme(String),
}
