use stow_provider::ProviderError;

/// Errors from the tool adapter itself. Failures of the invoked tool are
/// recorded on the task, not returned here.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("storage error: {0}")]
    Storage(#[from] ProviderError),

    #[error("payload error: {0}")]
    Payload(String),
}

pub type ToolResult<T> = Result<T, ToolError>;
