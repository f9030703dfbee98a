use async_trait::async_trait;
use serde_json::Value;

/// Failure reported by an external tool.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvokeError(pub String);

/// Executes a named tool with a JSON input.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, tool: &str, input: &Value) -> Result<Value, InvokeError>;
}
