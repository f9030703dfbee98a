//! User-facing text for tool inputs and storage failures.

use serde_json::Value;
use stow_provider::{ErrorKind, ProviderError};

/// One-line summary of a tool input: `key: <json>` pairs joined by `, `.
/// Non-object inputs render as their JSON text.
pub fn describe_input(input: &Value) -> String {
    match input {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Render a provider failure as text suitable for an end user.
pub fn render_error(err: &ProviderError) -> String {
    match err.kind() {
        ErrorKind::NotFound => format!("Not found: {err}"),
        ErrorKind::InvalidArgument => format!("Invalid request: {err}"),
        ErrorKind::BackendUnavailable => format!("Storage unavailable: {err}"),
        ErrorKind::Corrupt => format!("Stored data is corrupt: {err}"),
    }
}
