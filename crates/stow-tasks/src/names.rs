//! Task id validation.
//!
//! Ids are caller-assigned and double as file names (`<id>.json`) in the
//! filesystem backend, so both backends apply the same rules:
//! - Must be non-empty
//! - Must not contain `/`, `\`, or NUL
//! - Must not be `.` or `..`
//! - Must leave room for the `.json` suffix within a 255-byte file name

use crate::error::{Result, TaskError};

/// Longest accepted task id, in bytes.
pub const MAX_TASK_ID_LEN: usize = 250;

/// Characters that are forbidden anywhere in a task id.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Validate a task id, returning `Ok(())` if usable.
///
/// # Examples
///
/// ```
/// use stow_tasks::names::validate_task_id;
///
/// assert!(validate_task_id("t1").is_ok());
/// assert!(validate_task_id("").is_err());
/// assert!(validate_task_id("../escape").is_err());
/// ```
pub fn validate_task_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(TaskError::InvalidArgument("task must have an id".into()));
    }
    if id == "." || id == ".." {
        return Err(TaskError::InvalidArgument(format!(
            "task id {id:?} is reserved"
        )));
    }
    if let Some(ch) = id.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(TaskError::InvalidArgument(format!(
            "task id {id:?} contains forbidden character {ch:?}"
        )));
    }
    if id.len() > MAX_TASK_ID_LEN {
        return Err(TaskError::InvalidArgument(format!(
            "task id is {} bytes; at most {MAX_TASK_ID_LEN} allowed",
            id.len()
        )));
    }
    Ok(())
}
