//! Task query filters.

use crate::record::{Priority, TaskRecord};

/// Conjunctive equality filter over the well-known task fields.
///
/// Each field left as `None` is unconstrained. An empty string for `status`
/// or `kind` is also unconstrained, matching what command-line surfaces
/// produce for an unset flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub kind: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// A filter that matches every task.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Returns `true` if no field constrains the result.
    pub fn is_empty(&self) -> bool {
        constraint(&self.status).is_none()
            && constraint(&self.kind).is_none()
            && self.priority.is_none()
    }

    /// Returns `true` if `task` matches every provided field exactly.
    pub fn matches(&self, task: &TaskRecord) -> bool {
        let text_matches = |wanted: &Option<String>, actual: &Option<String>| {
            constraint(wanted).map_or(true, |w| actual.as_deref() == Some(w))
        };
        text_matches(&self.status, &task.status)
            && text_matches(&self.kind, &task.kind)
            && self
                .priority
                .as_ref()
                .map_or(true, |p| task.priority.as_ref() == Some(p))
    }
}

fn constraint(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
