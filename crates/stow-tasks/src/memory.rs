//! In-memory task ledger for testing and ephemeral use.
//!
//! [`InMemoryTaskLedger`] stores all tasks in a `HashMap` protected by a
//! `RwLock`. Updates run their read-merge-write under a single write lock,
//! so two updates of the same task never lose each other's fields.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::error::{Result, TaskError};
use crate::filter::TaskFilter;
use crate::record::TaskRecord;
use crate::traits::TaskLedger;

/// An in-memory implementation of [`TaskLedger`].
///
/// Data is lost when the ledger is dropped. `list_tasks` returns tasks
/// sorted by id.
#[derive(Debug, Default)]
pub struct InMemoryTaskLedger {
    tasks: RwLock<HashMap<String, TaskRecord>>,
}

impl InMemoryTaskLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskLedger for InMemoryTaskLedger {
    fn store_task(&self, record: &TaskRecord) -> Result<()> {
        record.validate()?;
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        tasks.insert(record.id.clone(), record.clone());
        debug!(task = %record.id, "task stored");
        Ok(())
    }

    fn get_task(&self, id: &str) -> Result<Option<TaskRecord>> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tasks.get(id).cloned())
    }

    fn update_task(&self, patch: &TaskRecord) -> Result<()> {
        patch.validate()?;
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let existing = tasks.get_mut(&patch.id).ok_or_else(|| TaskError::NotFound {
            id: patch.id.clone(),
        })?;
        existing.merge(patch);
        debug!(task = %patch.id, "task updated");
        Ok(())
    }

    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<TaskRecord> = tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }

    fn clear(&self) -> Result<()> {
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("task ledger cleared");
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len())
    }
}
