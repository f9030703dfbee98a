//! The [`TaskLedger`] trait defining the task storage interface.

use crate::error::Result;
use crate::filter::TaskFilter;
use crate::record::TaskRecord;

/// Storage backend for mutable task records.
///
/// Implementations must be thread-safe (`Send + Sync`) and store copies:
/// mutating a record after handing it to the ledger never changes what the
/// ledger holds.
pub trait TaskLedger: Send + Sync {
    /// Store a full copy of `record`, replacing any task with the same id.
    ///
    /// Fails with `InvalidArgument` if the id is missing or unusable.
    fn store_task(&self, record: &TaskRecord) -> Result<()>;

    /// Read a task by id.
    ///
    /// Returns `Ok(None)` if no task has this id.
    fn get_task(&self, id: &str) -> Result<Option<TaskRecord>>;

    /// Shallow-merge `patch` into the existing task with the same id.
    ///
    /// Fails with `InvalidArgument` if the id is missing and `NotFound` if
    /// no task has the id. Callers wanting the merged record re-read it.
    fn update_task(&self, patch: &TaskRecord) -> Result<()>;

    /// List every task matching `filter`. An empty result is not an error.
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>>;

    /// Remove every task.
    fn clear(&self) -> Result<()>;

    /// Number of stored tasks.
    fn count(&self) -> Result<usize> {
        Ok(self.list_tasks(&TaskFilter::default())?.len())
    }
}
