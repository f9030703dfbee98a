//! Filesystem-backed task ledger.
//!
//! Layout: one pretty-printed JSON document per task at
//! `<root>/tasks/<id>.json`. Documents are written to a temporary sibling
//! and renamed into place, so a crash never leaves a partial task file.
//!
//! `update_task` reads, merges, and rewrites without any cross-process lock:
//! two interleaved updates of the same task are last-write-wins.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Result, TaskError};
use crate::filter::TaskFilter;
use crate::names::validate_task_id;
use crate::record::TaskRecord;
use crate::traits::TaskLedger;

/// Directory name for task documents under a store root.
pub const TASKS_DIR: &str = "tasks";

/// File extension of task documents.
const TASK_EXT: &str = "json";

/// Task ledger keeping one JSON document per task.
#[derive(Debug, Clone)]
pub struct FsTaskLedger {
    dir: PathBuf,
}

impl FsTaskLedger {
    /// Open a ledger rooted at `root`. Performs no I/O; the task directory
    /// is created before the first write.
    pub fn open(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(TASKS_DIR),
        }
    }

    /// The task directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{TASK_EXT}"))
    }

    fn write_task(&self, task: &TaskRecord) -> Result<()> {
        let data = task.to_json_pretty()?;
        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(&task.id)).map_err(|e| e.error)?;
        Ok(())
    }

    fn read_task(&self, path: &Path) -> Result<Option<TaskRecord>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        TaskRecord::from_json(&data).map(Some).map_err(|e| match e {
            TaskError::Serialization { reason, .. } => TaskError::Serialization {
                id: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Paths of every task document. A missing directory holds none.
    fn task_paths(&self) -> Result<Vec<PathBuf>> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in dir {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file()
                && path.extension().is_some_and(|ext| ext == TASK_EXT)
            {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl TaskLedger for FsTaskLedger {
    fn store_task(&self, record: &TaskRecord) -> Result<()> {
        record.validate()?;
        self.write_task(record)?;
        debug!(task = %record.id, "task stored");
        Ok(())
    }

    fn get_task(&self, id: &str) -> Result<Option<TaskRecord>> {
        // Ids that could never have been stored cannot be present.
        if validate_task_id(id).is_err() {
            return Ok(None);
        }
        self.read_task(&self.path_for(id))
    }

    fn update_task(&self, patch: &TaskRecord) -> Result<()> {
        patch.validate()?;
        let mut task = self
            .read_task(&self.path_for(&patch.id))?
            .ok_or_else(|| TaskError::NotFound {
                id: patch.id.clone(),
            })?;
        task.merge(patch);
        self.write_task(&task)?;
        debug!(task = %patch.id, "task updated");
        Ok(())
    }

    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>> {
        let mut tasks = Vec::new();
        for path in self.task_paths()? {
            match self.read_task(&path) {
                Ok(Some(task)) if filter.matches(&task) => tasks.push(task),
                Ok(_) => {}
                Err(TaskError::Serialization { id, reason }) => {
                    warn!(path = %id, %reason, "skipping unreadable task document");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(tasks)
    }

    fn clear(&self) -> Result<()> {
        let paths = self.task_paths()?;
        let count = paths.len();
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(removed = count, dir = %self.dir.display(), "task ledger cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_ledger() -> (tempfile::TempDir, FsTaskLedger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FsTaskLedger::open(dir.path());
        (dir, ledger)
    }

    #[test]
    fn writes_one_json_document_per_task() {
        let (_dir, ledger) = temp_ledger();
        ledger
            .store_task(&TaskRecord::new("t1").with_kind("build").with_field("n", 1))
            .unwrap();
        let raw = fs::read_to_string(ledger.dir().join("t1.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, json!({"id": "t1", "type": "build", "n": 1}));
    }

    #[test]
    fn reads_documents_written_by_other_tools() {
        let (_dir, ledger) = temp_ledger();
        fs::create_dir_all(ledger.dir()).unwrap();
        fs::write(
            ledger.dir().join("legacy.json"),
            r#"{"id":"legacy","status":"pending","description":"from elsewhere"}"#,
        )
        .unwrap();
        let task = ledger.get_task("legacy").unwrap().unwrap();
        assert_eq!(task.status.as_deref(), Some("pending"));
        assert_eq!(task.field("description"), Some(&json!("from elsewhere")));
    }

    #[test]
    fn unsafe_lookup_id_is_absent() {
        let (_dir, ledger) = temp_ledger();
        assert_eq!(ledger.get_task("../etc/passwd").unwrap(), None);
    }

    #[test]
    fn update_missing_is_not_found() {
        let (_dir, ledger) = temp_ledger();
        let err = ledger
            .update_task(&TaskRecord::new("ghost").with_status("x"))
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound { .. }));
        assert!(!ledger.dir().join("ghost.json").exists());
    }

    #[test]
    fn list_ignores_non_json_and_skips_corrupt_documents() {
        let (_dir, ledger) = temp_ledger();
        ledger.store_task(&TaskRecord::new("good")).unwrap();
        fs::write(ledger.dir().join("notes.txt"), "not a task").unwrap();
        fs::write(ledger.dir().join("broken.json"), "{ not json").unwrap();

        let tasks = ledger.list_tasks(&TaskFilter::new()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "good");
    }

    #[test]
    fn get_corrupt_document_is_serialization_error() {
        let (_dir, ledger) = temp_ledger();
        fs::create_dir_all(ledger.dir()).unwrap();
        fs::write(ledger.dir().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(
            ledger.get_task("broken"),
            Err(TaskError::Serialization { .. })
        ));
    }

    #[test]
    fn clear_on_missing_directory_succeeds() {
        let (_dir, ledger) = temp_ledger();
        ledger.clear().unwrap();
        assert!(ledger.list_tasks(&TaskFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn store_recreates_deleted_directory() {
        let (_dir, ledger) = temp_ledger();
        ledger.store_task(&TaskRecord::new("a")).unwrap();
        fs::remove_dir_all(ledger.dir()).unwrap();
        ledger.store_task(&TaskRecord::new("b")).unwrap();
        assert!(ledger.get_task("b").unwrap().is_some());
    }
}
