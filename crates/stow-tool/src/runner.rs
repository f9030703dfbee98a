use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use stow_provider::{Cid, Provider, TaskFilter, TaskRecord};
use tracing::{debug, info, warn};

use crate::error::{ToolError, ToolResult};
use crate::invoker::{InvokeError, ToolInvoker};
use crate::render::describe_input;

/// Task type recorded for every tool invocation.
pub const TOOL_TASK_KIND: &str = "tool";

pub const STATUS_RUNNING: &str = "running";
pub const STATUS_DONE: &str = "done";
pub const STATUS_FAILED: &str = "failed";

/// Outcome of one tool invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolRun {
    pub task_id: String,
    pub input_cid: Cid,
    pub output_cid: Option<Cid>,
    pub status: String,
    pub error: Option<String>,
}

impl ToolRun {
    pub fn succeeded(&self) -> bool {
        self.status == STATUS_DONE
    }
}

/// Runs tools through a [`ToolInvoker`] and records each call in a
/// [`Provider`].
pub struct ToolRunner {
    provider: Provider,
    invoker: Arc<dyn ToolInvoker>,
}

impl ToolRunner {
    pub fn new(provider: Provider, invoker: Arc<dyn ToolInvoker>) -> Self {
        Self { provider, invoker }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Invoke `tool` with `input`, persisting the payloads and tracking the
    /// call as a task.
    ///
    /// A failing tool is not an error: the run comes back with status
    /// `failed` and the tool's message. Storage failures are returned as
    /// [`ToolError`]; once the task exists it is marked `failed` first, on a
    /// best-effort basis.
    pub async fn run(&self, tool: &str, input: Value) -> ToolResult<ToolRun> {
        let input_cid = self.provider.add(&encode(&input)?)?;
        let task_id = format!("tool-{}", uuid::Uuid::now_v7());

        self.provider.store_task(
            &TaskRecord::new(&task_id)
                .with_status(STATUS_RUNNING)
                .with_kind(TOOL_TASK_KIND)
                .with_field("tool", tool)
                .with_field("input_cid", input_cid.as_str()),
        )?;
        info!(task = %task_id, %tool, input = %describe_input(&input), "tool invoked");

        let mut run = ToolRun {
            task_id,
            input_cid,
            output_cid: None,
            status: STATUS_RUNNING.to_string(),
            error: None,
        };

        let outcome = self.invoker.invoke(tool, &input).await;
        if let Err(e) = self.finish(&mut run, outcome) {
            self.abandon(&run.task_id, &e);
            return Err(e);
        }
        Ok(run)
    }

    /// Record the invoker's outcome on the task and in `run`.
    fn finish(&self, run: &mut ToolRun, outcome: Result<Value, InvokeError>) -> ToolResult<()> {
        match outcome {
            Ok(output) => {
                let output_cid = self.provider.add(&encode(&output)?)?;
                self.provider.update_task(
                    &TaskRecord::new(&run.task_id)
                        .with_status(STATUS_DONE)
                        .with_field("output_cid", output_cid.as_str()),
                )?;
                debug!(task = %run.task_id, output = %output_cid.short(), "tool finished");
                run.status = STATUS_DONE.to_string();
                run.output_cid = Some(output_cid);
            }
            Err(e) => {
                self.provider.update_task(
                    &TaskRecord::new(&run.task_id)
                        .with_status(STATUS_FAILED)
                        .with_field("error", e.to_string()),
                )?;
                warn!(task = %run.task_id, error = %e, "tool failed");
                run.status = STATUS_FAILED.to_string();
                run.error = Some(e.to_string());
            }
        }
        Ok(())
    }

    /// Mark a task `failed` after its run could not be recorded. Errors here
    /// are logged, never returned.
    fn abandon(&self, task_id: &str, cause: &ToolError) {
        let patch = TaskRecord::new(task_id)
            .with_status(STATUS_FAILED)
            .with_field("error", cause.to_string());
        match self.provider.update_task(&patch) {
            Ok(()) => warn!(task = %task_id, error = %cause, "tool run abandoned"),
            Err(e) => warn!(task = %task_id, error = %e, "could not mark abandoned tool run"),
        }
    }

    /// Decode the output recorded for `task_id`.
    ///
    /// Returns `Ok(None)` if the task is unknown or has no output yet.
    pub fn output(&self, task_id: &str) -> ToolResult<Option<Value>> {
        self.payload(task_id, "output_cid")
    }

    /// Decode the input recorded for `task_id`.
    pub fn input(&self, task_id: &str) -> ToolResult<Option<Value>> {
        self.payload(task_id, "input_cid")
    }

    /// Tool invocations, optionally restricted to one status.
    pub fn history(&self, status: Option<&str>) -> ToolResult<Vec<TaskRecord>> {
        let mut filter = TaskFilter::new().kind(TOOL_TASK_KIND);
        if let Some(status) = status {
            filter = filter.status(status);
        }
        Ok(self.provider.list_tasks(&filter)?)
    }

    fn payload(&self, task_id: &str, field: &str) -> ToolResult<Option<Value>> {
        let Some(task) = self.provider.get_task(task_id)? else {
            return Ok(None);
        };
        let Some(raw) = task.field(field) else {
            return Ok(None);
        };
        let cid = raw
            .as_str()
            .and_then(|s| Cid::parse(s).ok())
            .ok_or_else(|| ToolError::Payload(format!("task {task_id} has a malformed {field}")))?;
        let bytes = self.provider.get(&cid)?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ToolError::Payload(format!("{field} of task {task_id}: {e}")))
    }
}

fn encode(value: &Value) -> ToolResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ToolError::Payload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stow_provider::{CidScheme, ErrorKind, ListOptions};
    use stow_store::{
        ContentStats, ContentStore, InMemoryContentStore, StoreError, StoreResult,
    };
    use stow_tasks::InMemoryTaskLedger;

    struct Echo;

    #[async_trait]
    impl ToolInvoker for Echo {
        async fn invoke(&self, tool: &str, input: &Value) -> Result<Value, InvokeError> {
            Ok(json!({"tool": tool, "echo": input}))
        }
    }

    struct Broken;

    #[async_trait]
    impl ToolInvoker for Broken {
        async fn invoke(&self, _tool: &str, _input: &Value) -> Result<Value, InvokeError> {
            Err(InvokeError("server exited".into()))
        }
    }

    fn runner(invoker: Arc<dyn ToolInvoker>) -> ToolRunner {
        ToolRunner::new(Provider::in_memory(), invoker)
    }

    #[tokio::test]
    async fn successful_run_records_output() {
        let runner = runner(Arc::new(Echo));
        let run = runner.run("search", json!({"q": "rust"})).await.unwrap();

        assert!(run.succeeded());
        assert!(run.error.is_none());
        let task = runner.provider().get_task(&run.task_id).unwrap().unwrap();
        assert_eq!(task.status.as_deref(), Some(STATUS_DONE));
        assert_eq!(task.kind.as_deref(), Some(TOOL_TASK_KIND));
        assert_eq!(task.field("tool"), Some(&json!("search")));
        assert_eq!(
            task.field("output_cid"),
            Some(&json!(run.output_cid.as_ref().unwrap().as_str()))
        );

        assert_eq!(
            runner.output(&run.task_id).unwrap(),
            Some(json!({"tool": "search", "echo": {"q": "rust"}}))
        );
        assert_eq!(runner.input(&run.task_id).unwrap(), Some(json!({"q": "rust"})));
    }

    #[tokio::test]
    async fn failing_tool_is_recorded_not_returned() {
        let runner = runner(Arc::new(Broken));
        let run = runner.run("search", json!({})).await.unwrap();

        assert_eq!(run.status, STATUS_FAILED);
        assert_eq!(run.error.as_deref(), Some("server exited"));
        assert!(run.output_cid.is_none());

        let task = runner.provider().get_task(&run.task_id).unwrap().unwrap();
        assert_eq!(task.status.as_deref(), Some(STATUS_FAILED));
        assert_eq!(task.field("error"), Some(&json!("server exited")));
        assert_eq!(runner.output(&run.task_id).unwrap(), None);
        // The input is still kept for inspection.
        assert!(runner.provider().exists(&run.input_cid));
    }

    #[tokio::test]
    async fn history_filters_by_status() {
        let provider = Provider::in_memory();
        let ok = ToolRunner::new(provider.clone(), Arc::new(Echo));
        let bad = ToolRunner::new(provider.clone(), Arc::new(Broken));
        ok.run("a", json!(1)).await.unwrap();
        ok.run("b", json!(2)).await.unwrap();
        bad.run("c", json!(3)).await.unwrap();
        provider
            .store_task(&TaskRecord::new("unrelated").with_status(STATUS_DONE))
            .unwrap();

        assert_eq!(ok.history(None).unwrap().len(), 3);
        assert_eq!(ok.history(Some(STATUS_DONE)).unwrap().len(), 2);
        assert_eq!(ok.history(Some(STATUS_FAILED)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_task_has_no_output() {
        let runner = runner(Arc::new(Echo));
        assert_eq!(runner.output("tool-missing").unwrap(), None);
    }

    #[tokio::test]
    async fn deleted_output_surfaces_not_found() {
        let runner = runner(Arc::new(Echo));
        let run = runner.run("x", json!(null)).await.unwrap();
        runner
            .provider()
            .delete(run.output_cid.as_ref().unwrap())
            .unwrap();
        match runner.output(&run.task_id) {
            Err(ToolError::Storage(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    /// Accepts the first write, then reports the backend as unavailable.
    struct FailsAfterFirstWrite {
        inner: InMemoryContentStore,
        writes: AtomicUsize,
    }

    impl ContentStore for FailsAfterFirstWrite {
        fn scheme(&self) -> CidScheme {
            self.inner.scheme()
        }
        fn add(&self, data: &[u8]) -> StoreResult<Cid> {
            if self.writes.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.add(data)
        }
        fn get(&self, cid: &Cid) -> StoreResult<Vec<u8>> {
            self.inner.get(cid)
        }
        fn exists(&self, cid: &Cid) -> bool {
            self.inner.exists(cid)
        }
        fn list(&self, options: &ListOptions) -> StoreResult<Vec<Cid>> {
            self.inner.list(options)
        }
        fn delete(&self, cid: &Cid) -> StoreResult<bool> {
            self.inner.delete(cid)
        }
        fn stats(&self) -> StoreResult<ContentStats> {
            self.inner.stats()
        }
        fn clear(&self) -> StoreResult<()> {
            self.inner.clear()
        }
    }

    #[tokio::test]
    async fn storage_failure_after_invoke_marks_task_failed() {
        let provider = Provider::with_backends(
            Arc::new(FailsAfterFirstWrite {
                inner: InMemoryContentStore::new(),
                writes: AtomicUsize::new(0),
            }),
            Arc::new(InMemoryTaskLedger::new()),
        );
        let runner = ToolRunner::new(provider.clone(), Arc::new(Echo));

        let err = runner.run("search", json!({"q": "x"})).await.unwrap_err();
        assert!(matches!(
            &err,
            ToolError::Storage(e) if e.kind() == ErrorKind::BackendUnavailable
        ));

        let history = runner.history(None).unwrap();
        assert_eq!(history.len(), 1);
        let task = &history[0];
        assert_eq!(task.status.as_deref(), Some(STATUS_FAILED));
        assert!(task
            .field("error")
            .and_then(Value::as_str)
            .is_some_and(|msg| msg.contains("disk full")));
        assert!(runner.history(Some(STATUS_RUNNING)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn runs_against_filesystem_provider() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ToolRunner::new(Provider::open(dir.path()), Arc::new(Echo));
        let run = runner.run("fs", json!({"k": "v"})).await.unwrap();
        assert!(dir
            .path()
            .join("tasks")
            .join(format!("{}.json", run.task_id))
            .is_file());
        assert!(runner.output(&run.task_id).unwrap().is_some());
    }
}
