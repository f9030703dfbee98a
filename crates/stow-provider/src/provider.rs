use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use stow_store::{ContentStats, ContentStore, FsContentStore, InMemoryContentStore, ListOptions};
use stow_tasks::{FsTaskLedger, InMemoryTaskLedger, TaskFilter, TaskLedger, TaskRecord};
use stow_types::{Cid, CidScheme};
use tracing::info;

use crate::config::{BackendKind, ProviderConfig};
use crate::error::ProviderResult;

/// Aggregate size of the content namespace. Tasks are not counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    /// Sum of byte lengths of all stored content.
    pub size: u64,
    /// Number of content entries.
    pub items: usize,
}

impl From<ContentStats> for ProviderStats {
    fn from(stats: ContentStats) -> Self {
        Self {
            size: stats.size,
            items: stats.items,
        }
    }
}

/// Content store and task ledger behind one handle.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct Provider {
    content: Arc<dyn ContentStore>,
    tasks: Arc<dyn TaskLedger>,
}

impl Provider {
    /// Compose a provider from explicit backends.
    pub fn with_backends(content: Arc<dyn ContentStore>, tasks: Arc<dyn TaskLedger>) -> Self {
        Self { content, tasks }
    }

    /// Process-local provider minting BLAKE3 identifiers.
    pub fn in_memory() -> Self {
        Self::in_memory_with_scheme(CidScheme::default())
    }

    pub fn in_memory_with_scheme(scheme: CidScheme) -> Self {
        Self::with_backends(
            Arc::new(InMemoryContentStore::with_scheme(scheme)),
            Arc::new(InMemoryTaskLedger::new()),
        )
    }

    /// Filesystem provider rooted at `root`, minting BLAKE3 identifiers.
    ///
    /// Performs no I/O: directories are created before the first write.
    pub fn open(root: impl AsRef<Path>) -> Self {
        Self::open_with_scheme(root, CidScheme::default())
    }

    pub fn open_with_scheme(root: impl AsRef<Path>, scheme: CidScheme) -> Self {
        let root = root.as_ref();
        Self::with_backends(
            Arc::new(FsContentStore::with_scheme(root, scheme)),
            Arc::new(FsTaskLedger::open(root)),
        )
    }

    /// Build the provider described by `config`.
    pub fn from_config(config: &ProviderConfig) -> Self {
        info!(
            backend = ?config.backend,
            root = %config.root.display(),
            scheme = %config.cid_scheme,
            "opening storage provider"
        );
        match config.backend {
            BackendKind::Memory => Self::in_memory_with_scheme(config.cid_scheme),
            BackendKind::Filesystem => Self::open_with_scheme(&config.root, config.cid_scheme),
        }
    }

    /// The underlying content store.
    pub fn content(&self) -> &dyn ContentStore {
        self.content.as_ref()
    }

    /// The underlying task ledger.
    pub fn tasks(&self) -> &dyn TaskLedger {
        self.tasks.as_ref()
    }

    // ---- Content operations ----

    pub fn add(&self, data: &[u8]) -> ProviderResult<Cid> {
        Ok(self.content.add(data)?)
    }

    pub fn add_str(&self, text: &str) -> ProviderResult<Cid> {
        Ok(self.content.add_str(text)?)
    }

    pub fn get(&self, cid: &Cid) -> ProviderResult<Vec<u8>> {
        Ok(self.content.get(cid)?)
    }

    pub fn exists(&self, cid: &Cid) -> bool {
        self.content.exists(cid)
    }

    pub fn list(&self, options: &ListOptions) -> ProviderResult<Vec<Cid>> {
        Ok(self.content.list(options)?)
    }

    pub fn delete(&self, cid: &Cid) -> ProviderResult<bool> {
        Ok(self.content.delete(cid)?)
    }

    pub fn read_batch(&self, cids: &[Cid]) -> ProviderResult<Vec<Option<Vec<u8>>>> {
        Ok(self.content.read_batch(cids)?)
    }

    // ---- Task operations ----

    pub fn store_task(&self, record: &TaskRecord) -> ProviderResult<()> {
        Ok(self.tasks.store_task(record)?)
    }

    pub fn get_task(&self, id: &str) -> ProviderResult<Option<TaskRecord>> {
        Ok(self.tasks.get_task(id)?)
    }

    pub fn update_task(&self, patch: &TaskRecord) -> ProviderResult<()> {
        Ok(self.tasks.update_task(patch)?)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> ProviderResult<Vec<TaskRecord>> {
        Ok(self.tasks.list_tasks(filter)?)
    }

    // ---- Diagnostics ----

    /// Size and count of stored content, recomputed on every call.
    pub fn stats(&self) -> ProviderResult<ProviderStats> {
        Ok(self.content.stats()?.into())
    }

    /// Empty both namespaces. Every previously issued identifier and task id
    /// resolves as absent afterwards.
    pub fn clear(&self) -> ProviderResult<()> {
        self.content.clear()?;
        self.tasks.clear()?;
        info!("storage provider cleared");
        Ok(())
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("scheme", &self.content.scheme())
            .finish_non_exhaustive()
    }
}
