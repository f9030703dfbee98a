use stow_types::{Cid, CidScheme};

use crate::error::{StoreError, StoreResult};

/// Options for [`ContentStore::list`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only identifiers whose textual form starts with this prefix.
    pub prefix: Option<String>,
    /// Truncate the result to this many identifiers. `None` and `Some(0)`
    /// both mean "no limit".
    pub limit: Option<usize>,
}

impl ListOptions {
    /// Options that list every identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to identifiers starting with `prefix`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Truncate to at most `limit` identifiers.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if `cid` passes the prefix filter.
    pub fn matches(&self, cid: &Cid) -> bool {
        self.prefix.as_deref().map_or(true, |p| cid.has_prefix(p))
    }

    /// Filter `cids` by prefix, then apply the limit.
    pub fn select(&self, cids: impl IntoIterator<Item = Cid>) -> Vec<Cid> {
        let matching = cids.into_iter().filter(|cid| self.matches(cid));
        match self.limit {
            Some(limit) if limit > 0 => matching.take(limit).collect(),
            _ => matching.collect(),
        }
    }
}

/// Point-in-time size snapshot of a content store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentStats {
    /// Sum of the byte lengths of all stored content.
    pub size: u64,
    /// Number of stored entries.
    pub items: usize,
}

/// Write-once store of byte payloads keyed by store-minted identifiers.
///
/// All implementations must satisfy these invariants:
/// - An identifier, once returned by `add`, resolves to exactly the bytes
///   that were passed in until it is deleted.
/// - `get` of an absent identifier fails with [`StoreError::NotFound`];
///   `exists` and `delete` report absence as `false`.
/// - `list` and `stats` reflect current state, never a cached view.
/// - All I/O errors are propagated, never silently ignored.
pub trait ContentStore: Send + Sync {
    /// Scheme used to mint identifiers for new content.
    fn scheme(&self) -> CidScheme;

    /// Store `data` and return its identifier.
    fn add(&self, data: &[u8]) -> StoreResult<Cid>;

    /// Store a string as UTF-8 bytes.
    fn add_str(&self, text: &str) -> StoreResult<Cid> {
        self.add(text.as_bytes())
    }

    /// Read the bytes behind `cid`.
    fn get(&self, cid: &Cid) -> StoreResult<Vec<u8>>;

    /// Check whether `cid` is currently present. Never fails.
    fn exists(&self, cid: &Cid) -> bool;

    /// List identifiers matching `options`. Order is backend-specific.
    fn list(&self, options: &ListOptions) -> StoreResult<Vec<Cid>>;

    /// Delete `cid`. Returns `true` if an entry was removed.
    fn delete(&self, cid: &Cid) -> StoreResult<bool>;

    /// Recompute total size and entry count from current state.
    fn stats(&self) -> StoreResult<ContentStats>;

    /// Remove every entry.
    fn clear(&self) -> StoreResult<()>;

    /// Read multiple identifiers; absent ones map to `None`.
    ///
    /// Default implementation calls `get()` for each identifier.
    fn read_batch(&self, cids: &[Cid]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        cids.iter()
            .map(|cid| match self.get(cid) {
                Ok(data) => Ok(Some(data)),
                Err(StoreError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            })
            .collect()
    }
}
