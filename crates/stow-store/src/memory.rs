use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use stow_types::{Cid, CidScheme};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::mint::mint_cid;
use crate::traits::{ContentStats, ContentStore, ListOptions};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Content is held behind a `RwLock` and
/// copied on read and write, so callers never alias stored bytes. `list`
/// returns identifiers in sorted order.
pub struct InMemoryContentStore {
    scheme: CidScheme,
    entries: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl InMemoryContentStore {
    /// Create a new empty store minting BLAKE3 identifiers.
    pub fn new() -> Self {
        Self::with_scheme(CidScheme::default())
    }

    /// Create a new empty store minting identifiers with `scheme`.
    pub fn with_scheme(scheme: CidScheme) -> Self {
        Self {
            scheme,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn scheme(&self) -> CidScheme {
        self.scheme
    }

    fn add(&self, data: &[u8]) -> StoreResult<Cid> {
        let cid = mint_cid(self.scheme, data);
        let mut map = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Hash-derived identifiers already present hold identical bytes.
        map.entry(cid.clone()).or_insert_with(|| data.to_vec());
        debug!(cid = %cid.short(), len = data.len(), "content added");
        Ok(cid)
    }

    fn get(&self, cid: &Cid) -> StoreResult<Vec<u8>> {
        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        map.get(cid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(cid.clone()))
    }

    fn exists(&self, cid: &Cid) -> bool {
        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        map.contains_key(cid)
    }

    fn list(&self, options: &ListOptions) -> StoreResult<Vec<Cid>> {
        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut cids: Vec<Cid> = map.keys().cloned().collect();
        cids.sort();
        Ok(options.select(cids))
    }

    fn delete(&self, cid: &Cid) -> StoreResult<bool> {
        let mut map = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let removed = map.remove(cid).is_some();
        if removed {
            debug!(cid = %cid.short(), "content deleted");
        }
        Ok(removed)
    }

    fn stats(&self) -> StoreResult<ContentStats> {
        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(ContentStats {
            size: map.values().map(|data| data.len() as u64).sum(),
            items: map.len(),
        })
    }

    fn clear(&self) -> StoreResult<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("content store cleared");
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("scheme", &self.scheme)
            .field("entry_count", &self.len())
            .finish()
    }
}
