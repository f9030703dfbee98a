//! Filesystem-backed content store.
//!
//! Layout: one file per identifier directly under `<root>/content/`, named by
//! the identifier's textual form. Files are written to a temporary sibling
//! and renamed into place, so a crash never leaves a truncated entry behind.

use std::fs::{self, DirEntry};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stow_crypto::ContentHasher;
use stow_types::{Cid, CidScheme};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::mint::mint_cid;
use crate::traits::{ContentStats, ContentStore, ListOptions};

/// Directory name for content under a store root.
pub const CONTENT_DIR: &str = "content";

/// Content store keeping one file per identifier.
///
/// The content directory is created lazily before every write, so opening a
/// store performs no I/O and a deleted directory is recreated on demand.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    dir: PathBuf,
    scheme: CidScheme,
}

impl FsContentStore {
    /// Open a store rooted at `root`, minting BLAKE3 identifiers.
    pub fn open(root: impl AsRef<Path>) -> Self {
        Self::with_scheme(root, CidScheme::default())
    }

    /// Open a store rooted at `root`, minting identifiers with `scheme`.
    pub fn with_scheme(root: impl AsRef<Path>, scheme: CidScheme) -> Self {
        Self {
            dir: root.as_ref().join(CONTENT_DIR),
            scheme,
        }
    }

    /// The content directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, cid: &Cid) -> PathBuf {
        self.dir.join(cid.as_str())
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Returns `true` if `path` exists and still hashes to `cid`. Anything
    /// else is overwritten by the caller.
    fn holds_intact(&self, path: &Path, cid: &Cid) -> bool {
        match fs::read(path) {
            Ok(existing) => {
                let intact = ContentHasher::CONTENT.verify(&existing, cid) == Some(true);
                if !intact {
                    warn!(cid = %cid.short(), "replacing corrupt content file");
                }
                intact
            }
            Err(_) => false,
        }
    }

    /// Every well-formed entry in the content directory. A missing
    /// directory holds no entries.
    fn entries(&self) -> StoreResult<Vec<(Cid, DirEntry)>> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Temporary files start with '.' and never parse as identifiers.
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if let Ok(cid) = Cid::parse(name) {
                entries.push((cid, entry));
            }
        }
        Ok(entries)
    }
}

impl ContentStore for FsContentStore {
    fn scheme(&self) -> CidScheme {
        self.scheme
    }

    fn add(&self, data: &[u8]) -> StoreResult<Cid> {
        let cid = mint_cid(self.scheme, data);
        self.ensure_dir()?;

        let path = self.path_for(&cid);
        if self.scheme == CidScheme::Blake3 && self.holds_intact(&path, &cid) {
            debug!(cid = %cid.short(), "content already present");
            return Ok(cid);
        }

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(cid = %cid.short(), len = data.len(), "content written");
        Ok(cid)
    }

    fn get(&self, cid: &Cid) -> StoreResult<Vec<u8>> {
        let data = match fs::read(self.path_for(cid)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(cid.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        if ContentHasher::CONTENT.verify(&data, cid) == Some(false) {
            return Err(StoreError::HashMismatch {
                cid: cid.clone(),
                computed: ContentHasher::CONTENT.cid(&data),
            });
        }
        Ok(data)
    }

    fn exists(&self, cid: &Cid) -> bool {
        match fs::metadata(self.path_for(cid)) {
            Ok(meta) => meta.is_file(),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(cid = %cid.short(), error = %e, "exists check failed; reporting absent");
                }
                false
            }
        }
    }

    fn list(&self, options: &ListOptions) -> StoreResult<Vec<Cid>> {
        let cids = self.entries()?.into_iter().map(|(cid, _)| cid);
        Ok(options.select(cids))
    }

    fn delete(&self, cid: &Cid) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(cid)) {
            Ok(()) => {
                debug!(cid = %cid.short(), "content deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn stats(&self) -> StoreResult<ContentStats> {
        let mut stats = ContentStats::default();
        for (_, entry) in self.entries()? {
            match entry.metadata() {
                Ok(meta) => {
                    stats.size += meta.len();
                    stats.items += 1;
                }
                // Deleted between listing and stat.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(stats)
    }

    fn clear(&self) -> StoreResult<()> {
        let entries = self.entries()?;
        let count = entries.len();
        for (_, entry) in entries {
            match fs::remove_file(entry.path()) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(removed = count, dir = %self.dir.display(), "content store cleared");
        Ok(())
    }
}
