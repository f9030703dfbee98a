//! Content store for Stowage.
//!
//! Holds immutable byte payloads keyed by a [`Cid`] minted at write time.
//! Consumers never choose identifiers and never see which backend holds the
//! bytes.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`]: `HashMap`-based store for tests and embedding
//! - [`FsContentStore`]: one file per identifier under a content directory
//!
//! # Design Rules
//!
//! 1. Content is write-once: there is no update operation.
//! 2. `get` of an absent identifier is an error; `exists` and `delete` are not.
//! 3. Hash-derived identifiers are verified on read by the filesystem backend.
//! 4. The store never interprets content; it is a pure key-value store.
//! 5. I/O errors are propagated, never retried.

pub mod error;
pub mod fs;
pub mod memory;
pub mod mint;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use mint::mint_cid;
pub use stow_types::{Cid, CidScheme};
pub use traits::{ContentStats, ContentStore, ListOptions};
