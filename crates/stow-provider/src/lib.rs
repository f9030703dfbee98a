//! Storage provider for Stowage.
//!
//! A [`Provider`] owns one content store and one task ledger and exposes
//! both through a single handle. Callers pick a backend once, at
//! construction, and every operation behaves identically afterwards:
//!
//! ```
//! use stow_provider::{Provider, TaskFilter, TaskRecord};
//!
//! let provider = Provider::in_memory();
//! let cid = provider.add(b"build log").unwrap();
//! provider
//!     .store_task(&TaskRecord::new("t1").with_status("done").with_field("log", cid.as_str()))
//!     .unwrap();
//! assert_eq!(provider.list_tasks(&TaskFilter::new().status("done")).unwrap().len(), 1);
//! assert_eq!(provider.stats().unwrap().items, 1);
//! ```
//!
//! There is no global instance: share a provider by passing it (or an
//! `Arc` of it) to every consumer.

pub mod config;
pub mod error;
pub mod provider;

pub use config::{BackendKind, ProviderConfig};
pub use error::{ErrorKind, ProviderError, ProviderResult};
pub use provider::{Provider, ProviderStats};
pub use stow_store::ListOptions;
pub use stow_tasks::{Priority, TaskFilter, TaskRecord};
pub use stow_types::{Cid, CidScheme};
