//! Task ledger for Stowage.
//!
//! This crate tracks mutable task records keyed by caller-assigned ids,
//! alongside (but independent of) the immutable content store.
//!
//! # Architecture
//!
//! - **Records** carry four well-known fields (`id`, `status`, `type`,
//!   `priority`) plus an open bag of caller-defined fields that is preserved
//!   verbatim.
//! - **Updates** are shallow merges: fields present in the patch overwrite,
//!   everything else is kept.
//! - **Queries** filter by exact equality on any combination of `status`,
//!   `type`, and `priority`.
//! - **Lookups** of unknown ids return `None`; only updates of unknown ids
//!   are errors.
//!
//! # Modules
//!
//! - [`error`]: Error types for ledger operations
//! - [`record`]: [`TaskRecord`] and [`Priority`]
//! - [`filter`]: [`TaskFilter`]
//! - [`names`]: Task id validation
//! - [`traits`]: The [`TaskLedger`] trait
//! - [`memory`]: In-memory [`InMemoryTaskLedger`]
//! - [`fs`]: One-JSON-file-per-task [`FsTaskLedger`]

pub mod error;
pub mod filter;
pub mod fs;
pub mod memory;
pub mod names;
pub mod record;
pub mod traits;

pub use error::{Result, TaskError};
pub use filter::TaskFilter;
pub use fs::FsTaskLedger;
pub use memory::InMemoryTaskLedger;
pub use names::validate_task_id;
pub use record::{Priority, TaskRecord};
pub use traits::TaskLedger;
