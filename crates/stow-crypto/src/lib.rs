//! Content hashing for Stowage.
//!
//! Provides the domain-separated BLAKE3 hasher that mints hash-derived
//! [`Cid`](stow_types::Cid)s and verifies content read back from a backend.

pub mod hasher;

pub use hasher::ContentHasher;
