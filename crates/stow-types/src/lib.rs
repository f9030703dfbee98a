//! Foundation types for Stowage.
//!
//! Every other Stowage crate depends on `stow-types`. It defines the opaque
//! content identifier handed out by the content store and the schemes used
//! to mint it.
//!
//! # Key Types
//!
//! - [`Cid`]: Opaque, string-backed content identifier
//! - [`CidScheme`]: How new identifiers are minted (hash or random)

pub mod cid;
pub mod error;

pub use cid::{Cid, CidScheme};
pub use error::TypeError;
