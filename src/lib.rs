//! Persistent ordered record store built on a left-leaning red-black tree.
//!
//! A [`Tree`] holds records of a single type implementing [`Record`] and
//! supports logarithmic insert, erase, and lookup. A whole tree, including
//! its node colours and shape, serializes to one binary stream and loads
//! back through a [`RecordFactory`] that manufactures blank records of the
//! stored type.

#![warn(missing_docs)]

pub mod admin;
pub mod db;
pub mod model;
pub mod primitives;
pub mod storage;
pub mod types;

pub use db::Database;
pub use model::{Customer, Flight};
pub use primitives::bytes::{DecodeLimits, Reader, Writer};
pub use storage::llrb::{Tree, TreeShape};
pub use storage::options::StoreOptions;
pub use storage::record::{Record, RecordFactory, Witness};
pub use types::{Result, StoreError};
