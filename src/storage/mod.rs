//! Record storage: the record contract, the tree engine, and load options.

/// Left-leaning red-black tree store.
///
/// The ordered container every persisted store is built on.
pub mod llrb;

/// Options applied when loading persisted stores.
pub mod options;

/// The capability contract for storable records.
pub mod record;
