#![forbid(unsafe_code)]

//! Inspection utilities over a persisted database file.

mod error;
mod stats;
mod util;
mod verify;

/// Error types for administrative operations.
pub use error::{AdminError, Result};

/// Per-store statistics.
///
/// Record counts, tree height, and black height for each store in a file.
pub use stats::{stats, FilesystemStats, StatsReport, StoreStats};

/// Integrity verification of a database file.
pub use verify::{verify, VerifyCounts, VerifyFinding, VerifyReport, VerifySeverity};
