use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::admin::util::open_existing;
use crate::admin::Result;
use crate::storage::llrb::Tree;
use crate::storage::options::StoreOptions;
use crate::storage::record::Record;

/// Summary of a database file and both of its stores.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Where the file lives and how large it is.
    pub filesystem: FilesystemStats,
    /// The flights store.
    pub flights: StoreStats,
    /// The customers store.
    pub customers: StoreStats,
}

/// On-disk facts about the database file.
#[derive(Debug, Clone, Serialize)]
pub struct FilesystemStats {
    /// Path as given.
    pub db_path: String,
    /// File length.
    pub db_size_bytes: u64,
}

/// Shape of one store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Record count.
    pub records: usize,
    /// Longest root-to-leaf path.
    pub height: usize,
    /// `None` when the store fails its invariant check.
    pub black_height: Option<usize>,
}

impl StoreStats {
    fn of<R: Record>(tree: &Tree<R>) -> Self {
        Self {
            records: tree.len(),
            height: tree.height(),
            black_height: tree.verify().ok().map(|shape| shape.black_height),
        }
    }
}

/// Opens the database at `path` and reports on each store.
pub fn stats(path: impl AsRef<Path>, opts: &StoreOptions) -> Result<StatsReport> {
    let path = path.as_ref();
    let db = open_existing(path, opts)?;
    let db_meta = fs::metadata(path)?;
    Ok(StatsReport {
        filesystem: FilesystemStats {
            db_path: path.display().to_string(),
            db_size_bytes: db_meta.len(),
        },
        flights: StoreStats::of(db.flights()),
        customers: StoreStats::of(db.customers()),
    })
}
