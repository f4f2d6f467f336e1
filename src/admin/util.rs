use std::path::Path;

use crate::admin::{AdminError, Result};
use crate::db::Database;
use crate::storage::options::StoreOptions;

/// Opens an existing database; unlike [`Database::open`], a missing file is
/// an error here.
pub(crate) fn open_existing(path: &Path, opts: &StoreOptions) -> Result<Database> {
    if !path.exists() {
        return Err(AdminError::missing_database(path));
    }
    Ok(Database::open(path, *opts)?)
}
