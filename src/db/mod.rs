#![forbid(unsafe_code)]

//! The reservation database file: a flights store followed by a customers
//! store, each a complete tree block, with no header between them.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::model::{Customer, Flight};
use crate::primitives::bytes::{Reader, Writer};
use crate::storage::llrb::Tree;
use crate::storage::options::StoreOptions;
use crate::storage::record::{Record, RecordFactory, Witness};
use crate::types::{Result, StoreError};

/// Both stores of the reservation system.
#[derive(Debug, Default)]
pub struct Database {
    flights: Tree<Flight>,
    customers: Tree<Customer>,
    options: StoreOptions,
}

impl Database {
    /// An empty database with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty database that will load and verify with `options`.
    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Loads the database at `path`. A missing file yields an empty
    /// database.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "database file missing; starting empty");
                return Ok(Self::with_options(options));
            }
            Err(err) => return Err(StoreError::Io(err)),
        };
        let db = Self::read_from(BufReader::new(file), options)?;
        info!(
            path = %path.display(),
            flights = db.flights.len(),
            customers = db.customers.len(),
            "database opened"
        );
        Ok(db)
    }

    /// Decodes a database from any stream. The stream must end exactly
    /// after the customers store.
    pub fn read_from<S: Read>(src: S, options: StoreOptions) -> Result<Self> {
        let mut reader = Reader::with_limits(src, options.limits());
        let flights = load_tree(&mut reader, &Witness(&Flight::key("")), &options)?;
        let customers = load_tree(&mut reader, &Witness(&Customer::default()), &options)?;
        reader.expect_end()?;
        Ok(Self {
            flights,
            customers,
            options,
        })
    }

    /// Encodes both stores and returns the number of bytes written.
    ///
    /// The database's own limits apply, so a stream that this database could
    /// not read back is refused with [`StoreError::Invalid`].
    pub fn write_to<W: Write>(&self, out: W) -> Result<u64> {
        let mut writer = Writer::with_limits(out, self.options.limits());
        self.flights.save(&mut writer)?;
        self.customers.save(&mut writer)?;
        writer.flush()?;
        Ok(writer.bytes_written())
    }

    /// Writes the database to `path` through a sibling temporary file, so a
    /// failed save leaves the previous contents intact and no temporary file
    /// behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(path);
        let written = self
            .write_temp(&tmp)
            .and_then(|bytes| fs::rename(&tmp, path).map(|()| bytes).map_err(StoreError::from));
        let bytes = match written {
            Ok(bytes) => bytes,
            Err(err) => {
                remove_temp(&tmp);
                return Err(err);
            }
        };
        info!(
            path = %path.display(),
            bytes,
            flights = self.flights.len(),
            customers = self.customers.len(),
            "database saved"
        );
        Ok(())
    }

    fn write_temp(&self, tmp: &Path) -> Result<u64> {
        let mut out = BufWriter::new(File::create(tmp)?);
        let bytes = self.write_to(&mut out)?;
        let file = out
            .into_inner()
            .map_err(|err| StoreError::Io(err.into_error()))?;
        file.sync_all()?;
        Ok(bytes)
    }

    /// The flights store.
    pub fn flights(&self) -> &Tree<Flight> {
        &self.flights
    }

    /// Mutable access to the flights store.
    pub fn flights_mut(&mut self) -> &mut Tree<Flight> {
        &mut self.flights
    }

    /// The customers store.
    pub fn customers(&self) -> &Tree<Customer> {
        &self.customers
    }

    /// Mutable access to the customers store.
    pub fn customers_mut(&mut self) -> &mut Tree<Customer> {
        &mut self.customers
    }

    /// Options this database was opened with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Customers booked on `flight_id`, in key order.
    pub fn customers_on(&self, flight_id: &str) -> Vec<&Customer> {
        let mut out = Vec::new();
        self.customers.for_each(|c| {
            if c.flight_id == flight_id {
                out.push(c);
            }
        });
        out
    }
}

fn load_tree<R, S, F>(reader: &mut Reader<S>, factory: &F, options: &StoreOptions) -> Result<Tree<R>>
where
    R: Record,
    S: Read,
    F: RecordFactory<R> + ?Sized,
{
    if options.verify_on_load {
        Tree::load_verified(reader, factory)
    } else {
        Tree::load(reader, factory)
    }
}

fn remove_temp(tmp: &Path) {
    match fs::remove_file(tmp) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(path = %tmp.display(), error = %err, "failed to remove temporary file"),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
