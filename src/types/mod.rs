#![forbid(unsafe_code)]
//! Error type shared by every layer of the store.

use std::io;

use thiserror::Error;

/// Errors surfaced by codec, tree, and database operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying stream failure other than a premature end of data.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    /// The persisted stream is truncated or structurally malformed.
    #[error("corrupt data: {0}")]
    CorruptData(String),
    /// An in-memory tree violates one of the red-black invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The caller supplied a value that cannot be stored or encoded.
    #[error("invalid argument: {0}")]
    Invalid(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            StoreError::CorruptData(format!("unexpected end of data ({err})"))
        } else {
            StoreError::Io(err)
        }
    }
}

impl StoreError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        StoreError::CorruptData(msg.into())
    }

    /// Returns true when the error reports malformed persisted data.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::CorruptData(_))
    }
}
