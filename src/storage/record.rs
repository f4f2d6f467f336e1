//! The capability contract every storable entity implements.

use std::cmp::Ordering;
use std::io::{Read, Write};

use crate::primitives::bytes::{Reader, Writer};
use crate::types::Result;

/// An entity that can live in a [`Tree`](crate::storage::llrb::Tree).
///
/// A tree holds exactly one concrete `Record` type for its whole life, so
/// `compare` only ever sees two values of the same variant. Implementations
/// may offer key-only constructors that populate just the fields `compare`
/// inspects; such probes are used for lookups and erasure.
pub trait Record {
    /// Three-way comparison. Two records comparing `Equal` are the same
    /// logical entity.
    fn compare(&self, other: &Self) -> Ordering;

    /// A blank instance of this record's concrete type, ready to be filled
    /// by [`Record::load`]. Contents are irrelevant.
    fn blank(&self) -> Self
    where
        Self: Sized;

    /// Serializes this record's own fields. The tree writes its structural
    /// metadata around this payload.
    fn save<W: Write>(&self, out: &mut Writer<W>) -> Result<()>;

    /// Overwrites this record's fields from the stream.
    fn load<R: Read>(&mut self, src: &mut Reader<R>) -> Result<()>;
}

/// Manufactures blank records of one type while a tree is being rebuilt.
pub trait RecordFactory<T> {
    /// Produces an empty record of the stored type.
    fn make(&self) -> T;
}

impl<T, F> RecordFactory<T> for F
where
    F: Fn() -> T,
{
    fn make(&self) -> T {
        self()
    }
}

/// A factory backed by an already-typed record; only its type matters.
#[derive(Debug, Clone, Copy)]
pub struct Witness<'a, T>(pub &'a T);

impl<T: Record> RecordFactory<T> for Witness<'_, T> {
    fn make(&self) -> T {
        self.0.blank()
    }
}
