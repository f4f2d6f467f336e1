//! Low-level primitives for building the store.

/// Byte-level encoding and decoding.
///
/// Fixed-width integers, presence flags, and length-prefixed strings over
/// any std stream.
pub mod bytes;
