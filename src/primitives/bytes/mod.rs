#![forbid(unsafe_code)]
//! Fixed-width little-endian integers and length-prefixed strings.
//!
//! Every persisted structure in the store is built from three primitives:
//! a raw byte (colours and presence flags), a 4-byte little-endian `i32`,
//! and a string encoded as an `i32` byte length followed by the raw UTF-8
//! bytes with no terminator. [`Writer`] and [`Reader`] wrap any std stream
//! and count the bytes that pass through them.
//!
//! Decoding never trusts the stream: a short read, a negative or oversized
//! length prefix, or invalid UTF-8 all surface as
//! [`StoreError::CorruptData`].

use std::fmt;
use std::io::{self, Read, Write};

use crate::types::{Result, StoreError};

const I32_LEN: usize = core::mem::size_of::<i32>();

/// Default ceiling on a single decoded string (16 MiB).
pub const DEFAULT_MAX_STRING_LEN: usize = 16 * 1024 * 1024;
/// Default ceiling on node nesting while decoding a tree.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Bounds applied while decoding untrusted streams. A [`Writer`] applies the
/// same bounds so it never produces a stream its matching reader rejects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest string length prefix accepted, in bytes.
    pub max_string_len: usize,
    /// Deepest node nesting accepted when rebuilding a tree.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Encoding side of the codec.
pub struct Writer<W: Write> {
    inner: W,
    written: u64,
    limits: DecodeLimits,
}

impl<W: Write> Writer<W> {
    /// Wraps a stream using [`DecodeLimits::default`].
    pub fn new(inner: W) -> Self {
        Self::with_limits(inner, DecodeLimits::default())
    }

    /// Wraps a stream that refuses to write anything `limits` would reject
    /// on decode.
    pub fn with_limits(inner: W, limits: DecodeLimits) -> Self {
        Self {
            inner,
            written: 0,
            limits,
        }
    }

    /// Writes one raw byte.
    pub fn put_u8(&mut self, v: u8) -> Result<()> {
        self.put_raw(&[v])
    }

    /// Writes a presence flag as a single `0`/`1` byte.
    pub fn put_flag(&mut self, v: bool) -> Result<()> {
        self.put_u8(u8::from(v))
    }

    /// Writes a 4-byte little-endian signed integer.
    pub fn put_i32(&mut self, v: i32) -> Result<()> {
        self.put_raw(&v.to_le_bytes())
    }

    /// Writes an `i32` length prefix followed by the string bytes. Strings
    /// longer than the writer's `max_string_len` are rejected before any byte
    /// is written.
    pub fn put_str(&mut self, s: &str) -> Result<()> {
        if s.len() > self.limits.max_string_len {
            return Err(StoreError::Invalid(format!(
                "string of {} bytes exceeds limit {}",
                s.len(),
                self.limits.max_string_len
            )));
        }
        let len = i32::try_from(s.len()).map_err(|_| {
            StoreError::Invalid(format!(
                "string of {} bytes exceeds the i32 length prefix",
                s.len()
            ))
        })?;
        self.put_i32(len)?;
        self.put_raw(s.as_bytes())
    }

    /// Number of bytes written through this writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// The bounds this writer enforces.
    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// Flushes the wrapped stream.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Returns a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps the stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

/// Decoding side of the codec.
pub struct Reader<R: Read> {
    inner: R,
    read: u64,
    limits: DecodeLimits,
}

impl<R: Read> Reader<R> {
    /// Wraps a stream using [`DecodeLimits::default`].
    pub fn new(inner: R) -> Self {
        Self::with_limits(inner, DecodeLimits::default())
    }

    /// Wraps a stream with explicit decode bounds.
    pub fn with_limits(inner: R, limits: DecodeLimits) -> Self {
        Self {
            inner,
            read: 0,
            limits,
        }
    }

    /// Reads one raw byte.
    pub fn get_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.get_raw(&mut buf)?;
        Ok(buf[0])
    }

    /// Reads a presence flag; any nonzero byte is `true`.
    pub fn get_flag(&mut self) -> Result<bool> {
        Ok(self.get_u8()? != 0)
    }

    /// Reads a 4-byte little-endian signed integer.
    pub fn get_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; I32_LEN];
        self.get_raw(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Reads a length-prefixed string.
    ///
    /// The body must be valid UTF-8. The on-disk format itself only says
    /// "`length` raw bytes"; this reader is stricter on purpose and reports
    /// non-UTF-8 bodies as corrupt data, since every record type stores
    /// text.
    pub fn get_string(&mut self) -> Result<String> {
        let at = self.read;
        let len = self.get_i32()?;
        let len = usize::try_from(len).map_err(|_| {
            StoreError::corrupt(format!("negative string length {len} at offset {at}"))
        })?;
        if len > self.limits.max_string_len {
            return Err(StoreError::corrupt(format!(
                "string length {len} at offset {at} exceeds limit {}",
                self.limits.max_string_len
            )));
        }
        let mut body = Vec::with_capacity(len.min(64 * 1024));
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut body)?;
        self.read += got as u64;
        if got < len {
            return Err(StoreError::corrupt(format!(
                "string at offset {at} truncated: need {len} bytes, have {got}"
            )));
        }
        String::from_utf8(body)
            .map_err(|_| StoreError::corrupt(format!("string at offset {at} is not valid UTF-8")))
    }

    /// Succeeds only if the stream has no bytes left.
    pub fn expect_end(&mut self) -> Result<()> {
        let mut probe = [0u8; 1];
        loop {
            match self.inner.read(&mut probe) {
                Ok(0) => return Ok(()),
                Ok(_) => {
                    return Err(StoreError::corrupt(format!(
                        "trailing bytes after offset {}",
                        self.read
                    )))
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Number of bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// The bounds this reader enforces.
    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// Unwraps the stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn get_raw(&mut self, dst: &mut [u8]) -> Result<()> {
        self.inner.read_exact(dst)?;
        self.read += dst.len() as u64;
        Ok(())
    }
}

impl<W: Write> fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("written", &self.written)
            .field("limits", &self.limits)
            .finish()
    }
}

impl<R: Read> fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("read", &self.read)
            .field("limits", &self.limits)
            .finish()
    }
}
