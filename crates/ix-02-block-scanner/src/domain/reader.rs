//! # Binary Stream Reader
//!
//! Fixed-width and compact-size integer decoding over any `Read`.
//!
//! End of data is not an error for [`ByteReader::read_bytes`]; it is for the
//! integer readers, which report [`ReadError::Truncated`] instead of
//! panicking, so callers can treat "not written yet" as a normal outcome.

use std::io::Read;

use thiserror::Error;

/// Byte order of a fixed-width integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Errors from [`ByteReader`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// Fewer bytes were available than the field needs.
    #[error("Truncated read: wanted {wanted} bytes, got {got}")]
    Truncated { wanted: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    pub fn is_truncated(&self) -> bool {
        matches!(self, ReadError::Truncated { .. })
    }
}

/// Forward-only cursor that counts consumed bytes.
pub struct ByteReader<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    /// Read up to `n` bytes. Returns fewer only at end of data.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        let mut buf = Vec::new();
        (&mut self.inner).take(n as u64).read_to_end(&mut buf)?;
        self.consumed += buf.len() as u64;
        Ok(buf)
    }

    /// Read exactly `n` bytes.
    pub fn read_exact_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        let buf = self.read_bytes(n)?;
        if buf.len() < n {
            return Err(ReadError::Truncated {
                wanted: n,
                got: buf.len(),
            });
        }
        Ok(buf)
    }

    /// Read an unsigned integer of `width` bytes (at most 8).
    pub fn read_uint(&mut self, width: usize, order: ByteOrder) -> Result<u64, ReadError> {
        debug_assert!(width <= 8);
        let bytes = self.read_exact_bytes(width)?;
        let mut value = 0u64;
        match order {
            ByteOrder::Little => {
                for b in bytes.iter().rev() {
                    value = (value << 8) | u64::from(*b);
                }
            }
            ByteOrder::Big => {
                for b in &bytes {
                    value = (value << 8) | u64::from(*b);
                }
            }
        }
        Ok(value)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, ReadError> {
        Ok(self.read_uint(4, ByteOrder::Little)? as u32)
    }

    /// Compact-size integer: one prefix byte, then 0/2/4/8 little-endian bytes.
    pub fn read_varint(&mut self) -> Result<u64, ReadError> {
        let prefix = self.read_exact_bytes(1)?[0];
        match prefix {
            0..=0xfc => Ok(u64::from(prefix)),
            0xfd => self.read_uint(2, ByteOrder::Little),
            0xfe => self.read_uint(4, ByteOrder::Little),
            0xff => self.read_uint(8, ByteOrder::Little),
        }
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}
