//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identifiers**: `Hash`
//! - **Index**: `IndexRecord` (where an object lives in the block files)
//! - **Scan Progress**: `ScanCheckpoint`
//! - **Mempool**: `PendingTransaction`

use serde::{Deserialize, Serialize};

use crate::errors::RecordError;

/// A 32-byte identifier in display order (block hash or transaction id).
pub type Hash = [u8; 32];

/// Byte window of one block or transaction inside the numbered block files.
///
/// Encoded as `file_number || offset || length`, each a little-endian `u32`.
/// Records are immutable once written: the block files are append-only, so a
/// committed location never moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Number of the `blkNNNNN.dat` file holding the object.
    pub file_number: u32,
    /// Offset of the first byte of the object within the file.
    pub offset: u32,
    /// Size of the object in bytes.
    pub length: u32,
}

impl IndexRecord {
    /// Size of the fixed encoding.
    pub const ENCODED_LEN: usize = 12;

    pub fn new(file_number: u32, offset: u32, length: u32) -> Self {
        Self {
            file_number,
            offset,
            length,
        }
    }

    /// Encode as the 12-byte little-endian value stored in the index.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..4].copy_from_slice(&self.file_number.to_le_bytes());
        out[4..8].copy_from_slice(&self.offset.to_le_bytes());
        out[8..12].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    /// Decode a stored value. Anything other than exactly 12 bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        let raw: [u8; Self::ENCODED_LEN] =
            bytes.try_into().map_err(|_| RecordError::InvalidLength {
                expected: Self::ENCODED_LEN,
                actual: bytes.len(),
            })?;

        let word = |i: usize| u32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        Ok(Self {
            file_number: word(0),
            offset: word(4),
            length: word(8),
        })
    }

    /// One past the last byte of the window, widened so it cannot overflow.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }
}

impl std::fmt::Display for IndexRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.file_number, self.offset, self.length)
    }
}

/// Durable scan cursor.
///
/// `byte_offset` is always either the start of a committed record or the
/// first byte not yet known to be a complete record; never mid-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanCheckpoint {
    pub file_number: u32,
    pub byte_offset: u32,
}

impl ScanCheckpoint {
    pub fn new(file_number: u32, byte_offset: u32) -> Self {
        Self {
            file_number,
            byte_offset,
        }
    }

    /// Cursor at the start of the following file.
    pub fn next_file(&self) -> Self {
        Self {
            file_number: self.file_number + 1,
            byte_offset: 0,
        }
    }
}

/// An unconfirmed transaction received from the node's push feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub txid: Hash,
    pub raw: Vec<u8>,
}
