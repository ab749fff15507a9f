//! # Domain Errors
//!
//! Failures that stop the scanner outright. Per-block problems (truncated or
//! malformed records, merkle mismatches) are not errors: they surface as
//! [`StallReason`](super::entities::StallReason) and are retried.

use std::path::PathBuf;

use ix_01_index_store::IndexStoreError;
use thiserror::Error;

use super::reader::ReadError;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The data directory or a block file could not be read.
    #[error("Block file error at {path}: {source}")]
    BlockFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The first block file is shorter than a magic marker.
    #[error("Cannot read magic marker from {0}")]
    MissingMagic(PathBuf),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Offsets in the index are 32-bit.
    #[error("Offset {offset} in file {file_number} does not fit in 32 bits")]
    OffsetOverflow { file_number: u32, offset: u64 },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Index error: {0}")]
    Index(#[from] IndexStoreError),
}

impl ScanError {
    pub fn block_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::BlockFile {
            path: path.into(),
            source,
        }
    }
}
