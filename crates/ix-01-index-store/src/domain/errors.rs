//! # Domain Errors
//!
//! Errors raised by the key-value backends and by the typed `IndexStore`
//! facade on top of them.

use shared_types::{Hash, RecordError};
use std::fmt;

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KVStoreError {
    /// I/O error during read/write.
    IOError { message: String },
    /// Data corruption in the store.
    CorruptionError { message: String },
}

impl fmt::Display for KVStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KVStoreError::IOError { message } => write!(f, "KV store I/O error: {}", message),
            KVStoreError::CorruptionError { message } => {
                write!(f, "KV store corruption: {}", message)
            }
        }
    }
}

impl std::error::Error for KVStoreError {}

/// Errors surfaced by [`crate::IndexStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexStoreError {
    /// Backend failure.
    #[error(transparent)]
    Store(#[from] KVStoreError),

    /// A location value in `blocks`/`txs` is not a valid 12-byte record.
    #[error("Corrupt index record for {id}: {source}")]
    CorruptRecord {
        id: String,
        #[source]
        source: RecordError,
    },
}

impl IndexStoreError {
    pub(crate) fn corrupt(id: &Hash, source: RecordError) -> Self {
        IndexStoreError::CorruptRecord {
            id: shared_types::to_hex(id),
            source,
        }
    }
}
