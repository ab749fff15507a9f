use std::path::PathBuf;

use ix_01_index_store::IndexStoreError;
use thiserror::Error;

/// Errors from the retrieval path.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Not 64 hex characters.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Object not found")]
    NotFound,

    #[error("Index error: {0}")]
    Index(#[from] IndexStoreError),

    #[error("Cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The node refused or could not be reached.
    #[error("{0}")]
    Relay(String),

    #[error("Broadcast is not configured")]
    RelayUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}
