//! Outbound (Driven) ports for the retrieval service.

use async_trait::async_trait;

use crate::domain::errors::RetrievalError;

/// Random-access reads from the numbered block files.
///
/// Production: `FsObjectReader`
pub trait ObjectFileReader: Send + Sync {
    /// Read exactly `len` bytes at `offset` of file `file_number`.
    fn read_at(&self, file_number: u32, offset: u64, len: usize) -> Result<Vec<u8>, RetrievalError>;
}

/// Submits raw transactions to the node.
///
/// Production: `NodeRpcClient` (node-runtime)
#[async_trait]
pub trait TransactionRelay: Send + Sync {
    /// Relay a hex-encoded transaction; returns the txid the node reports.
    async fn broadcast(&self, raw_hex: &str) -> Result<String, RetrievalError>;
}
