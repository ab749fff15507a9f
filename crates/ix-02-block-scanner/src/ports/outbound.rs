//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the scan state machine depends on.

use shared_types::{PendingTransaction, ScanCheckpoint};

use crate::domain::entities::DecodeOutcome;
use crate::domain::errors::ScanError;

/// Decodes one transaction from the start of `input`.
///
/// Must be deterministic: the same bytes always yield the same outcome, and a
/// `Complete` result reports exactly how many bytes the transaction spans.
pub trait TransactionDecoder: Send + Sync {
    fn decode(&self, input: &[u8]) -> DecodeOutcome;
}

/// Durable storage for the scan cursor.
///
/// Production: `JsonFileCheckpointStore`
/// Testing: `InMemoryCheckpointStore`
pub trait CheckpointStore: Send + Sync {
    /// Stored cursor, or the origin if none was saved yet.
    fn load(&self) -> Result<ScanCheckpoint, ScanError>;

    /// Replace the stored cursor.
    fn save(&self, checkpoint: &ScanCheckpoint) -> Result<(), ScanError>;
}

/// Queue of unconfirmed transactions awaiting a flush into the index.
///
/// Implemented by the mempool cache's pending queue.
pub trait PendingSource: Send + Sync {
    /// Take everything currently queued without blocking.
    fn drain(&self) -> Vec<PendingTransaction>;
}
