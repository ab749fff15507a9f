//! # Domain Entities
//!
//! Block headers and the explicit outcome values of decoding and scanning.

use shared_types::{display_hash256, reversed, Hash};

/// Size of a serialized block header.
pub const HEADER_LEN: usize = 80;

/// Byte range of the merkle root inside the header.
const MERKLE_FIELD: std::ops::Range<usize> = 36..68;

/// Raw 80-byte block header.
///
/// Layout: `version(4) | prev_hash(32) | merkle_root(32) | time(4) | bits(4) | nonce(4)`.
/// Only the merkle root is interpreted here.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockHeader([u8; HEADER_LEN]);

impl BlockHeader {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    /// Block identifier: double SHA-256 of the header, display order.
    pub fn block_hash(&self) -> Hash {
        display_hash256(&self.0)
    }

    /// The merkle root field in display order.
    pub fn merkle_root(&self) -> Hash {
        let mut field = [0u8; 32];
        field.copy_from_slice(&self.0[MERKLE_FIELD]);
        reversed(&field)
    }
}

impl std::fmt::Debug for BlockHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockHeader({})", hex::encode(self.block_hash()))
    }
}

/// Result of decoding one transaction at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// One transaction decoded.
    Complete { txid: Hash, consumed: usize },
    /// The bytes end before the transaction does. May succeed once more data
    /// is written.
    Incomplete,
    /// The bytes can never form a transaction.
    Malformed(String),
}

/// Why a block was not committed on this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StallReason {
    /// The record, or a transaction inside it, is not fully written yet.
    Incomplete,
    /// The record cannot be decoded.
    Malformed(String),
    /// Computed merkle root differs from the header.
    MerkleMismatch { expected: Hash, computed: Hash },
    /// The index rejected the batch.
    Commit(String),
}

impl std::fmt::Display for StallReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StallReason::Incomplete => write!(f, "record not completely written"),
            StallReason::Malformed(reason) => write!(f, "malformed record: {}", reason),
            StallReason::MerkleMismatch { expected, computed } => write!(
                f,
                "merkle mismatch: header {} computed {}",
                hex::encode(expected),
                hex::encode(computed)
            ),
            StallReason::Commit(message) => write!(f, "index commit failed: {}", message),
        }
    }
}

/// A block that passed verification and was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBlock {
    pub hash: Hash,
    pub record: shared_types::IndexRecord,
    pub tx_count: usize,
}

/// What one scan pass over the current file achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Moved on to the next numbered file.
    NextFile { file_number: u32 },
    /// Reached the end of the newest file; the caller should wait.
    Idle { blocks_indexed: usize },
    /// Stopped at a block that could not be committed; the caller should wait.
    Stalled {
        blocks_indexed: usize,
        reason: StallReason,
    },
}

impl PassOutcome {
    /// Whether the scan loop should sleep before the next pass.
    pub fn should_wait(&self) -> bool {
        !matches!(self, PassOutcome::NextFile { .. })
    }

    pub fn blocks_indexed(&self) -> usize {
        match self {
            PassOutcome::NextFile { .. } => 0,
            PassOutcome::Idle { blocks_indexed } | PassOutcome::Stalled { blocks_indexed, .. } => {
                *blocks_indexed
            }
        }
    }
}
