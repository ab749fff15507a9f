//! # Block Scanner (ix-02)
//!
//! Indexes the node's append-only block files.
//!
//! Each `blkNNNNN.dat` file is a run of `magic | length | header | tx_count | txs`
//! records. The scanner frames records, decodes every transaction, checks the
//! merkle root, and commits the block and transaction locations as one atomic
//! batch. Progress is kept in a durable checkpoint so a restart resumes where
//! the last pass left off.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Checkpoint On Boundary | The checkpoint never points inside a record |
//! | 2 | Forward-Only Persistence | The checkpoint is saved only when it moves |
//! | 3 | Whole Blocks | A block's record and its txs' records commit together |
//! | 4 | Verified Blocks | Nothing is indexed unless its merkle root matches (or is exempt) |
//! | 5 | Growing Files | A record that is not fully written is retried, never indexed |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - reader, framer, merkle verifier, outcomes
//! - `ports/` - decoder, checkpoint store, pending source
//! - `adapters/` - legacy decoder, checkpoint files, block file access
//! - `service.rs` - `BlockScanner`, the scan state machine

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{BlockFiles, InMemoryCheckpointStore, JsonFileCheckpointStore, LegacyTransactionDecoder};
pub use domain::entities::{BlockHeader, DecodeOutcome, IndexedBlock, PassOutcome, StallReason};
pub use domain::errors::ScanError;
pub use domain::framer::{Magic, RecordFramer, MAX_RESYNC_ATTEMPTS};
pub use domain::merkle::{merkle_root, verify as verify_merkle, MerkleCheck, MERKLE_EXEMPT_ROOT};
pub use domain::reader::{ByteOrder, ByteReader, ReadError};
pub use domain::value_objects::ScannerConfig;
pub use ports::outbound::{CheckpointStore, PendingSource, TransactionDecoder};
pub use service::BlockScanner;
