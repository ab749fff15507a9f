//! # Index Store (ix-01)
//!
//! The persistence layer behind the indexer. Every object location, every
//! pending mempool transaction and the internal metadata live here.
//!
//! ## Namespaces
//!
//! | Namespace | Key | Value |
//! |-----------|-----|-------|
//! | `blocks` | block hash (display order) | 12-byte `IndexRecord` |
//! | `txs` | txid (display order) | 12-byte `IndexRecord` |
//! | `mempool` | txid (display order) | raw transaction bytes |
//! | `metadata` | ASCII name | free-form |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Atomic Batches | A batch spanning several namespaces lands whole or not at all |
//! | 2 | Snapshot Reads | Readers never observe a partially applied batch |
//! | 3 | Exclusive Pending | After a confirming batch, a txid is in `txs` or `mempool`, never both |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - namespaces, write batches, errors
//! - `ports/` - the `KeyValueStore` driven port
//! - `adapters/` - in-memory and file-backed stores (RocksDB lives in node-runtime)
//! - `service.rs` - `IndexStore`, the typed facade used by the other subsystems

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
pub use domain::batch::{BatchOperation, IndexBatch};
pub use domain::errors::{IndexStoreError, KVStoreError};
pub use domain::namespace::Namespace;
pub use ports::outbound::KeyValueStore;
pub use service::{IndexStore, ObjectLocation};
