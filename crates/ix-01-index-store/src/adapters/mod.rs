//! # Storage Adapters
//!
//! - `memory` - `InMemoryKVStore` for unit tests
//! - `file` - `FileBackedKVStore`, a checksummed append-only batch log
//!
//! The RocksDB backend lives in `node-runtime` behind the `rocksdb` feature.

pub mod file;
pub mod memory;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;
