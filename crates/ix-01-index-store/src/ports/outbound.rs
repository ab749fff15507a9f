//! # Outbound Ports (Driven Ports)
//!
//! The storage backend the index is written to.

use crate::domain::batch::BatchOperation;
use crate::domain::errors::KVStoreError;
use crate::domain::namespace::Namespace;

/// Abstract interface for namespaced key-value database operations.
///
/// Production: `RocksDbStore` (node-runtime/adapters/storage/rocksdb_adapter.rs)
/// Default: `FileBackedKVStore`
/// Testing: `InMemoryKVStore`
///
/// Methods take `&self`: the scan worker, the retrieval handlers and the
/// mempool flush share one handle, so each backend synchronizes internally.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, namespace: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Look `key` up in each of `namespaces` in order and return the first hit.
    ///
    /// All namespaces are read from one consistent view: a batch that moves a
    /// key between namespaces is seen entirely before or entirely after.
    fn get_first(
        &self,
        namespaces: &[Namespace],
        key: &[u8],
    ) -> Result<Option<(Namespace, Vec<u8>)>, KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, namespace: Namespace, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(namespace, key)?.is_some())
    }

    /// Execute an atomic batch write.
    ///
    /// ## Atomicity Guarantee (INVARIANT-1, INVARIANT-2)
    ///
    /// Either ALL operations in the batch are applied, or NONE are, and no
    /// concurrent `get` observes an intermediate state.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Number of keys in a namespace.
    fn count(&self, namespace: Namespace) -> Result<usize, KVStoreError>;
}
