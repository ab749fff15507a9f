//! # Index Store Service
//!
//! Typed facade over a [`KeyValueStore`]. Decodes location records and
//! implements the lookup order shared by every reader: confirmed objects
//! (`blocks`, then `txs`) before pending ones (`mempool`).

use std::sync::Arc;

use shared_types::{Hash, IndexRecord};

use crate::adapters::InMemoryKVStore;
use crate::domain::batch::IndexBatch;
use crate::domain::errors::IndexStoreError;
use crate::domain::namespace::Namespace;
use crate::ports::outbound::KeyValueStore;

/// Where the bytes of an object can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectLocation {
    /// Indexed in a block file.
    Confirmed(IndexRecord),
    /// Held in the mempool namespace.
    Pending(Vec<u8>),
}

impl ObjectLocation {
    /// Total size of the object in bytes.
    pub fn size(&self) -> u64 {
        match self {
            ObjectLocation::Confirmed(record) => u64::from(record.length),
            ObjectLocation::Pending(raw) => raw.len() as u64,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ObjectLocation::Pending(_))
    }
}

const CONFIRMED: [Namespace; 2] = [Namespace::Blocks, Namespace::Txs];
const LOOKUP_ORDER: [Namespace; 3] = [Namespace::Blocks, Namespace::Txs, Namespace::Mempool];

fn decode_record(id: &Hash, raw: &[u8]) -> Result<IndexRecord, IndexStoreError> {
    IndexRecord::from_bytes(raw).map_err(|e| IndexStoreError::corrupt(id, e))
}

/// Shared handle to the index. Cheap to clone.
#[derive(Clone)]
pub struct IndexStore {
    kv: Arc<dyn KeyValueStore>,
}

impl IndexStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Store backed by [`InMemoryKVStore`], for tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKVStore::new()))
    }

    fn record_in(&self, namespace: Namespace, id: &Hash) -> Result<Option<IndexRecord>, IndexStoreError> {
        match self.kv.get(namespace, id)? {
            Some(raw) => decode_record(id, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn block_record(&self, id: &Hash) -> Result<Option<IndexRecord>, IndexStoreError> {
        self.record_in(Namespace::Blocks, id)
    }

    pub fn tx_record(&self, id: &Hash) -> Result<Option<IndexRecord>, IndexStoreError> {
        self.record_in(Namespace::Txs, id)
    }

    /// Location of a confirmed block or transaction.
    pub fn record(&self, id: &Hash) -> Result<Option<IndexRecord>, IndexStoreError> {
        match self.kv.get_first(&CONFIRMED, id)? {
            Some((_, raw)) => decode_record(id, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Raw bytes of a pending transaction.
    pub fn pending(&self, txid: &Hash) -> Result<Option<Vec<u8>>, IndexStoreError> {
        Ok(self.kv.get(Namespace::Mempool, txid)?)
    }

    /// Resolve an identifier, confirmed namespaces first.
    ///
    /// One backend read covers all three namespaces, so a transaction being
    /// confirmed concurrently is found either pending or confirmed.
    pub fn locate(&self, id: &Hash) -> Result<Option<ObjectLocation>, IndexStoreError> {
        match self.kv.get_first(&LOOKUP_ORDER, id)? {
            Some((Namespace::Mempool, raw)) => Ok(Some(ObjectLocation::Pending(raw))),
            Some((_, raw)) => decode_record(id, &raw).map(|r| Some(ObjectLocation::Confirmed(r))),
            None => Ok(None),
        }
    }

    pub fn is_confirmed_tx(&self, txid: &Hash) -> Result<bool, IndexStoreError> {
        Ok(self.kv.exists(Namespace::Txs, txid)?)
    }

    /// Apply a batch atomically. Empty batches are a no-op.
    pub fn commit(&self, batch: IndexBatch) -> Result<(), IndexStoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.kv.atomic_batch_write(batch.into_operations())?;
        Ok(())
    }

    pub fn count(&self, namespace: Namespace) -> Result<usize, IndexStoreError> {
        Ok(self.kv.count(namespace)?)
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }
}
