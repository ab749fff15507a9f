//! # Write Batches
//!
//! A batch is an ordered list of puts and deletes across any namespaces. The
//! scanner builds one batch per block; the mempool flush builds one per drain.
//! Backends apply a batch atomically (INVARIANT-1).

use shared_types::{Hash, IndexRecord};

use super::namespace::Namespace;

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put {
        namespace: Namespace,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete { namespace: Namespace, key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(namespace: Namespace, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            namespace,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(namespace: Namespace, key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete {
            namespace,
            key: key.into(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            BatchOperation::Put { namespace, .. } | BatchOperation::Delete { namespace, .. } => {
                *namespace
            }
        }
    }
}

/// Builder for one atomic commit.
///
/// Dropping an `IndexBatch` without committing it discards every staged
/// operation; nothing reaches the store until `IndexStore::commit`.
#[derive(Debug, Default, Clone)]
pub struct IndexBatch {
    operations: Vec<BatchOperation>,
}

impl IndexBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the location of a block or transaction.
    pub fn put_record(&mut self, namespace: Namespace, id: &Hash, record: IndexRecord) {
        self.operations
            .push(BatchOperation::put(namespace, id.to_vec(), record.to_bytes().to_vec()));
    }

    /// Stage a pending transaction body.
    pub fn put_pending(&mut self, txid: &Hash, raw: Vec<u8>) {
        self.operations
            .push(BatchOperation::put(Namespace::Mempool, txid.to_vec(), raw));
    }

    /// Stage removal of a pending transaction (confirmed in a block).
    pub fn evict_pending(&mut self, txid: &Hash) {
        self.operations
            .push(BatchOperation::delete(Namespace::Mempool, txid.to_vec()));
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_preserves_order() {
        let id = [7u8; 32];
        let mut batch = IndexBatch::new();
        batch.put_record(Namespace::Blocks, &id, IndexRecord::new(0, 8, 285));
        batch.put_record(Namespace::Txs, &id, IndexRecord::new(0, 89, 204));
        batch.evict_pending(&id);

        let ops = batch.into_operations();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].namespace(), Namespace::Blocks);
        assert_eq!(ops[1].namespace(), Namespace::Txs);
        assert_eq!(
            ops[2],
            BatchOperation::Delete {
                namespace: Namespace::Mempool,
                key: id.to_vec()
            }
        );
    }
}
