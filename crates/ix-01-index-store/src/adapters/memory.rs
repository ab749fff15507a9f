use crate::domain::batch::BatchOperation;
use crate::domain::errors::KVStoreError;
use crate::domain::namespace::Namespace;
use crate::ports::outbound::KeyValueStore;
use parking_lot::RwLock;
use std::collections::HashMap;

type Table = HashMap<(Namespace, Vec<u8>), Vec<u8>>;

/// In-memory key-value store for unit tests.
///
/// A batch is applied under one write lock, so readers see it whole or not at
/// all.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: RwLock<Table>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, namespace: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(&(namespace, key.to_vec())).cloned())
    }

    fn get_first(
        &self,
        namespaces: &[Namespace],
        key: &[u8],
    ) -> Result<Option<(Namespace, Vec<u8>)>, KVStoreError> {
        let data = self.data.read();
        Ok(namespaces.iter().find_map(|namespace| {
            data.get(&(*namespace, key.to_vec()))
                .map(|value| (*namespace, value.clone()))
        }))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut data = self.data.write();
        for op in operations {
            match op {
                BatchOperation::Put {
                    namespace,
                    key,
                    value,
                } => {
                    data.insert((namespace, key), value);
                }
                BatchOperation::Delete { namespace, key } => {
                    data.remove(&(namespace, key));
                }
            }
        }
        Ok(())
    }

    fn count(&self, namespace: Namespace) -> Result<usize, KVStoreError> {
        Ok(self
            .data
            .read()
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .count())
    }
}
