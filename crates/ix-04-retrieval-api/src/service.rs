//! # Retrieval Service
//!
//! Resolves identifiers through the index and serves byte windows of the
//! objects they name. Read-only: nothing here writes to the index.

use std::sync::Arc;

use ix_01_index_store::{IndexStore, ObjectLocation};
use shared_types::{parse_hash, Hash};

use crate::domain::chunk::chunk_window;
use crate::domain::errors::RetrievalError;
use crate::domain::types::ObjectInfo;
use crate::ports::outbound::ObjectFileReader;

#[derive(Clone)]
pub struct RetrievalService {
    store: IndexStore,
    files: Arc<dyn ObjectFileReader>,
}

/// Parse a query identifier: 64 hex characters.
pub fn parse_identifier(input: &str) -> Result<Hash, RetrievalError> {
    parse_hash(input).map_err(|e| RetrievalError::InvalidIdentifier(e.to_string()))
}

impl RetrievalService {
    pub fn new(store: IndexStore, files: Arc<dyn ObjectFileReader>) -> Self {
        Self { store, files }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Size and pending flag. Unknown identifiers report size zero.
    pub fn info(&self, id: &Hash) -> Result<ObjectInfo, RetrievalError> {
        Ok(match self.store.locate(id)? {
            Some(location) => ObjectInfo {
                size: location.size(),
                pending: location.is_pending(),
            },
            None => ObjectInfo::UNKNOWN,
        })
    }

    /// Bytes of chunk `index` of size `chunk_size`.
    ///
    /// The last chunk may be short; chunks past the end are empty.
    pub fn chunk(&self, id: &Hash, index: u64, chunk_size: u64) -> Result<Vec<u8>, RetrievalError> {
        let location = self.store.locate(id)?.ok_or(RetrievalError::NotFound)?;
        let (start, len) = chunk_window(location.size(), index, chunk_size);
        if len == 0 {
            return Ok(Vec::new());
        }

        match location {
            ObjectLocation::Confirmed(record) => {
                let len = usize::try_from(len)
                    .map_err(|e| RetrievalError::Internal(e.to_string()))?;
                self.files
                    .read_at(record.file_number, u64::from(record.offset) + start, len)
            }
            ObjectLocation::Pending(raw) => {
                // Both bounds are within `raw`, which is in memory.
                let start = start as usize;
                Ok(raw[start..start + len as usize].to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ix_01_index_store::{IndexBatch, Namespace};
    use shared_types::IndexRecord;
    use std::collections::HashMap;

    /// Block files held in memory.
    #[derive(Default)]
    struct MemFiles(HashMap<u32, Vec<u8>>);

    impl ObjectFileReader for MemFiles {
        fn read_at(&self, file_number: u32, offset: u64, len: usize) -> Result<Vec<u8>, RetrievalError> {
            let data = self.0.get(&file_number).ok_or(RetrievalError::NotFound)?;
            let start = offset as usize;
            data.get(start..start + len)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| RetrievalError::Internal("short file".into()))
        }
    }

    const BLOCK: Hash = [0xb1; 32];
    const TX: Hash = [0x71; 32];
    const PENDING: Hash = [0x91; 32];

    fn service() -> RetrievalService {
        let store = IndexStore::in_memory();
        let mut batch = IndexBatch::new();
        batch.put_record(Namespace::Blocks, &BLOCK, IndexRecord::new(0, 8, 10));
        batch.put_record(Namespace::Txs, &TX, IndexRecord::new(0, 12, 3));
        batch.put_pending(&PENDING, b"pending-bytes".to_vec());
        store.commit(batch).unwrap();

        let mut files = MemFiles::default();
        files.0.insert(0, (0u8..32).collect());
        RetrievalService::new(store, Arc::new(files))
    }

    #[test]
    fn test_info() {
        let svc = service();
        assert_eq!(svc.info(&BLOCK).unwrap(), ObjectInfo { size: 10, pending: false });
        assert_eq!(svc.info(&TX).unwrap(), ObjectInfo { size: 3, pending: false });
        assert_eq!(svc.info(&PENDING).unwrap(), ObjectInfo { size: 13, pending: true });
        assert_eq!(svc.info(&[0u8; 32]).unwrap(), ObjectInfo::UNKNOWN);
    }

    #[test]
    fn test_chunks_of_confirmed_object() {
        let svc = service();
        assert_eq!(svc.chunk(&BLOCK, 0, 4).unwrap(), vec![8, 9, 10, 11]);
        assert_eq!(svc.chunk(&BLOCK, 1, 4).unwrap(), vec![12, 13, 14, 15]);
        assert_eq!(svc.chunk(&BLOCK, 2, 4).unwrap(), vec![16, 17]);
        assert!(svc.chunk(&BLOCK, 3, 4).unwrap().is_empty());
        assert_eq!(svc.chunk(&TX, 0, 1024).unwrap(), vec![12, 13, 14]);
    }

    #[test]
    fn test_chunks_of_pending_object() {
        let svc = service();
        assert_eq!(svc.chunk(&PENDING, 0, 7).unwrap(), b"pending".to_vec());
        assert_eq!(svc.chunk(&PENDING, 1, 7).unwrap(), b"-bytes".to_vec());
        assert!(svc.chunk(&PENDING, u64::MAX, u64::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_chunk_is_not_found() {
        assert!(matches!(
            service().chunk(&[0u8; 32], 0, 4),
            Err(RetrievalError::NotFound)
        ));
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier(&"b1".repeat(32)).unwrap(), BLOCK);
        assert!(matches!(
            parse_identifier("zz"),
            Err(RetrievalError::InvalidIdentifier(_))
        ));
        assert!(parse_identifier(&"ab".repeat(31)).is_err());
    }
}
