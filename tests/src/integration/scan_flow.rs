//! # Scan Flow
//!
//! Block files on disk -> scanner -> file-backed index -> retrieval, with the
//! scanner restarted between passes the way a process restart would.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use ix_01_index_store::{FileBackedKVStore, IndexStore, Namespace};
    use ix_02_block_scanner::test_utils::{legacy_tx, TestBlock};
    use ix_02_block_scanner::{
        BlockFiles, BlockScanner, JsonFileCheckpointStore, LegacyTransactionDecoder, PassOutcome,
        ScannerConfig, StallReason,
    };
    use ix_04_retrieval_api::{FsObjectReader, ObjectInfo, RetrievalService};
    use shared_types::ScanCheckpoint;

    use crate::integration::fixtures::{append, block_files, MAGIC};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Open the on-disk index and checkpoint under `root`, as a fresh process would.
    fn open_store(root: &Path) -> IndexStore {
        let kv = FileBackedKVStore::open(root.join("index").join("index.log"), false).unwrap();
        IndexStore::new(Arc::new(kv))
    }

    fn scanner(root: &Path, files: &BlockFiles, store: &IndexStore) -> BlockScanner {
        BlockScanner::new(
            files.clone(),
            MAGIC,
            store.clone(),
            Arc::new(LegacyTransactionDecoder::new()),
            Arc::new(JsonFileCheckpointStore::new(
                root.join("index").join("checkpoint.json"),
            )),
            ScannerConfig::default(),
        )
        .unwrap()
    }

    fn saved_checkpoint(root: &Path) -> ScanCheckpoint {
        let bytes = std::fs::read(root.join("index").join("checkpoint.json")).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[test]
    fn test_two_records_are_retrievable() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        let a = TestBlock::new(&[legacy_tx(1), legacy_tx(2), legacy_tx(3)], 1);
        let b = TestBlock::new(&[legacy_tx(4)], 2);
        let rec_a = a.record(MAGIC);
        let rec_b = b.record(MAGIC);
        append(&files, 0, &rec_a);
        append(&files, 0, &rec_b);

        let store = open_store(root.path());
        let outcome = scanner(root.path(), &files, &store).run_pass().unwrap();
        assert_eq!(outcome, PassOutcome::Idle { blocks_indexed: 2 });
        assert_eq!(
            saved_checkpoint(root.path()),
            ScanCheckpoint::new(0, (rec_a.len() + rec_b.len()) as u32)
        );

        let service = RetrievalService::new(store, Arc::new(FsObjectReader::new(files)));
        assert_eq!(
            service.info(&a.hash).unwrap(),
            ObjectInfo {
                size: a.payload.len() as u64,
                pending: false
            }
        );
        assert_eq!(service.info(&b.hash).unwrap().size, b.payload.len() as u64);

        // Whole block in one chunk, then a transaction split in two
        assert_eq!(service.chunk(&b.hash, 0, 1 << 20).unwrap(), b.payload);
        let tx = legacy_tx(2);
        let half = (tx.len() as u64 + 1) / 2;
        let mut joined = service.chunk(&a.txids[1], 0, half).unwrap();
        joined.extend(service.chunk(&a.txids[1], 1, half).unwrap());
        assert_eq!(joined, tx);
        assert!(service.chunk(&a.txids[1], 2, half).unwrap().is_empty());
    }

    #[test]
    fn test_restart_resumes_from_checkpoint() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        let a = TestBlock::new(&[legacy_tx(1)], 1);
        let b = TestBlock::new(&[legacy_tx(2), legacy_tx(3)], 2);
        append(&files, 0, &a.record(MAGIC));

        {
            let store = open_store(root.path());
            let outcome = scanner(root.path(), &files, &store).run_pass().unwrap();
            assert_eq!(outcome.blocks_indexed(), 1);
        }

        append(&files, 0, &b.record(MAGIC));

        let store = open_store(root.path());
        let outcome = scanner(root.path(), &files, &store).run_pass().unwrap();
        assert_eq!(outcome, PassOutcome::Idle { blocks_indexed: 1 });
        assert!(store.block_record(&a.hash).unwrap().is_some());
        assert!(store.block_record(&b.hash).unwrap().is_some());
        assert_eq!(store.count(Namespace::Blocks).unwrap(), 2);
        assert_eq!(store.count(Namespace::Txs).unwrap(), 3);
    }

    #[test]
    fn test_truncated_tail_is_indexed_once_complete() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        let a = TestBlock::new(&[legacy_tx(1)], 1);
        let b = TestBlock::new(&[legacy_tx(2)], 2);
        let rec_a = a.record(MAGIC);
        let rec_b = b.record(MAGIC);
        let (head, tail) = rec_b.split_at(rec_b.len() - 10);
        append(&files, 0, &rec_a);
        append(&files, 0, head);

        let store = open_store(root.path());
        let mut scanner = scanner(root.path(), &files, &store);
        for _ in 0..2 {
            let outcome = scanner.run_pass().unwrap();
            assert!(matches!(
                outcome,
                PassOutcome::Stalled {
                    reason: StallReason::Incomplete,
                    ..
                }
            ));
            assert_eq!(scanner.checkpoint(), ScanCheckpoint::new(0, rec_a.len() as u32));
        }
        assert!(store.block_record(&b.hash).unwrap().is_none());

        append(&files, 0, tail);
        assert_eq!(
            scanner.run_pass().unwrap(),
            PassOutcome::Idle { blocks_indexed: 1 }
        );
        assert!(store.block_record(&b.hash).unwrap().is_some());
        assert!(store.tx_record(&b.txids[0]).unwrap().is_some());
    }

    #[test]
    fn test_scan_crosses_into_next_file() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        let a = TestBlock::new(&[legacy_tx(1)], 1);
        let b = TestBlock::new(&[legacy_tx(2)], 2);
        append(&files, 0, &a.record(MAGIC));
        append(&files, 1, &b.record(MAGIC));

        let store = open_store(root.path());
        let mut scanner = scanner(root.path(), &files, &store);
        assert_eq!(
            scanner.run_pass().unwrap(),
            PassOutcome::NextFile { file_number: 1 }
        );
        assert_eq!(
            scanner.run_pass().unwrap(),
            PassOutcome::Idle { blocks_indexed: 1 }
        );

        let record = store.block_record(&b.hash).unwrap().unwrap();
        assert_eq!(record.file_number, 1);
        assert_eq!(record.offset, 8);
    }
}
