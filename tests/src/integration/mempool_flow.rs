//! # Mempool Flow
//!
//! Feed message -> feed worker -> pending queue -> scanner flush -> pending
//! entry served by retrieval -> evicted when the confirming block is indexed.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use ix_01_index_store::{IndexStore, Namespace};
    use ix_02_block_scanner::test_utils::{legacy_tx, TestBlock};
    use ix_02_block_scanner::{
        BlockScanner, InMemoryCheckpointStore, LegacyTransactionDecoder, PassOutcome,
        ScannerConfig,
    };
    use ix_03_mempool_cache::{
        channel_feed, FeedMessage, FeedWorker, HealthProbe, MempoolError, PendingQueue,
        SafeModeGate, SafeModePolicy, SystemTimeSource, RAWTX_TOPIC,
    };
    use ix_04_retrieval_api::{FsObjectReader, ObjectInfo, RetrievalService};
    use tokio::sync::watch;

    use crate::integration::fixtures::{append, block_files, MAGIC};

    struct StaticProbe(bool);

    #[async_trait]
    impl HealthProbe for StaticProbe {
        async fn safe_mode(&self) -> Result<bool, MempoolError> {
            Ok(self.0)
        }
    }

    fn worker(
        feed: ix_03_mempool_cache::ChannelFeed,
        safe_mode: bool,
        queue: Arc<PendingQueue>,
    ) -> FeedWorker {
        FeedWorker::new(
            Box::new(feed),
            Arc::new(SafeModeGate::new(
                Duration::from_secs(60),
                SafeModePolicy::FailOpen,
            )),
            Arc::new(StaticProbe(safe_mode)),
            Arc::new(LegacyTransactionDecoder::new()),
            queue,
            Arc::new(SystemTimeSource),
        )
    }

    async fn wait_for_depth(queue: &PendingQueue, depth: usize) {
        for _ in 0..200 {
            if queue.depth() >= depth {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("queue never reached depth {}", depth);
    }

    #[tokio::test]
    async fn test_pending_transaction_lifecycle() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        let store = IndexStore::in_memory();
        let queue = Arc::new(PendingQueue::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Feed -> queue
        let (sender, feed) = channel_feed(RAWTX_TOPIC, 16);
        let handle = tokio::spawn(worker(feed, false, queue.clone()).run(shutdown_rx));
        let raw = legacy_tx(9);
        assert!(sender.publish(FeedMessage::new("hashblock", vec![0; 32])).await);
        assert!(sender.publish(FeedMessage::rawtx(raw.clone())).await);
        wait_for_depth(&queue, 1).await;
        assert_eq!(queue.depth(), 1);

        // Queue -> store
        let mut scanner = BlockScanner::new(
            files.clone(),
            MAGIC,
            store.clone(),
            Arc::new(LegacyTransactionDecoder::new()),
            Arc::new(InMemoryCheckpointStore::new()),
            ScannerConfig::default(),
        )
        .unwrap()
        .with_pending_source(queue.clone());
        assert_eq!(scanner.flush_pending().unwrap(), 1);
        assert!(queue.is_empty());

        let block = TestBlock::new(&[legacy_tx(1), raw.clone()], 7);
        let txid = block.txids[1];
        let service = RetrievalService::new(store.clone(), Arc::new(FsObjectReader::new(files.clone())));
        assert_eq!(
            service.info(&txid).unwrap(),
            ObjectInfo {
                size: raw.len() as u64,
                pending: true
            }
        );
        assert_eq!(service.chunk(&txid, 0, 4).unwrap(), raw[..4].to_vec());

        // Confirmation evicts the pending entry in the same batch
        append(&files, 0, &block.record(MAGIC));
        assert_eq!(
            scanner.run_pass().unwrap(),
            PassOutcome::Idle { blocks_indexed: 1 }
        );
        assert_eq!(store.pending(&txid).unwrap(), None);
        assert_eq!(store.count(Namespace::Mempool).unwrap(), 0);
        assert_eq!(
            service.info(&txid).unwrap(),
            ObjectInfo {
                size: raw.len() as u64,
                pending: false
            }
        );
        assert_eq!(service.chunk(&txid, 0, 1 << 16).unwrap(), raw);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_safe_mode_drops_feed_messages() {
        let queue = Arc::new(PendingQueue::new());
        let (sender, feed) = channel_feed(RAWTX_TOPIC, 4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(worker(feed, true, queue.clone()).run(shutdown_rx));

        assert!(sender.publish(FeedMessage::rawtx(legacy_tx(1))).await);
        // Closing the feed ends the worker once the message is handled
        drop(sender);
        handle.await.unwrap();

        assert!(queue.is_empty());
    }
}
