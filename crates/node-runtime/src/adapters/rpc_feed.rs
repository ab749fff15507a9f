//! # RPC Mempool Feed
//!
//! A [`FeedSubscriber`] that polls the node instead of subscribing to a push
//! channel: list the mempool, fetch every txid not seen before, and hand the
//! raw bytes to the feed worker as `rawtx` messages.
//!
//! The seen set is pruned to the latest listing on every poll, so it never
//! outgrows the node mempool.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ix_03_mempool_cache::{FeedMessage, FeedSubscriber};
use tracing::{debug, warn};

use super::rpc::{NodeRpcClient, RpcError};

/// Where the mempool listing and raw transactions come from.
///
/// Production: `NodeRpcClient`
#[async_trait]
pub trait MempoolSource: Send + Sync {
    /// Txids currently in the mempool.
    async fn list(&self) -> Result<Vec<String>, RpcError>;
    /// Raw bytes of one mempool transaction.
    async fn fetch(&self, txid: &str) -> Result<Vec<u8>, RpcError>;
}

#[async_trait]
impl MempoolSource for NodeRpcClient {
    async fn list(&self) -> Result<Vec<String>, RpcError> {
        self.raw_mempool().await
    }

    async fn fetch(&self, txid: &str) -> Result<Vec<u8>, RpcError> {
        self.raw_transaction(txid).await
    }
}

pub struct RpcMempoolFeed {
    source: Arc<dyn MempoolSource>,
    interval: Duration,
    seen: HashSet<String>,
    buffer: VecDeque<FeedMessage>,
    polled: bool,
}

impl RpcMempoolFeed {
    pub fn new(source: Arc<dyn MempoolSource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            seen: HashSet::new(),
            buffer: VecDeque::new(),
            polled: false,
        }
    }

    /// Number of txids remembered from the last listing.
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// One listing round. Returns how many new transactions were buffered.
    pub async fn poll(&mut self) -> usize {
        let listing = match self.source.list().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("[runtime] Mempool listing failed: {}", e);
                return 0;
            }
        };

        let current: HashSet<&str> = listing.iter().map(String::as_str).collect();
        self.seen.retain(|txid| current.contains(txid.as_str()));

        let mut fresh = 0;
        for txid in &listing {
            if self.seen.contains(txid) {
                continue;
            }
            match self.source.fetch(txid).await {
                Ok(raw) => {
                    self.seen.insert(txid.clone());
                    self.buffer.push_back(FeedMessage::rawtx(raw));
                    fresh += 1;
                }
                // Usually mined or evicted between listing and fetch
                Err(e) => debug!("[runtime] Skipping mempool tx {}: {}", txid, e),
            }
        }
        fresh
    }
}

#[async_trait]
impl FeedSubscriber for RpcMempoolFeed {
    async fn next_message(&mut self) -> Option<FeedMessage> {
        loop {
            if let Some(message) = self.buffer.pop_front() {
                return Some(message);
            }
            if self.polled {
                tokio::time::sleep(self.interval).await;
            }
            self.polled = true;
            self.poll().await;
        }
    }
}
