//! Outbound (Driven) ports for the mempool cache.

use async_trait::async_trait;

use crate::domain::errors::MempoolError;
use crate::domain::value_objects::FeedMessage;

/// Source of feed messages.
///
/// Production: `ZmqRawTxFeed`, `RpcMempoolFeed` (node-runtime)
/// Testing: `ChannelFeed`
#[async_trait]
pub trait FeedSubscriber: Send + Sync {
    /// Next message, or `None` once the feed is closed for good.
    async fn next_message(&mut self) -> Option<FeedMessage>;
}

/// The node's safe-mode status.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// `Ok(true)` while the node reports safe mode.
    async fn safe_mode(&self) -> Result<bool, MempoolError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> u64;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
