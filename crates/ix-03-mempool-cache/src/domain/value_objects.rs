//! # Value Objects

use serde::{Deserialize, Serialize};

/// Feed topic carrying raw transaction bytes.
pub const RAWTX_TOPIC: &str = "rawtx";

/// One message received from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl FeedMessage {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    pub fn rawtx(payload: Vec<u8>) -> Self {
        Self::new(RAWTX_TOPIC, payload)
    }
}

/// Mempool ingestion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolConfig {
    /// Run the feed worker at all.
    pub enabled: bool,
    /// How often the safe-mode flag is refreshed, in milliseconds.
    pub safe_mode_poll_interval_ms: u64,
    /// Treat a failed health poll as "node in safe mode".
    pub fail_closed: bool,
    /// How often the RPC feed lists the node mempool, in milliseconds.
    pub feed_poll_interval_ms: u64,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            safe_mode_poll_interval_ms: 5_000,
            fail_closed: false,
            feed_poll_interval_ms: 1_000,
        }
    }
}
