//! # Value Objects
//!
//! Scanner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pause after a pass that reached the end of the newest file or stalled.
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 100;

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Index transaction locations in the `txs` namespace.
    pub index_transactions: bool,
    /// Sleep between passes once caught up, in milliseconds.
    pub idle_interval_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            index_transactions: true,
            idle_interval_ms: DEFAULT_IDLE_INTERVAL_MS,
        }
    }
}

impl ScannerConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}
