//! # Pending Queue
//!
//! Mutex-guarded FIFO between the feed worker (producer) and the scan worker
//! (consumer). Unbounded; the depth is exposed for logging.

use std::collections::VecDeque;

use ix_02_block_scanner::PendingSource;
use parking_lot::Mutex;
use shared_types::PendingTransaction;

#[derive(Debug, Default)]
pub struct PendingQueue {
    inner: Mutex<VecDeque<PendingTransaction>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: PendingTransaction) {
        self.inner.lock().push_back(entry);
    }

    /// Entries currently queued.
    pub fn depth(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Swap the whole buffer out and return it in arrival order.
    pub fn take_all(&self) -> Vec<PendingTransaction> {
        let drained = std::mem::take(&mut *self.inner.lock());
        drained.into()
    }
}

impl PendingSource for PendingQueue {
    fn drain(&self) -> Vec<PendingTransaction> {
        self.take_all()
    }
}
