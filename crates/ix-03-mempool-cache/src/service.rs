//! # Feed Worker
//!
//! Async task that turns feed messages into queued pending transactions.

use std::sync::Arc;

use ix_02_block_scanner::{DecodeOutcome, TransactionDecoder};
use shared_types::{to_hex, Hash, PendingTransaction};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::queue::PendingQueue;
use crate::domain::safe_mode::SafeModeGate;
use crate::domain::value_objects::{FeedMessage, RAWTX_TOPIC};
use crate::ports::outbound::{FeedSubscriber, HealthProbe, TimeSource};

/// What happened to one feed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingest {
    Queued { txid: Hash },
    /// The node is in safe mode.
    DroppedSafeMode,
    /// Not a `rawtx` message.
    IgnoredTopic,
    /// The payload is not exactly one transaction.
    Undecodable(String),
}

pub struct FeedWorker {
    feed: Box<dyn FeedSubscriber>,
    gate: Arc<SafeModeGate>,
    probe: Arc<dyn HealthProbe>,
    decoder: Arc<dyn TransactionDecoder>,
    queue: Arc<PendingQueue>,
    clock: Arc<dyn TimeSource>,
}

impl FeedWorker {
    pub fn new(
        feed: Box<dyn FeedSubscriber>,
        gate: Arc<SafeModeGate>,
        probe: Arc<dyn HealthProbe>,
        decoder: Arc<dyn TransactionDecoder>,
        queue: Arc<PendingQueue>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            feed,
            gate,
            probe,
            decoder,
            queue,
            clock,
        }
    }

    /// Poll node health if the interval has elapsed.
    pub async fn refresh_gate(&self) {
        let now = self.clock.now();
        if !self.gate.poll_due(now) {
            return;
        }
        let result = self.probe.safe_mode().await;
        if let Err(e) = &result {
            warn!("[ix-03] {} (policy {:?})", e, self.gate.policy());
        }
        let was = self.gate.in_safe_mode();
        let now_in_safe_mode = self.gate.record_poll(now, &result);
        if was != now_in_safe_mode {
            info!(
                "[ix-03] Node safe mode {}",
                if now_in_safe_mode { "entered" } else { "cleared" }
            );
        }
    }

    /// Gate, decode and queue one message.
    pub async fn handle_message(&self, message: FeedMessage) -> Ingest {
        if message.topic != RAWTX_TOPIC {
            return Ingest::IgnoredTopic;
        }

        self.refresh_gate().await;
        if !self.gate.accepts_ingestion() {
            return Ingest::DroppedSafeMode;
        }

        match self.decoder.decode(&message.payload) {
            DecodeOutcome::Complete { txid, consumed } if consumed == message.payload.len() => {
                self.queue.push(PendingTransaction {
                    txid,
                    raw: message.payload,
                });
                Ingest::Queued { txid }
            }
            DecodeOutcome::Complete { consumed, .. } => Ingest::Undecodable(format!(
                "{} trailing bytes",
                message.payload.len() - consumed
            )),
            DecodeOutcome::Incomplete => Ingest::Undecodable("truncated transaction".into()),
            DecodeOutcome::Malformed(reason) => Ingest::Undecodable(reason),
        }
    }

    /// Consume the feed until it closes or `shutdown` turns true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[ix-03] Feed worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let message = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                message = self.feed.next_message() => message,
            };
            let Some(message) = message else {
                warn!("[ix-03] Feed closed");
                break;
            };

            match self.handle_message(message).await {
                Ingest::Queued { txid } => debug!(
                    "[ix-03] Queued {} (depth {})",
                    to_hex(&txid),
                    self.queue.depth()
                ),
                Ingest::DroppedSafeMode => debug!("[ix-03] Dropped message: node in safe mode"),
                Ingest::IgnoredTopic => {}
                Ingest::Undecodable(reason) => warn!("[ix-03] Dropped message: {}", reason),
            }
        }
        info!("[ix-03] Feed worker stopped");
    }
}
