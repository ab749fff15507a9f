//! # Mempool Cache (ix-03)
//!
//! Ingests unconfirmed transactions from the node's `rawtx` feed.
//!
//! The feed worker never touches the index. It decodes each message to learn
//! the txid and appends it to the [`PendingQueue`]; the scan worker drains
//! the queue once per loop and writes the entries to the `mempool` namespace.
//!
//! ```text
//! feed ──rawtx──→ FeedWorker ──(gate open?)──→ PendingQueue ──drain──→ scanner ──batch──→ mempool
//!                     │
//!                     └── polls HealthProbe every 5s ──→ SafeModeGate
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Gate Before Queue | Nothing is queued while the node reports safe mode |
//! | 2 | Fail-Open | A failed health poll keeps the previous flag (configurable) |
//! | 3 | FIFO Drain | A drain returns every queued entry in arrival order |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - pending queue, safe-mode gate, config, errors
//! - `ports/` - feed subscriber, health probe, time source
//! - `adapters/` - in-process channel feed
//! - `service.rs` - `FeedWorker`

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::channel::{channel_feed, ChannelFeed, FeedSender};
pub use domain::errors::MempoolError;
pub use domain::queue::PendingQueue;
pub use domain::safe_mode::{SafeModeGate, SafeModePolicy};
pub use domain::value_objects::{FeedMessage, MempoolConfig, RAWTX_TOPIC};
pub use ports::outbound::{FeedSubscriber, HealthProbe, SystemTimeSource, TimeSource};
pub use service::{FeedWorker, Ingest};
