//! # Adapters
//!
//! - `channel` - in-process feed backed by a tokio mpsc channel
//!
//! The node-facing RPC feed lives in `node-runtime`.

pub mod channel;
