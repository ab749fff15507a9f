//! # Ports
//!
//! - `outbound` - decoder, checkpoint persistence and the pending-transaction source

pub mod outbound;
