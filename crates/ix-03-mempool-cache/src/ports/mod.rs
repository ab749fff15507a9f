//! # Ports
//!
//! - `outbound` - feed, node health and clock

pub mod outbound;
