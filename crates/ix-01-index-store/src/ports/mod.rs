//! # Ports
//!
//! - `outbound` - the storage backend this crate drives

pub mod outbound;
