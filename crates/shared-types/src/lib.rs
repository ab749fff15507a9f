//! # Shared Types Crate
//!
//! Types that cross subsystem boundaries in the indexer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the 12-byte `IndexRecord` encoding and the
//!   checkpoint layout are defined here and nowhere else.
//! - **Display-Order Identifiers**: every block and transaction identifier is
//!   the double SHA-256 digest byte-reversed, which is also the KV key.

pub mod entities;
pub mod errors;
pub mod hashing;

pub use entities::*;
pub use errors::*;
pub use hashing::*;
