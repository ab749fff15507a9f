//! # Error Types
//!
//! Decoding errors for the shared types.

use thiserror::Error;

/// A stored `IndexRecord` value could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Invalid index record length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// A client-supplied identifier string is not a 32-byte hex value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    #[error("Identifier is not valid hex: {0}")]
    InvalidHex(String),

    #[error("Identifier must be 32 bytes, got {0}")]
    InvalidLength(usize),
}
