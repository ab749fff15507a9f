//! # Hashing Helpers
//!
//! Double SHA-256 and the display-order conventions used for identifiers.

use sha2::{Digest, Sha256};

use crate::entities::Hash;
use crate::errors::HashParseError;

/// `SHA256(SHA256(data))` in internal (wire) byte order.
pub fn hash256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Double SHA-256 reversed into display order. This is how block hashes and
/// transaction ids are keyed and printed.
pub fn display_hash256(data: &[u8]) -> Hash {
    reversed(&hash256(data))
}

/// Byte-reversed copy of a hash.
pub fn reversed(hash: &Hash) -> Hash {
    let mut out = *hash;
    out.reverse();
    out
}

/// Lowercase hex of a display-order identifier.
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 64-character hex identifier.
pub fn parse_hash(input: &str) -> Result<Hash, HashParseError> {
    let bytes = hex::decode(input.trim()).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HashParseError::InvalidLength(len))
}
