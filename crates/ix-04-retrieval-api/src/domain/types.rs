use serde::{Deserialize, Serialize};

/// Answer to `/obj/info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Size in bytes; zero for unknown identifiers.
    pub size: u64,
    /// True if the object is only known from the mempool.
    pub pending: bool,
}

impl ObjectInfo {
    pub const UNKNOWN: ObjectInfo = ObjectInfo {
        size: 0,
        pending: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    /// Raw transaction, hex encoded.
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    /// Empty when the node rejected the transaction.
    pub txid: String,
    pub message: String,
}
