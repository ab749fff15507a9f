//! Logical key spaces of the index.

/// A key space inside the store.
///
/// Column-family backends map each namespace to its own family; flat backends
/// prefix the key with [`Namespace::prefix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Block locations: `b:{hash}` -> IndexRecord
    Blocks,
    /// Transaction locations: `t:{txid}` -> IndexRecord
    Txs,
    /// Unconfirmed transactions: `p:{txid}` -> raw bytes
    Mempool,
    /// Indexer metadata: `m:{name}`
    Metadata,
}

impl Namespace {
    /// Every namespace, in column-family creation order.
    pub const ALL: [Namespace; 4] = [
        Namespace::Blocks,
        Namespace::Txs,
        Namespace::Mempool,
        Namespace::Metadata,
    ];

    /// Column family / display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Blocks => "blocks",
            Namespace::Txs => "txs",
            Namespace::Mempool => "mempool",
            Namespace::Metadata => "metadata",
        }
    }

    /// Byte prefix used by flat key-value backends.
    pub fn prefix(&self) -> &'static [u8] {
        match self {
            Namespace::Blocks => b"b:",
            Namespace::Txs => b"t:",
            Namespace::Mempool => b"p:",
            Namespace::Metadata => b"m:",
        }
    }

    /// Flat key for `key` in this namespace.
    pub fn key(&self, key: &[u8]) -> Vec<u8> {
        let mut flat = Vec::with_capacity(2 + key.len());
        flat.extend_from_slice(self.prefix());
        flat.extend_from_slice(key);
        flat
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
