//! Fixtures for building block files in tests.

use shared_types::{display_hash256, reversed, Hash};

use crate::domain::framer::Magic;
use crate::domain::merkle::merkle_root;

/// Main-network record marker.
pub const MAINNET_MAGIC: Magic = [0xf9, 0xbe, 0xb4, 0xd9];

/// Genesis block header.
pub const GENESIS_HEADER: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";

/// Genesis coinbase transaction (204 bytes).
pub const GENESIS_COINBASE: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

pub fn write_varint(out: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// A one-input, one-output legacy transaction made unique by `tag`.
pub fn legacy_tx(tag: u8) -> Vec<u8> {
    let mut tx = 1u32.to_le_bytes().to_vec();
    write_varint(&mut tx, 1);
    tx.extend_from_slice(&[tag; 32]);
    tx.extend_from_slice(&0u32.to_le_bytes());
    write_varint(&mut tx, 3);
    tx.extend_from_slice(&[0x51, tag, 0x87]);
    tx.extend_from_slice(&u32::MAX.to_le_bytes());
    write_varint(&mut tx, 1);
    tx.extend_from_slice(&(5_000_000_000u64 + u64::from(tag)).to_le_bytes());
    write_varint(&mut tx, 2);
    tx.extend_from_slice(&[0x00, tag]);
    tx.extend_from_slice(&0u32.to_le_bytes());
    tx
}

/// Display-order txid of a serialized transaction.
pub fn txid(raw: &[u8]) -> Hash {
    display_hash256(raw)
}

/// A block payload (`header | tx_count | txs`) with a correct merkle root.
#[derive(Debug, Clone)]
pub struct TestBlock {
    pub hash: Hash,
    pub payload: Vec<u8>,
    pub txids: Vec<Hash>,
    /// Offset of each transaction inside `payload`.
    pub tx_offsets: Vec<usize>,
    pub tx_lengths: Vec<usize>,
}

impl TestBlock {
    /// Build a block over `txs`, with `nonce` keeping block hashes distinct.
    pub fn new(txs: &[Vec<u8>], nonce: u32) -> Self {
        let txids: Vec<Hash> = txs.iter().map(|tx| txid(tx)).collect();
        let root = merkle_root(&txids).unwrap_or([0u8; 32]);
        Self::with_merkle_field(txs, nonce, root)
    }

    /// Build a block whose header carries `root` whatever the txs hash to.
    pub fn with_merkle_field(txs: &[Vec<u8>], nonce: u32, root: Hash) -> Self {
        let mut header = Vec::with_capacity(80);
        header.extend_from_slice(&1u32.to_le_bytes());
        header.extend_from_slice(&[0u8; 32]);
        header.extend_from_slice(&reversed(&root));
        header.extend_from_slice(&1_231_006_505u32.to_le_bytes());
        header.extend_from_slice(&0x1d00_ffffu32.to_le_bytes());
        header.extend_from_slice(&nonce.to_le_bytes());

        let mut payload = header.clone();
        write_varint(&mut payload, txs.len() as u64);
        let mut tx_offsets = Vec::new();
        for tx in txs {
            tx_offsets.push(payload.len());
            payload.extend_from_slice(tx);
        }

        Self {
            hash: display_hash256(&header),
            payload,
            txids: txs.iter().map(|tx| txid(tx)).collect(),
            tx_offsets,
            tx_lengths: txs.iter().map(Vec::len).collect(),
        }
    }

    /// `magic | len | payload`
    pub fn record(&self, magic: Magic) -> Vec<u8> {
        frame(magic, &self.payload)
    }
}

/// Wrap a payload as a block-file record.
pub fn frame(magic: Magic, payload: &[u8]) -> Vec<u8> {
    let mut out = magic.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// The genesis block as a record payload (285 bytes).
pub fn genesis_payload() -> Vec<u8> {
    let mut payload = hex::decode(GENESIS_HEADER).unwrap_or_default();
    payload.push(1);
    payload.extend_from_slice(&hex::decode(GENESIS_COINBASE).unwrap_or_default());
    payload
}
