//! # Runtime Adapters
//!
//! - `rpc` - node JSON-RPC client (health probe and transaction relay)
//! - `rpc_feed` - mempool feed that polls the node over RPC
//! - `zmq_feed` - mempool feed subscribed to the node's ZMQ `rawtx` topic
//! - `storage` - RocksDB index backend (feature `rocksdb`)

pub mod rpc;
pub mod rpc_feed;
pub mod storage;
pub mod zmq_feed;

pub use rpc::{NodeRpcClient, RpcError};
pub use rpc_feed::{MempoolSource, RpcMempoolFeed};
pub use zmq_feed::ZmqRawTxFeed;
