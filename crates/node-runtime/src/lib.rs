//! # Block Indexer Runtime Library
//!
//! Wiring for the indexer binary, exposed as a library so the integration
//! tests can start the same workers the binary does.
//!
//! ## Modules
//!
//! - `container/` - configuration and the shared [`ServiceContext`]
//! - `adapters/` - node RPC client, ZMQ and RPC mempool feeds, RocksDB backend
//! - `runtime` - worker supervision and graceful shutdown
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `IX_*` environment variables and validate it
//! 2. Check the node over RPC (`getsafemodeinfo`); unreachable is fatal
//! 3. Open the block directory, read the magic marker, open the index
//! 4. Bind the retrieval API, then start the scan loop, the feed worker and
//!    the API server
//! 5. On Ctrl+C signal shutdown and join every worker

pub mod adapters;
pub mod container;
pub mod runtime;

pub use container::{load_config, ConfigError, IndexerConfig, ServiceContext, StartupError};
pub use runtime::{check_node, Collaborators, IndexerRuntime};
