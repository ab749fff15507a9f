//! # Indexer Configuration
//!
//! One struct per concern, each with production defaults. Environment
//! variables override individual fields (see [`load_config`]).
//!
//! ## Requirements
//!
//! - Node RPC credentials MUST be set; they protect both the node calls and
//!   the retrieval API
//! - Poll and idle intervals MUST be non-zero

use std::path::PathBuf;

use ix_02_block_scanner::ScannerConfig;
use ix_03_mempool_cache::MempoolConfig;

/// Complete indexer configuration.
#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    /// Block files and index location.
    pub storage: StorageConfig,
    /// Block scan behaviour.
    pub scanner: ScannerConfig,
    /// Mempool feed behaviour.
    pub mempool: MempoolConfig,
    /// Where mempool transactions are pushed from.
    pub feed: FeedConfig,
    /// Retrieval API.
    pub api: ApiConfig,
    /// Node JSON-RPC endpoint.
    pub rpc: RpcConfig,
}

impl IndexerConfig {
    /// Check the configuration before anything is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.username.is_empty() || self.rpc.password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        if self.scanner.idle_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("IX_IDLE_INTERVAL_MS"));
        }
        if self.mempool.enabled {
            if self.mempool.safe_mode_poll_interval_ms == 0 {
                return Err(ConfigError::ZeroInterval("IX_SAFE_MODE_POLL_MS"));
            }
            if self.mempool.feed_poll_interval_ms == 0 {
                return Err(ConfigError::ZeroInterval("IX_FEED_POLL_MS"));
            }
            if self.feed.source == FeedSource::Zmq && self.feed.zmq_endpoints.is_empty() {
                return Err(ConfigError::MissingZmqEndpoint);
            }
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::RocksDbUnavailable);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// RPC username or password is empty.
    MissingCredentials,
    /// An interval that drives a loop is zero.
    ZeroInterval(&'static str),
    /// The RocksDB backend was requested but not compiled in.
    RocksDbUnavailable,
    /// The ZMQ feed is selected but no endpoint is set.
    MissingZmqEndpoint,
    /// An environment variable could not be parsed.
    InvalidValue { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingCredentials => write!(
                f,
                "Node RPC credentials are not set. \
                 Set IX_RPC_USER and IX_RPC_PASSWORD."
            ),
            ConfigError::ZeroInterval(key) => write!(f, "{} must be greater than zero", key),
            ConfigError::RocksDbUnavailable => write!(
                f,
                "IX_STORAGE_BACKEND=rocksdb requires building with --features rocksdb"
            ),
            ConfigError::MissingZmqEndpoint => write!(
                f,
                "IX_FEED_SOURCE=zmq requires at least one IX_ZMQ_ENDPOINTS entry"
            ),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which [`KeyValueStore`](ix_01_index_store::KeyValueStore) holds the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Append-only log replayed into memory on open.
    #[default]
    File,
    /// RocksDB, one column family per namespace.
    RocksDb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            _ => Err(()),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Node data directory; block files live in `<data_dir>/blocks`.
    pub data_dir: PathBuf,
    /// Directory holding the index and the scan checkpoint.
    pub index_dir: PathBuf,
    pub backend: StorageBackend,
    /// fsync every committed batch.
    pub sync_writes: bool,
}

impl StorageConfig {
    pub fn checkpoint_path(&self) -> PathBuf {
        self.index_dir.join("checkpoint.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./node-data"),
            index_dir: PathBuf::from("./index"),
            backend: StorageBackend::File,
            sync_writes: true,
        }
    }
}

/// How mempool transactions reach the feed worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedSource {
    /// Subscribe to the node's ZMQ `rawtx` publisher.
    #[default]
    Zmq,
    /// Poll the node mempool over JSON-RPC.
    RpcPoll,
}

impl std::str::FromStr for FeedSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zmq" => Ok(FeedSource::Zmq),
            "rpc" | "rpc-poll" => Ok(FeedSource::RpcPoll),
            _ => Err(()),
        }
    }
}

/// Mempool feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub source: FeedSource,
    /// Publisher endpoints, e.g. `tcp://127.0.0.1:28332`.
    pub zmq_endpoints: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: FeedSource::Zmq,
            zmq_endpoints: vec!["tcp://127.0.0.1:28332".to_string()],
        }
    }
}

/// Retrieval API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Node JSON-RPC configuration.
#[derive(Clone)]
pub struct RpcConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9882".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Build the configuration from process environment variables.
pub fn load_config() -> Result<IndexerConfig, ConfigError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the configuration from an arbitrary variable lookup.
///
/// | Variable                   | Field                                 |
/// |----------------------------|---------------------------------------|
/// | `IX_DATA_DIR`              | `storage.data_dir`                    |
/// | `IX_INDEX_DIR`             | `storage.index_dir`                   |
/// | `IX_STORAGE_BACKEND`       | `storage.backend` (`file`/`rocksdb`)  |
/// | `IX_SYNC_WRITES`           | `storage.sync_writes`                 |
/// | `IX_INDEX_TXS`             | `scanner.index_transactions`          |
/// | `IX_IDLE_INTERVAL_MS`      | `scanner.idle_interval_ms`            |
/// | `IX_MEMPOOL_ENABLED`       | `mempool.enabled`                     |
/// | `IX_SAFE_MODE_POLL_MS`     | `mempool.safe_mode_poll_interval_ms`  |
/// | `IX_SAFE_MODE_FAIL_CLOSED` | `mempool.fail_closed`                 |
/// | `IX_FEED_POLL_MS`          | `mempool.feed_poll_interval_ms`       |
/// | `IX_FEED_SOURCE`           | `feed.source` (`zmq`/`rpc`)           |
/// | `IX_ZMQ_ENDPOINTS`         | `feed.zmq_endpoints` (comma-separated)|
/// | `IX_API_ENABLED`           | `api.enabled`                         |
/// | `IX_API_BIND`              | `api.bind_address`                    |
/// | `IX_RPC_URL`               | `rpc.url`                             |
/// | `IX_RPC_USER`              | `rpc.username`                        |
/// | `IX_RPC_PASSWORD`          | `rpc.password`                        |
/// | `IX_RPC_TIMEOUT_SECS`      | `rpc.timeout_secs`                    |
pub fn load_config_from<F>(lookup: F) -> Result<IndexerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = IndexerConfig::default();

    if let Some(v) = lookup("IX_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("IX_INDEX_DIR") {
        config.storage.index_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("IX_STORAGE_BACKEND") {
        config.storage.backend = v.parse().map_err(|_| ConfigError::InvalidValue {
            key: "IX_STORAGE_BACKEND",
            value: v.clone(),
        })?;
    }
    if let Some(v) = lookup("IX_SYNC_WRITES") {
        config.storage.sync_writes = parse_flag("IX_SYNC_WRITES", &v)?;
    }

    if let Some(v) = lookup("IX_INDEX_TXS") {
        config.scanner.index_transactions = parse_flag("IX_INDEX_TXS", &v)?;
    }
    if let Some(v) = lookup("IX_IDLE_INTERVAL_MS") {
        config.scanner.idle_interval_ms = parse_number("IX_IDLE_INTERVAL_MS", &v)?;
    }

    if let Some(v) = lookup("IX_MEMPOOL_ENABLED") {
        config.mempool.enabled = parse_flag("IX_MEMPOOL_ENABLED", &v)?;
    }
    if let Some(v) = lookup("IX_SAFE_MODE_POLL_MS") {
        config.mempool.safe_mode_poll_interval_ms = parse_number("IX_SAFE_MODE_POLL_MS", &v)?;
    }
    if let Some(v) = lookup("IX_SAFE_MODE_FAIL_CLOSED") {
        config.mempool.fail_closed = parse_flag("IX_SAFE_MODE_FAIL_CLOSED", &v)?;
    }
    if let Some(v) = lookup("IX_FEED_POLL_MS") {
        config.mempool.feed_poll_interval_ms = parse_number("IX_FEED_POLL_MS", &v)?;
    }

    if let Some(v) = lookup("IX_FEED_SOURCE") {
        config.feed.source = v.parse().map_err(|_| ConfigError::InvalidValue {
            key: "IX_FEED_SOURCE",
            value: v.clone(),
        })?;
    }
    if let Some(v) = lookup("IX_ZMQ_ENDPOINTS") {
        config.feed.zmq_endpoints = v
            .split(',')
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(v) = lookup("IX_API_ENABLED") {
        config.api.enabled = parse_flag("IX_API_ENABLED", &v)?;
    }
    if let Some(v) = lookup("IX_API_BIND") {
        config.api.bind_address = v;
    }

    if let Some(v) = lookup("IX_RPC_URL") {
        config.rpc.url = v;
    }
    if let Some(v) = lookup("IX_RPC_USER") {
        config.rpc.username = v;
    }
    if let Some(v) = lookup("IX_RPC_PASSWORD") {
        config.rpc.password = v;
    }
    if let Some(v) = lookup("IX_RPC_TIMEOUT_SECS") {
        config.rpc.timeout_secs = parse_number("IX_RPC_TIMEOUT_SECS", &v)?;
    }

    Ok(config)
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
