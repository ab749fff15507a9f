//! # Service Container
//!
//! Everything the workers share, built once at startup and handed to each
//! worker explicitly.

pub mod config;

use std::sync::Arc;

use ix_01_index_store::{FileBackedKVStore, IndexStore, KVStoreError, KeyValueStore};
use ix_02_block_scanner::{
    BlockFiles, JsonFileCheckpointStore, LegacyTransactionDecoder, Magic, ScanError,
    TransactionDecoder,
};
use ix_03_mempool_cache::PendingQueue;
use thiserror::Error;
use tracing::info;

pub use config::{load_config, ConfigError, FeedSource, IndexerConfig, StorageBackend};

/// Failures that stop the process before any worker starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Block directory {0} does not exist")]
    MissingDataDir(std::path::PathBuf),

    #[error("Scanner error: {0}")]
    Scan(#[from] ScanError),

    #[error("Index store error: {0}")]
    Store(#[from] KVStoreError),

    #[error("Cannot bind retrieval API to {0}: {1}")]
    Bind(String, #[source] std::io::Error),

    #[error("Node health check failed: {0}")]
    HealthCheck(String),
}

/// Shared handles passed to every worker.
pub struct ServiceContext {
    pub config: IndexerConfig,
    pub store: IndexStore,
    pub pending: Arc<PendingQueue>,
    pub files: BlockFiles,
    /// Record marker read from `blk00000.dat`.
    pub magic: Magic,
    pub decoder: Arc<dyn TransactionDecoder>,
}

impl ServiceContext {
    /// Validate config, check the block directory, read the magic marker and
    /// open the index.
    pub fn open(config: IndexerConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let files = BlockFiles::from_data_dir(&config.storage.data_dir);
        if !files.dir().is_dir() {
            return Err(StartupError::MissingDataDir(files.dir().to_path_buf()));
        }
        let magic = files.read_magic()?;
        info!("[runtime] Block files in {} (magic {})", files.dir().display(), hex::encode(magic));

        let kv = open_backend(&config)?;
        let store = IndexStore::new(kv);

        Ok(Self {
            config,
            store,
            pending: Arc::new(PendingQueue::new()),
            files,
            magic,
            decoder: Arc::new(LegacyTransactionDecoder::new()),
        })
    }

    pub fn checkpoint_store(&self) -> Arc<JsonFileCheckpointStore> {
        Arc::new(JsonFileCheckpointStore::new(self.config.storage.checkpoint_path()))
    }
}

fn open_backend(config: &IndexerConfig) -> Result<Arc<dyn KeyValueStore>, StartupError> {
    match config.storage.backend {
        StorageBackend::File => {
            let path = config.storage.index_dir.join("index.log");
            info!("[runtime] Using file-backed index at {}", path.display());
            Ok(Arc::new(FileBackedKVStore::open(path, config.storage.sync_writes)?))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackend::RocksDb => {
            use crate::adapters::storage::{RocksDbConfig, RocksDbStore};
            let path = config.storage.index_dir.join("rocksdb");
            info!("[runtime] Using RocksDB index at {}", path.display());
            let rocks = RocksDbConfig {
                path: path.to_string_lossy().to_string(),
                sync_writes: config.storage.sync_writes,
                ..Default::default()
            };
            Ok(Arc::new(RocksDbStore::open(rocks)?))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::RocksDb => Err(ConfigError::RocksDbUnavailable.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ix_02_block_scanner::test_utils::MAINNET_MAGIC;

    fn config_for(dir: &std::path::Path) -> IndexerConfig {
        let mut config = IndexerConfig::default();
        config.storage.data_dir = dir.join("node");
        config.storage.index_dir = dir.join("index");
        config.rpc.username = "user".into();
        config.rpc.password = "pass".into();
        config
    }

    #[test]
    fn test_missing_block_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ServiceContext::open(config_for(dir.path())),
            Err(StartupError::MissingDataDir(_))
        ));
    }

    #[test]
    fn test_empty_first_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = dir.path().join("node").join("blocks");
        std::fs::create_dir_all(&blocks).unwrap();
        std::fs::write(blocks.join("blk00000.dat"), b"").unwrap();

        assert!(matches!(
            ServiceContext::open(config_for(dir.path())),
            Err(StartupError::Scan(ScanError::MissingMagic(_)))
        ));
    }

    #[test]
    fn test_open_reads_magic() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = dir.path().join("node").join("blocks");
        std::fs::create_dir_all(&blocks).unwrap();
        std::fs::write(blocks.join("blk00000.dat"), MAINNET_MAGIC).unwrap();

        let context = ServiceContext::open(config_for(dir.path())).unwrap();
        assert_eq!(context.magic, MAINNET_MAGIC);
        assert_eq!(context.pending.depth(), 0);
    }
}
