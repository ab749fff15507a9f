//! # RocksDB Index Backend
//!
//! RocksDB implementation of the index `KeyValueStore`.
//!
//! ## Column Families
//!
//! One per [`Namespace`]:
//!
//! - `blocks` - block hash -> 12-byte location record
//! - `txs` - txid -> 12-byte location record
//! - `mempool` - txid -> raw transaction
//! - `metadata` - indexer metadata
//!
//! Batches go through a single `WriteBatch`, so a block and its
//! transactions become visible to readers together.

use ix_01_index_store::{BatchOperation, KVStoreError, KeyValueStore, Namespace};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};

/// RocksDB configuration.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 128MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// fsync after each batch
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./index/rocksdb".to_string(),
            block_cache_size: 128 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed index store.
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create the database with every namespace column family.
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        // Point lookups dominate
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = Namespace::ALL
            .iter()
            .map(|namespace| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(namespace.as_str(), cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(|e| {
            KVStoreError::IOError {
                message: format!("Failed to open RocksDB: {}", e),
            }
        })?;

        tracing::info!("[runtime] Opened RocksDB index at {}", config.path);
        Ok(Self { db, config })
    }

    fn cf(&self, namespace: Namespace) -> Result<&ColumnFamily, KVStoreError> {
        self.db
            .cf_handle(namespace.as_str())
            .ok_or_else(|| KVStoreError::CorruptionError {
                message: format!("Missing column family {}", namespace.as_str()),
            })
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, namespace: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        let cf = self.cf(namespace)?;
        self.db.get_cf(cf, key).map_err(|e| KVStoreError::IOError {
            message: format!("RocksDB get failed: {}", e),
        })
    }

    fn get_first(
        &self,
        namespaces: &[Namespace],
        key: &[u8],
    ) -> Result<Option<(Namespace, Vec<u8>)>, KVStoreError> {
        // Every column family is read at the same sequence number.
        let snapshot = self.db.snapshot();
        for namespace in namespaces {
            let value = snapshot
                .get_cf(self.cf(*namespace)?, key)
                .map_err(|e| KVStoreError::IOError {
                    message: format!("RocksDB snapshot get failed: {}", e),
                })?;
            if let Some(value) = value {
                return Ok(Some((*namespace, value)));
            }
        }
        Ok(None)
    }

    fn exists(&self, namespace: Namespace, key: &[u8]) -> Result<bool, KVStoreError> {
        let cf = self.cf(namespace)?;
        self.db
            .get_pinned_cf(cf, key)
            .map(|v| v.is_some())
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB exists check failed: {}", e),
            })
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put {
                    namespace,
                    key,
                    value,
                } => batch.put_cf(self.cf(namespace)?, &key, &value),
                BatchOperation::Delete { namespace, key } => {
                    batch.delete_cf(self.cf(namespace)?, &key)
                }
            }
        }

        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);

        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB batch write failed: {}", e),
            })
    }

    fn count(&self, namespace: Namespace) -> Result<usize, KVStoreError> {
        let cf = self.cf(namespace)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item.map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB scan failed: {}", e),
            })?;
            count += 1;
        }
        Ok(count)
    }
}
