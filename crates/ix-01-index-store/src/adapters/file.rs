use crate::domain::batch::BatchOperation;
use crate::domain::errors::KVStoreError;
use crate::domain::namespace::Namespace;
use crate::ports::outbound::KeyValueStore;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

type Table = HashMap<(Namespace, Vec<u8>), Vec<u8>>;

const OP_PUT: u8 = 0;
const OP_DELETE: u8 = 1;
/// `[body_len:u32][crc32:u32]`
const FRAME_HEADER_LEN: usize = 8;
/// Dead operations tolerated in the log before it is rewritten.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 4096;

fn io_err(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

fn namespace_tag(namespace: Namespace) -> u8 {
    match namespace {
        Namespace::Blocks => 0,
        Namespace::Txs => 1,
        Namespace::Mempool => 2,
        Namespace::Metadata => 3,
    }
}

fn namespace_from_tag(tag: u8) -> Option<Namespace> {
    Namespace::ALL.get(tag as usize).copied()
}

/// File-backed key-value store for deployments without RocksDB.
///
/// Every batch is appended to a single log file as one checksummed frame:
///
/// ```text
/// [body_len:u32][crc32:u32][op]*    op = [kind:u8][ns:u8][key_len:u32][key]([value_len:u32][value])?
/// ```
///
/// A frame is the unit of atomicity. On open the log is replayed up to the
/// first torn or corrupt frame and truncated there, so a crash mid-append
/// loses at most the batch being written. The whole table is kept in memory.
///
/// Overwritten and deleted keys stay in the log until it is compacted. A
/// write that leaves at least `compaction_threshold` dead operations in the
/// log, and more dead than live ones, rewrites it in place.
pub struct FileBackedKVStore {
    data: RwLock<Table>,
    writer: Mutex<LogWriter>,
    path: PathBuf,
    sync_writes: bool,
    compaction_threshold: usize,
}

struct LogWriter {
    file: File,
    /// Operations currently recorded in the log, live or dead.
    logged_ops: usize,
}

impl FileBackedKVStore {
    /// Open or create the log at `path`.
    pub fn open<P: AsRef<Path>>(path: P, sync_writes: bool) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let (data, valid_len, logged_ops) = Self::replay(&path)?;

        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let on_disk = writer.metadata().map_err(io_err)?.len();
        if on_disk > valid_len {
            #[cfg(feature = "tracing-log")]
            tracing::warn!(
                "[ix-01] Truncating torn tail of {}: {} -> {} bytes",
                path.display(),
                on_disk,
                valid_len
            );
            writer.set_len(valid_len).map_err(io_err)?;
        }

        #[cfg(feature = "tracing-log")]
        tracing::info!(
            "[ix-01] Opened index log {} ({} keys from {} logged ops)",
            path.display(),
            data.len(),
            logged_ops
        );

        let store = Self {
            data: RwLock::new(data),
            writer: Mutex::new(LogWriter {
                file: writer,
                logged_ops,
            }),
            path,
            sync_writes,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        };
        store.compact_if_needed(&mut store.writer.lock())?;
        Ok(store)
    }

    /// Override the dead-operation count that triggers compaction.
    pub fn with_compaction_threshold(mut self, threshold: usize) -> Self {
        self.compaction_threshold = threshold.max(1);
        self
    }

    /// Path of the backing log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the log as a single frame holding only live keys.
    ///
    /// Deleted mempool entries otherwise accumulate in the log forever.
    pub fn compact(&self) -> Result<(), KVStoreError> {
        self.rewrite(&mut self.writer.lock())
    }

    fn compact_if_needed(&self, writer: &mut LogWriter) -> Result<(), KVStoreError> {
        let live = self.data.read().len();
        let dead = writer.logged_ops.saturating_sub(live);
        if dead < self.compaction_threshold || dead < live {
            return Ok(());
        }
        #[cfg(feature = "tracing-log")]
        tracing::debug!(
            "[ix-01] Compacting {}: {} dead ops, {} live keys",
            self.path.display(),
            dead,
            live
        );
        self.rewrite(writer)
    }

    /// Caller holds the writer lock, so no append can interleave.
    fn rewrite(&self, writer: &mut LogWriter) -> Result<(), KVStoreError> {
        let data = self.data.read();

        let ops: Vec<BatchOperation> = data
            .iter()
            .map(|((namespace, key), value)| BatchOperation::put(*namespace, key.clone(), value.clone()))
            .collect();
        let frame = encode_frame(&ops);

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path).map_err(io_err)?;
        file.write_all(&frame).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;

        writer.file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writer.logged_ops = ops.len();
        Ok(())
    }

    fn replay(path: &Path) -> Result<(Table, u64, usize), KVStoreError> {
        let mut data = Table::new();
        let bytes = match File::open(path) {
            Ok(mut file) => {
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).map_err(io_err)?;
                bytes
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((data, 0, 0)),
            Err(e) => return Err(io_err(e)),
        };

        let mut cursor = 0usize;
        let mut logged_ops = 0usize;
        while cursor + FRAME_HEADER_LEN <= bytes.len() {
            let body_len = read_u32(&bytes, cursor) as usize;
            let checksum = read_u32(&bytes, cursor + 4);
            let body_start = cursor + FRAME_HEADER_LEN;
            let Some(body) = bytes.get(body_start..body_start + body_len) else {
                break;
            };
            if crc32fast::hash(body) != checksum {
                break;
            }
            let Some(ops) = decode_body(body) else {
                break;
            };
            logged_ops += ops.len();
            apply(&mut data, ops);
            cursor = body_start + body_len;
        }

        Ok((data, cursor as u64, logged_ops))
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn apply(data: &mut Table, operations: Vec<BatchOperation>) {
    for op in operations {
        match op {
            BatchOperation::Put {
                namespace,
                key,
                value,
            } => {
                data.insert((namespace, key), value);
            }
            BatchOperation::Delete { namespace, key } => {
                data.remove(&(namespace, key));
            }
        }
    }
}

fn encode_frame(operations: &[BatchOperation]) -> Vec<u8> {
    let mut body = Vec::new();
    for op in operations {
        match op {
            BatchOperation::Put {
                namespace,
                key,
                value,
            } => {
                body.push(OP_PUT);
                body.push(namespace_tag(*namespace));
                body.extend_from_slice(&(key.len() as u32).to_le_bytes());
                body.extend_from_slice(key);
                body.extend_from_slice(&(value.len() as u32).to_le_bytes());
                body.extend_from_slice(value);
            }
            BatchOperation::Delete { namespace, key } => {
                body.push(OP_DELETE);
                body.push(namespace_tag(*namespace));
                body.extend_from_slice(&(key.len() as u32).to_le_bytes());
                body.extend_from_slice(key);
            }
        }
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    frame.extend_from_slice(&body);
    frame
}

fn decode_body(body: &[u8]) -> Option<Vec<BatchOperation>> {
    let mut ops = Vec::new();
    let mut cursor = 0usize;

    let take = |len: usize, cursor: &mut usize| -> Option<Vec<u8>> {
        let slice = body.get(*cursor..*cursor + len)?.to_vec();
        *cursor += len;
        Some(slice)
    };

    while cursor < body.len() {
        let kind = *body.get(cursor)?;
        let namespace = namespace_from_tag(*body.get(cursor + 1)?)?;
        cursor += 2;

        let key_len = take(4, &mut cursor).map(|b| read_u32(&b, 0) as usize)?;
        let key = take(key_len, &mut cursor)?;

        match kind {
            OP_PUT => {
                let value_len = take(4, &mut cursor).map(|b| read_u32(&b, 0) as usize)?;
                let value = take(value_len, &mut cursor)?;
                ops.push(BatchOperation::put(namespace, key, value));
            }
            OP_DELETE => ops.push(BatchOperation::delete(namespace, key)),
            _ => return None,
        }
    }
    Some(ops)
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, namespace: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(&(namespace, key.to_vec())).cloned())
    }

    fn get_first(
        &self,
        namespaces: &[Namespace],
        key: &[u8],
    ) -> Result<Option<(Namespace, Vec<u8>)>, KVStoreError> {
        let data = self.data.read();
        Ok(namespaces.iter().find_map(|namespace| {
            data.get(&(*namespace, key.to_vec()))
                .map(|value| (*namespace, value.clone()))
        }))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        if operations.is_empty() {
            return Ok(());
        }
        let frame = encode_frame(&operations);

        // Durable first, then visible. The writer lock orders both steps.
        let mut writer = self.writer.lock();
        let file = &mut writer.file;
        let before = file.metadata().map_err(io_err)?.len();
        let appended = file.write_all(&frame).and_then(|_| {
            if self.sync_writes {
                file.sync_data()
            } else {
                Ok(())
            }
        });
        if let Err(e) = appended {
            // Drop whatever part of the frame reached the file.
            let _ = file.set_len(before);
            return Err(io_err(e));
        }

        writer.logged_ops += operations.len();
        apply(&mut self.data.write(), operations);
        self.compact_if_needed(&mut writer)
    }

    fn count(&self, namespace: Namespace) -> Result<usize, KVStoreError> {
        Ok(self
            .data
            .read()
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_ops() -> Vec<BatchOperation> {
        vec![
            BatchOperation::put(Namespace::Blocks, vec![1u8; 32], vec![9u8; 12]),
            BatchOperation::put(Namespace::Mempool, vec![2u8; 32], b"raw tx".to_vec()),
        ]
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.log");

        {
            let store = FileBackedKVStore::open(&path, false).unwrap();
            store.atomic_batch_write(sample_ops()).unwrap();
            store
                .atomic_batch_write(vec![BatchOperation::delete(Namespace::Mempool, vec![2u8; 32])])
                .unwrap();
        }

        let store = FileBackedKVStore::open(&path, false).unwrap();
        assert_eq!(store.get(Namespace::Blocks, &[1u8; 32]).unwrap(), Some(vec![9u8; 12]));
        assert_eq!(store.get(Namespace::Mempool, &[2u8; 32]).unwrap(), None);
    }

    #[test]
    fn test_torn_tail_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.log");

        {
            let store = FileBackedKVStore::open(&path, false).unwrap();
            store.atomic_batch_write(sample_ops()).unwrap();
        }
        let good_len = std::fs::metadata(&path).unwrap().len();

        // Half of a second frame, as if the process died mid-append.
        let torn = encode_frame(&[BatchOperation::put(Namespace::Txs, vec![3u8; 32], vec![0u8; 12])]);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&torn[..torn.len() / 2]).unwrap();
        drop(file);

        let store = FileBackedKVStore::open(&path, false).unwrap();
        assert_eq!(store.count(Namespace::Txs).unwrap(), 0);
        assert_eq!(store.count(Namespace::Blocks).unwrap(), 1);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);
    }

    #[test]
    fn test_compact_keeps_live_keys_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.log");

        let store = FileBackedKVStore::open(&path, false).unwrap();
        store.atomic_batch_write(sample_ops()).unwrap();
        store
            .atomic_batch_write(vec![BatchOperation::delete(Namespace::Mempool, vec![2u8; 32])])
            .unwrap();
        let before = std::fs::metadata(&path).unwrap().len();
        store.compact().unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() < before);

        // Appends after compaction still land in the rewritten log.
        store
            .atomic_batch_write(vec![BatchOperation::put(Namespace::Txs, vec![4u8; 32], vec![1u8; 12])])
            .unwrap();
        drop(store);

        let reopened = FileBackedKVStore::open(&path, false).unwrap();
        assert_eq!(reopened.count(Namespace::Blocks).unwrap(), 1);
        assert_eq!(reopened.count(Namespace::Mempool).unwrap(), 0);
        assert_eq!(reopened.count(Namespace::Txs).unwrap(), 1);
    }

    #[test]
    fn test_get_first_reads_namespaces_in_order() {
        let dir = TempDir::new().unwrap();
        let store = FileBackedKVStore::open(dir.path().join("index.log"), false).unwrap();
        let key = vec![5u8; 32];
        store
            .atomic_batch_write(vec![
                BatchOperation::put(Namespace::Mempool, key.clone(), b"pending".to_vec()),
                BatchOperation::put(Namespace::Txs, key.clone(), vec![1u8; 12]),
            ])
            .unwrap();

        let order = [Namespace::Blocks, Namespace::Txs, Namespace::Mempool];
        assert_eq!(
            store.get_first(&order, &key).unwrap(),
            Some((Namespace::Txs, vec![1u8; 12]))
        );
        assert_eq!(
            store.get_first(&[Namespace::Mempool], &key).unwrap(),
            Some((Namespace::Mempool, b"pending".to_vec()))
        );
        assert_eq!(store.get_first(&[Namespace::Blocks], &key).unwrap(), None);
    }

    #[test]
    fn test_mempool_churn_triggers_compaction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.log");
        let store = FileBackedKVStore::open(&path, false)
            .unwrap()
            .with_compaction_threshold(16);
        store
            .atomic_batch_write(vec![BatchOperation::put(Namespace::Blocks, vec![1u8; 32], vec![9u8; 12])])
            .unwrap();

        // Each pending tx is added then evicted, as when it gets confirmed.
        let mut largest = 0;
        for i in 0..200u32 {
            let mut txid = vec![0u8; 32];
            txid[..4].copy_from_slice(&i.to_le_bytes());
            store
                .atomic_batch_write(vec![BatchOperation::put(Namespace::Mempool, txid.clone(), vec![7u8; 250])])
                .unwrap();
            store
                .atomic_batch_write(vec![BatchOperation::delete(Namespace::Mempool, txid)])
                .unwrap();
            largest = largest.max(std::fs::metadata(&path).unwrap().len());
        }

        // Without compaction the log would hold 400 mempool operations.
        assert!(largest < 40 * 300, "log grew to {largest} bytes");
        drop(store);

        let reopened = FileBackedKVStore::open(&path, false).unwrap();
        assert_eq!(reopened.count(Namespace::Blocks).unwrap(), 1);
        assert_eq!(reopened.count(Namespace::Mempool).unwrap(), 0);
    }

    #[test]
    fn test_repeated_overwrites_are_compacted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.log");
        {
            let store = FileBackedKVStore::open(&path, false).unwrap();
            for _ in 0..=DEFAULT_COMPACTION_THRESHOLD {
                store
                    .atomic_batch_write(vec![BatchOperation::put(Namespace::Metadata, b"k".to_vec(), vec![0u8; 8])])
                    .unwrap();
            }
        }
        // The last write left one dead op too many, so the log was rewritten.
        let compacted = std::fs::metadata(&path).unwrap().len();
        assert!(compacted < 100, "log is {compacted} bytes");

        let reopened = FileBackedKVStore::open(&path, false).unwrap();
        assert_eq!(reopened.get(Namespace::Metadata, b"k").unwrap(), Some(vec![0u8; 8]));
    }
}
