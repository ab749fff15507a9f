//! # Block Scanner Service
//!
//! The scan state machine. Drives the framer over one numbered file at a
//! time, verifies each record, commits one batch per block and owns the
//! durable checkpoint.
//!
//! ```text
//! SeekingMagic -> FoundMagic (size) -> ReadHeader -> DecodeBody + Verify -> Commit -> AdvanceOrWait
//! ```
//!
//! The scanner is the only writer of checkpoints and the only committer of
//! index batches, including the mempool flush.

use std::io::{Read, Seek};
use std::sync::Arc;

use ix_01_index_store::{IndexBatch, IndexStore, Namespace};
use shared_types::{to_hex, Hash, IndexRecord, ScanCheckpoint};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::adapters::block_files::BlockFiles;
use crate::domain::entities::{
    BlockHeader, DecodeOutcome, IndexedBlock, PassOutcome, StallReason, HEADER_LEN,
};
use crate::domain::errors::ScanError;
use crate::domain::framer::{Magic, RecordFramer};
use crate::domain::merkle::{self, MerkleCheck};
use crate::domain::reader::{ByteReader, ReadError};
use crate::domain::value_objects::ScannerConfig;
use crate::ports::outbound::{CheckpointStore, PendingSource, TransactionDecoder};

/// Result of processing one framed record.
#[derive(Debug)]
enum BlockOutcome {
    Indexed(IndexedBlock),
    Stalled(StallReason),
}

/// One decoded transaction and where it sits in the block payload.
struct DecodedTx {
    txid: Hash,
    offset: usize,
    length: usize,
}

fn to_u32(file_number: u32, offset: u64) -> Result<u32, ScanError> {
    u32::try_from(offset).map_err(|_| ScanError::OffsetOverflow {
        file_number,
        offset,
    })
}

/// Resumable scanner over the block files.
pub struct BlockScanner {
    files: BlockFiles,
    magic: Magic,
    store: IndexStore,
    decoder: Arc<dyn TransactionDecoder>,
    checkpoints: Arc<dyn CheckpointStore>,
    pending: Option<Arc<dyn PendingSource>>,
    config: ScannerConfig,
    checkpoint: ScanCheckpoint,
}

impl BlockScanner {
    /// Create a scanner resuming from the stored checkpoint.
    pub fn new(
        files: BlockFiles,
        magic: Magic,
        store: IndexStore,
        decoder: Arc<dyn TransactionDecoder>,
        checkpoints: Arc<dyn CheckpointStore>,
        config: ScannerConfig,
    ) -> Result<Self, ScanError> {
        let checkpoint = checkpoints.load()?;
        info!(
            "[ix-02] Scanner resuming at file {} offset {}",
            checkpoint.file_number, checkpoint.byte_offset
        );
        Ok(Self {
            files,
            magic,
            store,
            decoder,
            checkpoints,
            pending: None,
            config,
            checkpoint,
        })
    }

    /// Flush pending mempool transactions from `source` once per loop.
    pub fn with_pending_source(mut self, source: Arc<dyn PendingSource>) -> Self {
        self.pending = Some(source);
        self
    }

    /// Last persisted cursor.
    pub fn checkpoint(&self) -> ScanCheckpoint {
        self.checkpoint
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan loop. Blocks the calling thread until `shutdown` turns true.
    pub fn run(&mut self, shutdown: &watch::Receiver<bool>) {
        info!("[ix-02] Scan worker started");
        // A dropped sender means the owner is gone; stop as if signalled.
        while !*shutdown.borrow() && shutdown.has_changed().is_ok() {
            if let Err(e) = self.flush_pending() {
                warn!("[ix-02] Mempool flush failed, entries dropped: {}", e);
            }

            let wait = match self.run_pass() {
                Ok(outcome) => outcome.should_wait(),
                Err(e) => {
                    error!("[ix-02] Scan pass failed: {}", e);
                    true
                }
            };
            if wait {
                std::thread::sleep(self.config.idle_interval());
            }
        }
        info!(
            "[ix-02] Scan worker stopped at file {} offset {}",
            self.checkpoint.file_number, self.checkpoint.byte_offset
        );
    }

    /// One pass over the file named by the checkpoint.
    pub fn run_pass(&mut self) -> Result<PassOutcome, ScanError> {
        let file_number = self.checkpoint.file_number;
        match self.files.open(file_number)? {
            Some(file) => self.scan_file(file_number, file),
            None if self.files.exists(file_number + 1) => self.advance_file(),
            None => Ok(PassOutcome::Idle { blocks_indexed: 0 }),
        }
    }

    /// Frame and index records from `file`, starting at the checkpoint.
    pub fn scan_file<R: Read + Seek>(
        &mut self,
        file_number: u32,
        file: R,
    ) -> Result<PassOutcome, ScanError> {
        let resume = u64::from(self.checkpoint.byte_offset);
        let mut framer = RecordFramer::new(file, self.magic, resume)?;
        let mut indexed = 0;

        let mut found = framer.find_magic()?;
        loop {
            if !found {
                return self.end_of_file(file_number, framer.scan_start_position(), indexed);
            }

            let size = match framer.read_size() {
                Ok(size) => size,
                Err(e) if e.is_truncated() => {
                    return self.stall(&framer, file_number, indexed, StallReason::Incomplete)
                }
                Err(e) => return Err(e.into()),
            };

            // A marker right after the size field: the record was never written.
            if framer.peek_next_magic()? == Some(self.magic) {
                debug!(
                    "[ix-02] Skipping zero-length record at file {} offset {}",
                    file_number,
                    framer.scan_start_position()
                );
                found = framer.find_next_magic()?;
                continue;
            }

            let header_start = framer.position()?;
            match self.read_block(&mut framer, file_number, header_start, size)? {
                BlockOutcome::Indexed(block) => {
                    info!(
                        block = %to_hex(&block.hash),
                        file = file_number,
                        scan_start = framer.scan_start_position(),
                        record = %block.record,
                        txs = block.tx_count,
                        "[ix-02] Indexed block"
                    );
                    indexed += 1;
                }
                BlockOutcome::Stalled(reason) => {
                    return self.stall(&framer, file_number, indexed, reason)
                }
            }

            found = framer.find_magic()?;
        }
    }

    fn read_block<R: Read + Seek>(
        &self,
        framer: &mut RecordFramer<R>,
        file_number: u32,
        header_start: u64,
        size: u32,
    ) -> Result<BlockOutcome, ScanError> {
        let Some(body_len) = (size as usize).checked_sub(HEADER_LEN) else {
            return Ok(BlockOutcome::Stalled(StallReason::Malformed(format!(
                "record length {} shorter than a header",
                size
            ))));
        };

        let header = match framer.read_header() {
            Ok(header) => header,
            Err(e) if e.is_truncated() => return Ok(BlockOutcome::Stalled(StallReason::Incomplete)),
            Err(e) => return Err(e.into()),
        };
        let body = framer.read_payload(body_len)?;
        if body.len() < body_len {
            return Ok(BlockOutcome::Stalled(StallReason::Incomplete));
        }

        self.process_block(file_number, header_start, size, &header, &body)
    }

    /// Decode, verify and commit one block whose bytes are fully available.
    ///
    /// `body` is everything after the header: `tx_count | transactions`.
    fn process_block(
        &self,
        file_number: u32,
        header_start: u64,
        size: u32,
        header: &BlockHeader,
        body: &[u8],
    ) -> Result<BlockOutcome, ScanError> {
        let txs = match self.decode_transactions(body) {
            Ok(txs) => txs,
            Err(reason) => return Ok(BlockOutcome::Stalled(reason)),
        };

        let txids: Vec<Hash> = txs.iter().map(|tx| tx.txid).collect();
        let check = merkle::verify(&header.merkle_root(), &txids);
        match check {
            MerkleCheck::Match => {}
            MerkleCheck::Exempt => debug!(
                "[ix-02] Block {} carries the exempt merkle root",
                to_hex(&header.block_hash())
            ),
            MerkleCheck::Mismatch { expected, computed } => {
                return Ok(BlockOutcome::Stalled(StallReason::MerkleMismatch {
                    expected,
                    computed,
                }))
            }
        }

        let hash = header.block_hash();
        let record = IndexRecord::new(file_number, to_u32(file_number, header_start)?, size);
        let body_start = header_start + HEADER_LEN as u64;

        let mut batch = IndexBatch::new();
        batch.put_record(Namespace::Blocks, &hash, record);
        for tx in &txs {
            if self.config.index_transactions {
                let offset = to_u32(file_number, body_start + tx.offset as u64)?;
                let length = to_u32(file_number, tx.length as u64)?;
                batch.put_record(
                    Namespace::Txs,
                    &tx.txid,
                    IndexRecord::new(file_number, offset, length),
                );
            }
            batch.evict_pending(&tx.txid);
        }

        if let Err(e) = self.store.commit(batch) {
            return Ok(BlockOutcome::Stalled(StallReason::Commit(e.to_string())));
        }

        Ok(BlockOutcome::Indexed(IndexedBlock {
            hash,
            record,
            tx_count: txs.len(),
        }))
    }

    fn decode_transactions(&self, body: &[u8]) -> Result<Vec<DecodedTx>, StallReason> {
        let mut reader = ByteReader::new(body);
        let tx_count = match reader.read_varint() {
            Ok(count) => count,
            Err(ReadError::Truncated { .. }) => return Err(StallReason::Incomplete),
            Err(e) => return Err(StallReason::Malformed(e.to_string())),
        };
        if tx_count == 0 {
            return Err(StallReason::Malformed("block without transactions".into()));
        }

        let mut offset = reader.consumed() as usize;
        let mut txs = Vec::new();
        for _ in 0..tx_count {
            match self.decoder.decode(&body[offset..]) {
                DecodeOutcome::Complete { txid, consumed } => {
                    txs.push(DecodedTx {
                        txid,
                        offset,
                        length: consumed,
                    });
                    offset += consumed;
                }
                DecodeOutcome::Incomplete => return Err(StallReason::Incomplete),
                DecodeOutcome::Malformed(reason) => return Err(StallReason::Malformed(reason)),
            }
        }

        if offset < body.len() {
            debug!(
                "[ix-02] {} trailing bytes after {} transactions",
                body.len() - offset,
                tx_count
            );
        }
        Ok(txs)
    }

    fn stall<R: Read + Seek>(
        &mut self,
        framer: &RecordFramer<R>,
        file_number: u32,
        blocks_indexed: usize,
        reason: StallReason,
    ) -> Result<PassOutcome, ScanError> {
        let scan_start = framer.scan_start_position();
        warn!(
            file = file_number,
            offset = scan_start,
            "[ix-02] Block not indexed, retrying next pass: {}",
            reason
        );
        self.persist_if_moved(ScanCheckpoint::new(
            file_number,
            to_u32(file_number, scan_start)?,
        ))?;
        Ok(PassOutcome::Stalled {
            blocks_indexed,
            reason,
        })
    }

    fn end_of_file(
        &mut self,
        file_number: u32,
        scan_start: u64,
        blocks_indexed: usize,
    ) -> Result<PassOutcome, ScanError> {
        if self.files.exists(file_number + 1) {
            return self.advance_file();
        }
        self.persist_if_moved(ScanCheckpoint::new(
            file_number,
            to_u32(file_number, scan_start)?,
        ))?;
        Ok(PassOutcome::Idle { blocks_indexed })
    }

    fn advance_file(&mut self) -> Result<PassOutcome, ScanError> {
        let next = self.checkpoint.next_file();
        self.persist(next)?;
        info!("[ix-02] Advancing to {}", self.files.path(next.file_number).display());
        Ok(PassOutcome::NextFile {
            file_number: next.file_number,
        })
    }

    fn persist_if_moved(&mut self, checkpoint: ScanCheckpoint) -> Result<(), ScanError> {
        if checkpoint != self.checkpoint {
            self.persist(checkpoint)?;
        }
        Ok(())
    }

    fn persist(&mut self, checkpoint: ScanCheckpoint) -> Result<(), ScanError> {
        self.checkpoints.save(&checkpoint)?;
        debug!(
            "[ix-02] Checkpoint saved: file {} offset {}",
            checkpoint.file_number, checkpoint.byte_offset
        );
        self.checkpoint = checkpoint;
        Ok(())
    }

    /// Move everything queued by the feed into the `mempool` namespace.
    ///
    /// Transactions already confirmed are skipped. Returns the number of
    /// entries written.
    pub fn flush_pending(&self) -> Result<usize, ScanError> {
        let Some(source) = &self.pending else {
            return Ok(0);
        };
        let drained = source.drain();
        if drained.is_empty() {
            return Ok(0);
        }

        let depth = drained.len();
        let mut batch = IndexBatch::new();
        for entry in drained {
            if self.store.is_confirmed_tx(&entry.txid)? {
                continue;
            }
            batch.put_pending(&entry.txid, entry.raw);
        }
        let written = batch.len();
        self.store.commit(batch)?;

        debug!(
            "[ix-02] Flushed {} pending transactions ({} drained, {} already confirmed)",
            written,
            depth,
            depth - written
        );
        Ok(written)
    }
}
