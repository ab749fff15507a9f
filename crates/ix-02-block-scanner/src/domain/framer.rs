//! # Record Framer
//!
//! Finds `magic(4) | length(4 LE) | payload` records in one block file.
//!
//! The file may still be growing. Nothing past the last byte read is assumed
//! to exist, and a short read is reported as "not yet written" rather than as
//! an error.
//!
//! ## Resynchronization
//!
//! When a 4-byte window is not the magic marker, the window is taken as a
//! record length and that many bytes are skipped before the next window is
//! read. After [`MAX_RESYNC_ATTEMPTS`] windows without a match the search
//! gives up for this pass.

use std::io::{Read, Seek, SeekFrom};

use super::entities::{BlockHeader, HEADER_LEN};
use super::reader::{ByteReader, ReadError};

/// Record separator, read once from the first block file.
pub type Magic = [u8; 4];

/// Windows examined by one marker search.
pub const MAX_RESYNC_ATTEMPTS: usize = 5;

/// Record cursor over one block file.
pub struct RecordFramer<R> {
    inner: R,
    magic: Magic,
    scan_start: u64,
}

impl<R: Read + Seek> RecordFramer<R> {
    /// Position `inner` at `resume` and start framing from there.
    pub fn new(mut inner: R, magic: Magic, resume: u64) -> Result<Self, ReadError> {
        inner.seek(SeekFrom::Start(resume))?;
        Ok(Self {
            inner,
            magic,
            scan_start: resume,
        })
    }

    /// Current byte position in the file.
    pub fn position(&mut self) -> Result<u64, ReadError> {
        Ok(self.inner.stream_position()?)
    }

    /// Where the most recent [`find_magic`](Self::find_magic) started.
    ///
    /// This is the checkpoint candidate: the start of the next record, or the
    /// first byte not yet known to hold a complete one.
    pub fn scan_start_position(&self) -> u64 {
        self.scan_start
    }

    /// The next four bytes, without advancing. `None` if fewer are available.
    pub fn peek_next_magic(&mut self) -> Result<Option<Magic>, ReadError> {
        let window = self.reader().read_bytes(4)?;
        if !window.is_empty() {
            self.inner.seek(SeekFrom::Current(-(window.len() as i64)))?;
        }
        Ok(window.try_into().ok())
    }

    /// Record the scan start, then search for the marker.
    ///
    /// On success the cursor sits just past the marker.
    pub fn find_magic(&mut self) -> Result<bool, ReadError> {
        self.scan_start = self.position()?;
        self.search()
    }

    /// Search for the marker without moving the scan start.
    ///
    /// Used to step over a spurious zero-length record so that a stall on the
    /// record after it still checkpoints at the spurious marker.
    pub fn find_next_magic(&mut self) -> Result<bool, ReadError> {
        self.search()
    }

    fn search(&mut self) -> Result<bool, ReadError> {
        for _ in 0..MAX_RESYNC_ATTEMPTS {
            let window = self.reader().read_bytes(4)?;
            if window.len() < 4 {
                return Ok(false);
            }
            if window[..] == self.magic[..] {
                return Ok(true);
            }
            let skip = u32::from_le_bytes([window[0], window[1], window[2], window[3]]);
            self.inner.seek(SeekFrom::Current(i64::from(skip)))?;
        }
        Ok(false)
    }

    /// Declared record length following a marker.
    pub fn read_size(&mut self) -> Result<u32, ReadError> {
        self.reader().read_u32_le()
    }

    pub fn read_header(&mut self) -> Result<BlockHeader, ReadError> {
        let bytes = self.reader().read_exact_bytes(HEADER_LEN)?;
        BlockHeader::from_slice(&bytes).ok_or(ReadError::Truncated {
            wanted: HEADER_LEN,
            got: bytes.len(),
        })
    }

    /// Up to `len` bytes of record body. Shorter only if the file ends first.
    pub fn read_payload(&mut self, len: usize) -> Result<Vec<u8>, ReadError> {
        self.reader().read_bytes(len)
    }

    fn reader(&mut self) -> ByteReader<&mut R> {
        ByteReader::new(&mut self.inner)
    }
}
