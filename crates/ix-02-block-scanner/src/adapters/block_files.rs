//! # Block Files
//!
//! The node writes blocks to `<data_dir>/blocks/blk00000.dat`,
//! `blk00001.dat`, ... and never rewrites them.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::domain::errors::ScanError;
use crate::domain::framer::Magic;

/// Read-only view of the numbered block files.
#[derive(Debug, Clone)]
pub struct BlockFiles {
    dir: PathBuf,
}

impl BlockFiles {
    /// `dir` is the directory holding the `blkNNNNN.dat` files.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Files under `<data_dir>/blocks`.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join("blocks"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_number: u32) -> PathBuf {
        self.dir.join(format!("blk{:05}.dat", file_number))
    }

    pub fn exists(&self, file_number: u32) -> bool {
        self.path(file_number).is_file()
    }

    /// Open a file for reading. `None` if it does not exist yet.
    pub fn open(&self, file_number: u32) -> Result<Option<BufReader<File>>, ScanError> {
        let path = self.path(file_number);
        match File::open(&path) {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScanError::block_file(path, e)),
        }
    }

    /// The record marker: the first four bytes of `blk00000.dat`.
    pub fn read_magic(&self) -> Result<Magic, ScanError> {
        let path = self.path(0);
        let mut file = File::open(&path).map_err(|e| ScanError::block_file(&path, e))?;
        let mut magic = [0u8; 4];
        match file.read_exact(&mut magic) {
            Ok(()) => Ok(magic),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(ScanError::MissingMagic(path)),
            Err(e) => Err(ScanError::block_file(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_naming() {
        let files = BlockFiles::from_data_dir("/data");
        assert_eq!(files.path(0), PathBuf::from("/data/blocks/blk00000.dat"));
        assert_eq!(files.path(1234), PathBuf::from("/data/blocks/blk01234.dat"));
    }

    #[test]
    fn test_read_magic() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlockFiles::new(dir.path());

        assert!(matches!(files.read_magic(), Err(ScanError::BlockFile { .. })));

        std::fs::write(files.path(0), b"").unwrap();
        assert!(matches!(files.read_magic(), Err(ScanError::MissingMagic(_))));

        std::fs::write(files.path(0), [0xf9, 0xbe]).unwrap();
        assert!(matches!(files.read_magic(), Err(ScanError::MissingMagic(_))));

        // Reading a directory is an I/O failure, not a short file.
        let nested = BlockFiles::new(dir.path().join("nested"));
        std::fs::create_dir_all(nested.path(0)).unwrap();
        assert!(matches!(nested.read_magic(), Err(ScanError::BlockFile { .. })));

        std::fs::write(files.path(0), [0xf9, 0xbe, 0xb4, 0xd9, 0x1d]).unwrap();
        assert_eq!(files.read_magic().unwrap(), [0xf9, 0xbe, 0xb4, 0xd9]);
    }

    #[test]
    fn test_open_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlockFiles::new(dir.path());
        assert!(files.open(3).unwrap().is_none());
        assert!(!files.exists(3));
    }
}
