use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use ix_02_block_scanner::BlockFiles;

use crate::domain::errors::RetrievalError;
use crate::ports::outbound::ObjectFileReader;

/// Reads object bytes straight from the block files.
///
/// Each read opens the file anew; the files are append-only so an indexed
/// window never changes underneath a reader.
#[derive(Debug, Clone)]
pub struct FsObjectReader {
    files: BlockFiles,
}

impl FsObjectReader {
    pub fn new(files: BlockFiles) -> Self {
        Self { files }
    }
}

impl ObjectFileReader for FsObjectReader {
    fn read_at(&self, file_number: u32, offset: u64, len: usize) -> Result<Vec<u8>, RetrievalError> {
        let path = self.files.path(file_number);
        let read = || -> std::io::Result<Vec<u8>> {
            let mut file = File::open(&path)?;
            file.seek(SeekFrom::Start(offset))?;
            let mut buf = vec![0u8; len];
            file.read_exact(&mut buf)?;
            Ok(buf)
        };
        read().map_err(|source| RetrievalError::FileRead {
            path: path.clone(),
            source,
        })
    }
}
