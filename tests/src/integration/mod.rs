//! Integration flows. Every test builds its own temporary node data directory.

pub mod api_flow;
pub mod mempool_flow;
pub mod scan_flow;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use ix_02_block_scanner::test_utils::MAINNET_MAGIC;
    use ix_02_block_scanner::BlockFiles;

    /// `<root>/node/blocks`, created.
    pub fn block_dir(root: &Path) -> PathBuf {
        let dir = root.join("node").join("blocks");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn block_files(root: &Path) -> BlockFiles {
        BlockFiles::new(block_dir(root))
    }

    /// Append raw bytes to `blkNNNNN.dat`, creating it if needed.
    pub fn append(files: &BlockFiles, file_number: u32, bytes: &[u8]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(files.path(file_number))
            .unwrap();
        file.write_all(bytes).unwrap();
    }

    pub const MAGIC: [u8; 4] = MAINNET_MAGIC;
}
