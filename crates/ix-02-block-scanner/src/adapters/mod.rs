//! # Adapters
//!
//! - `decoder` - legacy (non-witness) transaction decoder
//! - `checkpoint` - JSON file and in-memory checkpoint stores
//! - `block_files` - `blkNNNNN.dat` naming and magic detection

pub mod block_files;
pub mod checkpoint;
pub mod decoder;

pub use block_files::BlockFiles;
pub use checkpoint::{InMemoryCheckpointStore, JsonFileCheckpointStore};
pub use decoder::LegacyTransactionDecoder;
