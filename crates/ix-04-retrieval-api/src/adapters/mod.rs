//! # Adapters
//!
//! - `file_reader` - positioned reads from `blkNNNNN.dat`

pub mod file_reader;
