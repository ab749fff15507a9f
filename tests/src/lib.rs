//! # Block Indexer Test Suite
//!
//! Cross-crate flows over real block files on disk.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scan_flow.rs       # scanner + file-backed index + retrieval
//!     ├── mempool_flow.rs    # feed -> pending queue -> confirmation
//!     └── api_flow.rs        # full runtime behind HTTP
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ix-tests
//! cargo test -p ix-tests integration::scan_flow::
//! ```

pub mod integration;
