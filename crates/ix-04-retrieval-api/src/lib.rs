//! # Retrieval API (ix-04)
//!
//! Read path over the index and the block files.
//!
//! | Route | Auth | Result |
//! |-------|------|--------|
//! | `GET /obj/info?q=<id>` | Basic | `{"size": n, "pending": bool}` |
//! | `GET /obj/chunk?q=<id>&chunk_index=i&chunk_size=c` | Basic | raw bytes |
//! | `POST /tx/broadcast` | Basic | `{"txid": "...", "message": "..."}` |
//! | `GET /health` | none | `{"status": "ok"}` |
//!
//! Credentials are the node's RPC user and password.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - response types, chunk arithmetic, errors
//! - `ports/` - block file reader, transaction relay
//! - `adapters/` - file-system reader
//! - `middleware/` - Basic auth layer
//! - `service.rs` - `RetrievalService`
//! - `router.rs` - axum routes

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;

pub use adapters::file_reader::FsObjectReader;
pub use domain::chunk::chunk_window;
pub use domain::errors::RetrievalError;
pub use domain::types::{BroadcastRequest, BroadcastResponse, ObjectInfo};
pub use middleware::auth::{AuthConfig, BasicAuthLayer};
pub use ports::outbound::{ObjectFileReader, TransactionRelay};
pub use router::{build_router, AppState};
pub use service::RetrievalService;
