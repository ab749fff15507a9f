//! # Domain Layer
//!
//! - `namespace` - logical key spaces and their flat-key prefixes
//! - `batch` - ordered put/delete lists committed atomically
//! - `errors` - store and facade errors

pub mod batch;
pub mod errors;
pub mod namespace;
