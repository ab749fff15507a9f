//! # Domain Layer
//!
//! - `reader` - compact-size and fixed-width integer decoding
//! - `framer` - record boundaries and resynchronization
//! - `merkle` - merkle root recomputation and the allow-list
//! - `entities` - headers and outcome values
//! - `value_objects` - configuration
//! - `errors` - fatal scanner errors

pub mod entities;
pub mod errors;
pub mod framer;
pub mod merkle;
pub mod reader;
pub mod value_objects;
