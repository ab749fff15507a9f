//! # Domain Layer

pub mod chunk;
pub mod errors;
pub mod types;
