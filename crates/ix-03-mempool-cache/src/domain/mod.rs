//! # Domain Layer

pub mod errors;
pub mod queue;
pub mod safe_mode;
pub mod value_objects;
