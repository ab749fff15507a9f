//! # HTTP Middleware
//!
//! - `auth` - HTTP Basic credentials checked against the node RPC login

pub mod auth;
