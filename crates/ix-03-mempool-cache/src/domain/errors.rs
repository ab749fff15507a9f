use thiserror::Error;

/// Errors from the mempool feed path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MempoolError {
    /// The node's health call failed or returned something unparseable.
    #[error("Health check failed: {0}")]
    HealthCheck(String),

    /// The feed connection failed.
    #[error("Feed error: {0}")]
    Feed(String),
}
