//! Error types for leaf, progress, and partitioned fetching.

use thiserror::Error;

/// Errors produced while fetching or partitioning logs.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The leaf upstream failed; carries its raw message.
    #[error("log fetch failed: {0}")]
    Upstream(String),
    /// The upstream reported an authentication failure specifically.
    #[error("unauthenticated")]
    Unauthenticated,
    /// A resource name did not match a recognized container prefix.
    #[error("invalid input: {0}")]
    InvalidResourceName(String),
    /// The caller's context was cancelled before the fetch completed.
    #[error("cancelled")]
    Cancelled,
}

/// Result type for fetcher operations.
pub type Result<T> = std::result::Result<T, Error>;
