//! Error types for graph resolution.

use thiserror::Error;

/// Errors produced while resolving a task graph.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// No available task in the catalog provides this reference.
    #[error("unresolvable dependency: {0}")]
    UnresolvableDependency(String),
    /// Rules did not reach a fixed point within the configured iteration bound.
    #[error("resolver did not converge")]
    DidNotConverge,
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;
