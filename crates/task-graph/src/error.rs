//! Error types for task set construction and topological sort.

use thiserror::Error;

/// Errors produced while building or sorting a [`crate::TaskSet`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Two tasks in the same set declared the same implementation ID.
    #[error("duplicate task implementation id: {0}")]
    DuplicateImplementationId(String),
}

/// Result type for task-graph operations.
pub type Result<T> = std::result::Result<T, Error>;
