//! Error types for local task set execution.

use thiserror::Error;

/// Configuration errors surfaced synchronously; the runner never starts.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The task set passed to [`crate::LocalRunner::new`] was never
    /// successfully topologically sorted.
    #[error("task set is not runnable: it was never topologically sorted")]
    NotRunnable,
    /// [`crate::LocalRunner::run`] was called more than once.
    #[error("run already started")]
    AlreadyStarted,
}

/// Result type for runner construction/start operations.
pub type Result<T> = std::result::Result<T, Error>;
