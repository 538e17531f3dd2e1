//! Per-task status records.

use chrono::{DateTime, Utc};

/// A task's position in its worker's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerPhase {
    /// Waiting on dependencies or the run has not reached this task yet.
    #[default]
    Waiting,
    /// The task's `run` is executing.
    Running,
    /// The task finished, successfully, with an error, or cancelled.
    Stopped,
}

/// Status of a single task's worker, mutated only by its owning worker and
/// read by observers without additional synchronization beyond the
/// happens-before relationship established by the worker's own writes.
#[derive(Debug, Clone, Default)]
pub struct TaskStatus {
    /// Current lifecycle phase.
    pub phase: RunnerPhase,
    /// When the worker transitioned to `Running`.
    pub start: Option<DateTime<Utc>>,
    /// When the worker transitioned to `Stopped`.
    pub end: Option<DateTime<Utc>>,
    /// Error message if the task failed or was cancelled; `None` on success.
    pub error: Option<String>,
}
