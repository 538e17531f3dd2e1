//! Optional observation hook for per-task lifecycle events.
//!
//! Grounded in the `ProgressReporter` trait
//! (`crates/ci/src/report/progress.rs`) being injected into
//! `ExecutionEngine<R: ProgressReporter>`: the runner is generic over
//! nothing concrete, so any reporting sink (CLI, TUI, JSON) can subscribe
//! without the runner depending on it.

use async_trait::async_trait;
use inspect_task_model::ImplementationId;

/// Subscriber for per-task start/complete events during a run.
#[async_trait]
pub trait RunnerObserver: Send + Sync {
    /// Called when a task transitions from WAITING to RUNNING.
    async fn task_started(&self, _id: &ImplementationId) {}

    /// Called when a task transitions to STOPPED. `error` is `None` on
    /// success, `Some("cancelled")` on cancellation, or the task's own
    /// failure message otherwise.
    async fn task_completed(&self, _id: &ImplementationId, _error: Option<&str>) {}
}

/// A [`RunnerObserver`] that does nothing; the runner's default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

#[async_trait]
impl RunnerObserver for NoOpObserver {}
