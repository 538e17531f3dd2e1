//! The polymorphic task trait.
//!
//! Tasks are polymorphic over `{has-id, has-dependencies, has-labels, run}`.
//! We implement that as a trait object rather than an inheritance
//! hierarchy: a task set is a `Vec<Arc<dyn Task>>`.

use crate::context::TaskContext;
use crate::id::ImplementationId;
use crate::labels::TaskLabels;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;

/// A task's result value, type-erased inside the engine.
///
/// Callers that know the concrete type produced by a task reference can
/// recover it with `value.downcast_ref::<T>()`.
pub type TaskValue = Box<dyn Any + Send + Sync>;

/// Errors a task's `run` may return.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task's own failure, carrying a human-readable message.
    #[error("{0}")]
    Failed(String),
    /// The task observed cancellation and stopped without completing.
    #[error("cancelled")]
    Cancelled,
}

impl TaskError {
    /// Build a [`TaskError::Failed`] from any displayable message.
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }

    /// Whether this error represents cooperative cancellation rather than a
    /// task-reported failure (cancellation is not an execution error unless
    /// a task's own error also occurred).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A work unit: an implementation ID, its declared dependencies, its
/// labels, and its behavior.
///
/// `dependencies()` returns references (not implementation IDs) the task
/// consumes; resolving a reference to a concrete implementation is the
/// graph resolver's job, not the task's.
#[async_trait]
pub trait Task: Send + Sync {
    /// This task's implementation identifier. Unique within a task set.
    fn id(&self) -> &ImplementationId;

    /// References this task depends on, in declaration order.
    fn dependencies(&self) -> &[String];

    /// This task's labels.
    fn labels(&self) -> &TaskLabels;

    /// Execute the task's behavior.
    ///
    /// Implementations must poll `ctx.cancelled()` at their own suspension
    /// points and return `Err(TaskError::Cancelled)` promptly once it
    /// fires; the runner does not forcibly abort task bodies.
    async fn run(&self, ctx: &TaskContext) -> Result<TaskValue, TaskError>;
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id().to_string())
            .field("dependencies", &self.dependencies())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::FnTask;
    use super::*;

    #[tokio::test]
    async fn fn_task_runs_closure() {
        let task = FnTask {
            id: ImplementationId::with_default_hash("foo"),
            deps: vec![],
            labels: TaskLabels::default(),
            f: || Ok(Box::new(42i32) as TaskValue),
        };
        let ctx = TaskContext::new();
        let result = task.run(&ctx).await.unwrap();
        assert_eq!(*result.downcast_ref::<i32>().unwrap(), 42);
    }
}
