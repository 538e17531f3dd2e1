//! The per-run context threaded through task execution.
//!
//! Carries the run's cancellation signal plus an extensible, typed registry
//! used for the context-carried values (`TaskResultMap`, `InspectionSharedMap`,
//! `InspectionRunMetadata`, `InspectionTaskInput`): each is just a type stored
//! in this registry under its own `TypeId`, so `inspect-task-runner` and
//! `inspect-core` can define and insert their own value types without
//! `inspect-task-model` knowing about them.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

type AnyValue = Box<dyn Any + Send + Sync>;

#[derive(Default)]
struct Registry {
    values: RwLock<HashMap<TypeId, AnyValue>>,
}

/// Context passed to every [`crate::Task::run`] invocation.
///
/// Cloning a `TaskContext` is cheap: the cancellation token and registry are
/// shared, so inserting a value from one clone is visible through all
/// others.
#[derive(Clone)]
pub struct TaskContext {
    cancellation: CancellationToken,
    registry: Arc<Registry>,
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskContext {
    /// Create a fresh root context with its own cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            registry: Arc::new(Registry::default()),
        }
    }

    /// Derive a child context whose cancellation is linked to this one:
    /// cancelling the parent cancels the child, but not vice versa. The
    /// registry is shared so values inserted via the parent remain visible.
    #[must_use]
    pub fn child_token(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// The cancellation token for this run.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Request cancellation of this context and every derived child.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Suspend until cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Insert a value into the context's typed registry, keyed by its
    /// concrete type. Replaces any previous value of the same type.
    pub async fn insert<T: Send + Sync + 'static>(&self, value: T) {
        self.registry
            .values
            .write()
            .await
            .insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Clone out a value previously inserted under type `T`.
    pub async fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.registry
            .values
            .read()
            .await
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Run a closure against a reference to a value of type `T`, if present,
    /// without requiring `T: Clone`.
    pub async fn with<T: Send + Sync + 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.registry
            .values
            .read()
            .await
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .map(f)
    }
}
