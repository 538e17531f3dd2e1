//! Result map: populated only on successful task completion, read
//! concurrently by dependents once their dependency wait succeeds.

use inspect_task_model::TaskValue;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Concurrent map of task reference -> type-erased result value.
///
/// Cloning is cheap: clones share the same underlying map, so dependents
/// observe results their dependency's worker wrote.
#[derive(Clone, Default)]
pub struct ResultMap {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>>,
}

impl ResultMap {
    /// Create an empty result map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a task's type-erased result under its reference string.
    pub async fn insert_value(&self, reference: impl Into<String>, value: TaskValue) {
        let value: Arc<dyn Any + Send + Sync> = Arc::from(value);
        self.inner.write().await.insert(reference.into(), value);
    }

    /// Read a typed result by reference. Returns `None`, without
    /// panicking, if the reference is absent or holds a value of a
    /// different type.
    pub async fn get<T: Send + Sync + 'static>(&self, reference: &str) -> Option<Arc<T>> {
        let guard = self.inner.read().await;
        let value = guard.get(reference)?;
        Arc::clone(value).downcast::<T>().ok()
    }

    /// Number of successfully completed tasks recorded so far.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no task has completed yet.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let map = ResultMap::new();
        map.insert_value("foo", Box::new(42i32)).await;
        assert_eq!(*map.get::<i32>("foo").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn missing_reference_returns_none() {
        let map = ResultMap::new();
        assert!(map.get::<i32>("missing").await.is_none());
    }

    #[tokio::test]
    async fn wrong_type_returns_none_not_panic() {
        let map = ResultMap::new();
        map.insert_value("foo", Box::new(42i32)).await;
        assert!(map.get::<String>("foo").await.is_none());
    }

    #[tokio::test]
    async fn len_tracks_insertions() {
        let map = ResultMap::new();
        assert!(map.is_empty().await);
        map.insert_value("foo", Box::new(1i32)).await;
        assert_eq!(map.len().await, 1);
    }
}
