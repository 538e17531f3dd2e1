//! The process-wide default task registry.
//!
//! One global value exists for the life of the process: a catalog of task
//! factories keyed by implementation ID, built up by `register` calls
//! (typically from `inventory`-style static initialization in leaf-task
//! crates) and consulted by callers assembling the `catalog` argument to
//! [`inspect_task_resolver::GraphResolver::resolve`]. Keying by implementation
//! ID rather than reference lets several alternative implementations of the
//! same capability (e.g. `provider#default`, `provider#low`, `provider#high`)
//! coexist in the registry, so resolver rule R2 has more than one candidate
//! to choose from. Within a single run, callers always build a fresh catalog
//! snapshot from the registry; the registry itself is never mutated mid-run.

use inspect_task_model::Task;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

type Factory = Arc<dyn Fn() -> Arc<dyn Task> + Send + Sync>;

/// A process-wide catalog of task factories, keyed by implementation ID.
#[derive(Default)]
pub struct TaskRegistry {
    factories: RwLock<HashMap<String, Factory>>,
}

impl TaskRegistry {
    /// The process-wide default registry, initialized on first use.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<TaskRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::default)
    }

    /// Register a factory, replacing any previous factory for the same
    /// implementation ID. Several factories may share a reference as long as
    /// their implementation IDs differ, so the registry can hold multiple
    /// alternative implementations of one capability.
    pub fn register(&self, factory: impl Fn() -> Arc<dyn Task> + Send + Sync + 'static) {
        let factory: Factory = Arc::new(factory);
        let id = factory().id().to_string();
        self.factories
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, factory);
    }

    /// Build a fresh catalog by invoking every registered factory once.
    #[must_use]
    pub fn catalog(&self) -> Vec<Arc<dyn Task>> {
        self.factories
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .map(|factory| factory())
            .collect()
    }

    /// Number of implementations currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.read().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inspect_task_model::{ImplementationId, TaskContext, TaskError, TaskLabels, TaskValue};

    struct StubTask(ImplementationId);

    #[async_trait]
    impl Task for StubTask {
        fn id(&self) -> &ImplementationId {
            &self.0
        }
        fn dependencies(&self) -> &[String] {
            &[]
        }
        fn labels(&self) -> &TaskLabels {
            static EMPTY: std::sync::OnceLock<TaskLabels> = std::sync::OnceLock::new();
            EMPTY.get_or_init(TaskLabels::default)
        }
        async fn run(&self, _ctx: &TaskContext) -> Result<TaskValue, TaskError> {
            Ok(Box::new(()))
        }
    }

    #[test]
    fn register_and_build_catalog() {
        let registry = TaskRegistry::default();
        assert!(registry.is_empty());
        registry.register(|| Arc::new(StubTask(ImplementationId::with_default_hash("foo"))));
        assert_eq!(registry.len(), 1);
        let catalog = registry.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id().reference(), "foo");
    }

    #[test]
    fn alternative_implementations_of_one_reference_coexist() {
        let registry = TaskRegistry::default();
        registry.register(|| Arc::new(StubTask(ImplementationId::new("provider", "low"))));
        registry.register(|| Arc::new(StubTask(ImplementationId::new("provider", "high"))));
        assert_eq!(registry.len(), 2);
        let catalog = registry.catalog();
        assert!(catalog.iter().any(|t| t.id().hash() == "low"));
        assert!(catalog.iter().any(|t| t.id().hash() == "high"));
    }

    #[test]
    fn registering_same_implementation_id_replaces_it() {
        let registry = TaskRegistry::default();
        registry.register(|| Arc::new(StubTask(ImplementationId::with_default_hash("foo"))));
        registry.register(|| Arc::new(StubTask(ImplementationId::with_default_hash("foo"))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn global_registry_is_a_singleton() {
        let a = TaskRegistry::global() as *const TaskRegistry;
        let b = TaskRegistry::global() as *const TaskRegistry;
        assert_eq!(a, b);
    }
}
