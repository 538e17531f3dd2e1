//! Task set construction and deterministic topological sort.
//!
//! Implements an immutable-once-sorted collection of task
//! definitions, duplicate-ID detection, Kahn's algorithm with a
//! deterministic lexicographic tie-break, and diagnosis of missing
//! dependencies or dependency cycles.

mod error;

pub use error::{Error, Result};

use inspect_task_model::{ImplementationId, Task};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// A sequence of task definitions, runnable only once topologically sorted.
///
/// Carries the task definitions plus a `runnable` flag, `false` until
/// [`TaskSet::sort`] succeeds and `true` afterward (in which case the
/// sequence is in topological order).
pub struct TaskSet {
    tasks: Vec<Arc<dyn Task>>,
    runnable: bool,
}

impl Default for TaskSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSet {
    /// An empty, unresolved task set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            runnable: false,
        }
    }

    /// Build a task set from an existing collection, checking for duplicate
    /// implementation IDs up front.
    pub fn from_tasks(tasks: Vec<Arc<dyn Task>>) -> Result<Self> {
        let mut set = Self::new();
        for task in tasks {
            set.add(task)?;
        }
        Ok(set)
    }

    /// Add a task, rejecting a duplicate implementation ID.
    ///
    /// Valid only while the set is not yet runnable; callers must treat a
    /// set returned by [`TaskSet::sort`] as frozen.
    pub fn add(&mut self, task: Arc<dyn Task>) -> Result<()> {
        if self.tasks.iter().any(|t| t.id() == task.id()) {
            return Err(Error::DuplicateImplementationId(task.id().to_string()));
        }
        tracing::debug!(id = %task.id(), "task added to set");
        self.tasks.push(task);
        Ok(())
    }

    /// Remove a task by implementation ID, returning whether it was present.
    pub fn remove(&mut self, id: &ImplementationId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id() != id);
        self.tasks.len() != before
    }

    /// The tasks currently in the set, in insertion (or, once runnable,
    /// topological) order.
    #[must_use]
    pub fn tasks(&self) -> &[Arc<dyn Task>] {
        &self.tasks
    }

    /// Whether this set has been successfully topologically sorted.
    #[must_use]
    pub const fn is_runnable(&self) -> bool {
        self.runnable
    }

    /// Number of tasks in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the set holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Consume the tasks, discarding sort state.
    #[must_use]
    pub fn into_tasks(self) -> Vec<Arc<dyn Task>> {
        self.tasks
    }

    /// Topologically sort this set using Kahn's algorithm.
    ///
    /// At each step, scans the remaining tasks in ascending lexicographic
    /// order of their implementation-ID strings and removes the first with
    /// every dependency already satisfied, so that the same input set
    /// always yields the same output order.
    ///
    /// A dependency on reference `R` is satisfied once any task whose
    /// implementation ID begins with `R#` has been placed; picking among
    /// several such implementations is the graph resolver's job (rule R2),
    /// not the sort's.
    #[must_use]
    pub fn sort(self) -> SortOutcome {
        let mut remaining = self.tasks;
        let mut sorted: Vec<Arc<dyn Task>> = Vec::with_capacity(remaining.len());
        let mut provided: HashSet<String> = HashSet::new();

        loop {
            let mut pick: Option<(usize, String)> = None;
            for (i, task) in remaining.iter().enumerate() {
                if task.dependencies().iter().all(|dep| provided.contains(dep)) {
                    let key = task.id().to_string();
                    if pick.as_ref().is_none_or(|(_, best)| key < *best) {
                        pick = Some((i, key));
                    }
                }
            }

            match pick {
                Some((i, _)) => {
                    let task = remaining.remove(i);
                    provided.insert(task.id().reference().to_string());
                    sorted.push(task);
                }
                None => break,
            }
        }

        if remaining.is_empty() {
            tracing::info!(count = sorted.len(), "task set sorted");
            return SortOutcome::Sorted(Self {
                tasks: sorted,
                runnable: true,
            });
        }

        let known_refs: HashSet<&str> = sorted
            .iter()
            .chain(remaining.iter())
            .map(|t| t.id().reference())
            .collect();
        let missing: BTreeSet<String> = remaining
            .iter()
            .flat_map(|t| t.dependencies().iter())
            .filter(|dep| !known_refs.contains(dep.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            tracing::warn!(?missing, "task set has missing dependencies");
            return SortOutcome::MissingDependencies(missing.into_iter().collect());
        }

        let description = diagnose_cycle(&remaining, &provided);
        tracing::warn!(%description, "task set has a dependency cycle");
        SortOutcome::Cyclic(description)
    }

    /// Dependency-level grouping of an already-sorted set: level 0 holds
    /// tasks with no dependencies, level N holds tasks whose deepest
    /// dependency sits at level N-1. Diagnostic only (used by graphviz rank
    /// hints); not on the execution critical path, which always schedules
    /// per task.
    #[must_use]
    pub fn levels(&self) -> Vec<Vec<&ImplementationId>> {
        let mut level_of_ref: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Vec<&ImplementationId>> = Vec::new();

        for task in &self.tasks {
            let level = task
                .dependencies()
                .iter()
                .filter_map(|dep| level_of_ref.get(dep.as_str()))
                .max()
                .map_or(0, |l| l + 1);
            level_of_ref.insert(task.id().reference(), level);
            if groups.len() <= level {
                groups.resize_with(level + 1, Vec::new);
            }
            groups[level].push(task.id());
        }

        groups
    }
}

impl fmt::Debug for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSet")
            .field("runnable", &self.runnable)
            .field(
                "tasks",
                &self.tasks.iter().map(|t| t.id().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Outcome of [`TaskSet::sort`]. Exactly one variant is ever produced.
#[derive(Debug)]
pub enum SortOutcome {
    /// Every task was placed; the wrapped set is runnable.
    Sorted(TaskSet),
    /// Dependency references with no providing task, sorted and deduplicated.
    MissingDependencies(Vec<String>),
    /// A human-readable description of a dependency cycle, naming every
    /// participating node at least once.
    Cyclic(String),
}

/// BFS from each remaining task along its unresolved dependency edges,
/// looking for a path back to its own starting node.
fn diagnose_cycle(remaining: &[Arc<dyn Task>], provided: &HashSet<String>) -> String {
    let mut by_ref: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, task) in remaining.iter().enumerate() {
        by_ref.entry(task.id().reference()).or_default().push(i);
    }

    for start in 0..remaining.len() {
        let mut parent: HashMap<usize, usize> = HashMap::new();
        let mut visited: HashSet<usize> = HashSet::from([start]);
        let mut queue: VecDeque<usize> = VecDeque::from([start]);

        while let Some(cur) = queue.pop_front() {
            for dep in remaining[cur].dependencies() {
                if provided.contains(dep) {
                    continue;
                }
                let Some(targets) = by_ref.get(dep.as_str()) else {
                    continue;
                };
                for &next in targets {
                    if next == start {
                        let mut path = vec![cur];
                        let mut node = cur;
                        while node != start {
                            node = parent[&node];
                            path.push(node);
                        }
                        path.reverse();
                        path.push(start);
                        return path
                            .iter()
                            .map(|&idx| remaining[idx].id().to_string())
                            .collect::<Vec<_>>()
                            .join(" -> ");
                    }
                    if visited.insert(next) {
                        parent.insert(next, cur);
                        queue.push_back(next);
                    }
                }
            }
        }
    }

    remaining
        .iter()
        .map(|t| t.id().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inspect_task_model::{TaskContext, TaskError, TaskLabels, TaskValue};

    struct StubTask {
        id: ImplementationId,
        deps: Vec<String>,
    }

    #[async_trait]
    impl Task for StubTask {
        fn id(&self) -> &ImplementationId {
            &self.id
        }
        fn dependencies(&self) -> &[String] {
            &self.deps
        }
        fn labels(&self) -> &TaskLabels {
            static EMPTY: std::sync::OnceLock<TaskLabels> = std::sync::OnceLock::new();
            EMPTY.get_or_init(TaskLabels::default)
        }
        async fn run(&self, _ctx: &TaskContext) -> std::result::Result<TaskValue, TaskError> {
            Ok(Box::new(()))
        }
    }

    fn stub(reference: &str, deps: &[&str]) -> Arc<dyn Task> {
        Arc::new(StubTask {
            id: ImplementationId::with_default_hash(reference),
            deps: deps.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn names(set: &TaskSet) -> Vec<String> {
        set.tasks().iter().map(|t| t.id().reference().to_string()).collect()
    }

    #[test]
    fn duplicate_implementation_id_rejected() {
        let mut set = TaskSet::new();
        set.add(stub("foo", &[])).unwrap();
        let err = set.add(stub("foo", &[])).unwrap_err();
        assert!(matches!(err, Error::DuplicateImplementationId(_)));
    }

    #[test]
    fn happy_path_sort_scenario() {
        // scenario 1.
        let mut set = TaskSet::new();
        set.add(stub("bar", &[])).unwrap();
        set.add(stub("foo", &["bar"])).unwrap();
        set.add(stub("quux", &["foo", "bar"])).unwrap();
        set.add(stub("qux", &["quux"])).unwrap();

        match set.sort() {
            SortOutcome::Sorted(sorted) => {
                assert_eq!(names(&sorted), vec!["bar", "foo", "quux", "qux"]);
            }
            other => panic!("expected Sorted, got {other:?}"),
        }
    }

    #[test]
    fn missing_dependency_scenario() {
        // scenario 2.
        let mut set = TaskSet::new();
        set.add(stub("bar", &[])).unwrap();
        set.add(stub("foo", &["bar", "missing-input-2"])).unwrap();
        set.add(stub("quux", &["foo", "bar"])).unwrap();
        set.add(stub("qux", &["quux", "missing-input-1"])).unwrap();

        match set.sort() {
            SortOutcome::MissingDependencies(missing) => {
                assert_eq!(missing, vec!["missing-input-1", "missing-input-2"]);
            }
            other => panic!("expected MissingDependencies, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_scenario() {
        // scenario 3.
        let mut set = TaskSet::new();
        set.add(stub("bar", &[])).unwrap();
        set.add(stub("foo", &["bar", "qux"])).unwrap();
        set.add(stub("quux", &["foo", "bar"])).unwrap();
        set.add(stub("qux", &["quux"])).unwrap();

        match set.sort() {
            SortOutcome::Cyclic(description) => {
                for node in ["foo", "quux", "qux"] {
                    assert!(description.contains(node), "missing {node} in {description}");
                }
            }
            other => panic!("expected Cyclic, got {other:?}"),
        }
    }

    #[test]
    fn empty_set_sorts_trivially() {
        let set = TaskSet::new();
        match set.sort() {
            SortOutcome::Sorted(sorted) => assert!(sorted.is_empty()),
            other => panic!("expected Sorted, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_cyclic() {
        let mut set = TaskSet::new();
        set.add(stub("foo", &["foo"])).unwrap();
        match set.sort() {
            SortOutcome::Cyclic(description) => assert!(description.contains("foo")),
            other => panic!("expected Cyclic, got {other:?}"),
        }
    }

    #[test]
    fn levels_group_by_dependency_depth() {
        let mut set = TaskSet::new();
        set.add(stub("qux", &[])).unwrap();
        set.add(stub("quux", &[])).unwrap();
        set.add(stub("bar", &["qux", "quux"])).unwrap();
        set.add(stub("foo", &["bar"])).unwrap();

        let SortOutcome::Sorted(sorted) = set.sort() else {
            panic!("expected Sorted");
        };
        let levels = sorted.levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].len(), 2);
        assert_eq!(levels[1].len(), 1);
        assert_eq!(levels[2].len(), 1);
    }
}
