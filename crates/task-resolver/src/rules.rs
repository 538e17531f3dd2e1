//! Pluggable resolver rules.
//!
//! Each rule is a pure function `(graph, catalog) -> (graph', changed)`,
//! modeled as a [`ResolverRule`] trait object so callers can extend or
//! reorder the default pipeline (required-label injection, then
//! priority-based dependency resolution, then subsequent-refs rewriting).

use crate::error::{Error, Result};
use async_trait::async_trait;
use inspect_task_model::{ImplementationId, Task, TaskContext, TaskError, TaskLabels, TaskValue};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Output of a single rule application: the (possibly rewritten) task list
/// and whether anything changed relative to the input.
pub struct RuleOutcome {
    /// The task list after this rule's rewrite.
    pub tasks: Vec<Arc<dyn Task>>,
    /// `false` signals this rule has reached a fixed point for this input.
    pub changed: bool,
}

/// A pluggable graph-rewriting rule.
pub trait ResolverRule: Send + Sync {
    /// Human-readable name used in tracing spans.
    fn name(&self) -> &'static str;

    /// Apply this rule once to `tasks`, consulting `catalog` for injection
    /// candidates.
    fn apply(&self, tasks: Vec<Arc<dyn Task>>, catalog: &[Arc<dyn Task>]) -> Result<RuleOutcome>;
}

/// Selects the catalog task providing `reference` with the highest
/// `selection-priority`, breaking ties by lexicographically smallest
/// implementation ID.
fn select_best<'a>(catalog: &'a [Arc<dyn Task>], reference: &str) -> Option<&'a Arc<dyn Task>> {
    let mut candidates: Vec<&Arc<dyn Task>> = catalog
        .iter()
        .filter(|t| t.id().reference() == reference)
        .collect();
    candidates.sort_by(|a, b| {
        b.labels()
            .selection_priority
            .cmp(&a.labels().selection_priority)
            .then_with(|| a.id().to_string().cmp(&b.id().to_string()))
    });
    candidates.into_iter().next()
}

/// Rule R1: inject every catalog task labeled `required = true` that is not
/// already present, by implementation ID.
pub struct RequiredLabelRule;

impl ResolverRule for RequiredLabelRule {
    fn name(&self) -> &'static str {
        "required-label-injection"
    }

    fn apply(&self, tasks: Vec<Arc<dyn Task>>, catalog: &[Arc<dyn Task>]) -> Result<RuleOutcome> {
        let existing: HashSet<ImplementationId> = tasks.iter().map(|t| t.id().clone()).collect();

        let mut to_add: Vec<&Arc<dyn Task>> = catalog
            .iter()
            .filter(|t| t.labels().required && !existing.contains(t.id()))
            .collect();
        to_add.sort_by_key(|t| t.id().to_string());

        let changed = !to_add.is_empty();
        let mut current = tasks;
        for task in to_add {
            tracing::debug!(id = %task.id(), "R1: injecting required task");
            current.push(Arc::clone(task));
        }
        Ok(RuleOutcome {
            tasks: current,
            changed,
        })
    }
}

/// Rule R2: resolve every dependency reference the graph needs but does not
/// yet provide, picking the highest-priority catalog implementation.
pub struct DependencyResolverRule;

impl ResolverRule for DependencyResolverRule {
    fn name(&self) -> &'static str {
        "dependency-priority-resolution"
    }

    fn apply(&self, tasks: Vec<Arc<dyn Task>>, catalog: &[Arc<dyn Task>]) -> Result<RuleOutcome> {
        let provided: HashSet<&str> = tasks.iter().map(|t| t.id().reference()).collect();
        let missing: BTreeSet<String> = tasks
            .iter()
            .flat_map(|t| t.dependencies().iter())
            .filter(|dep| !provided.contains(dep.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(RuleOutcome {
                tasks,
                changed: false,
            });
        }

        let mut current = tasks;
        for reference in missing {
            let candidate = select_best(catalog, &reference)
                .ok_or_else(|| Error::UnresolvableDependency(reference.clone()))?;
            tracing::debug!(reference = %reference, chosen = %candidate.id(), "R2: resolved dependency");
            current.push(Arc::clone(candidate));
        }

        Ok(RuleOutcome {
            tasks: current,
            changed: true,
        })
    }
}

/// Rule R3: for every task declaring `subsequent-refs`, ensure each named
/// reference gains a dependency back on the declaring task.
pub struct SubsequentRefsRule;

impl ResolverRule for SubsequentRefsRule {
    fn name(&self) -> &'static str {
        "subsequent-refs-rewriting"
    }

    fn apply(&self, tasks: Vec<Arc<dyn Task>>, catalog: &[Arc<dyn Task>]) -> Result<RuleOutcome> {
        let pairs: Vec<(String, String)> = tasks
            .iter()
            .flat_map(|t| {
                let originator = t.id().reference().to_string();
                t.labels()
                    .subsequent_refs
                    .iter()
                    .map(move |target| (originator.clone(), target.clone()))
            })
            .collect();

        let mut current = tasks;
        let mut changed = false;

        for (originator_ref, target_ref) in pairs {
            if !current.iter().any(|t| t.id().reference() == target_ref) {
                let candidate = select_best(catalog, &target_ref)
                    .ok_or_else(|| Error::UnresolvableDependency(target_ref.clone()))?;
                current.push(Arc::clone(candidate));
                changed = true;
            }

            for slot in &mut current {
                if slot.id().reference() != target_ref {
                    continue;
                }
                if slot.dependencies().contains(&originator_ref) {
                    continue;
                }
                let mut deps = slot.dependencies().to_vec();
                deps.push(originator_ref.clone());
                tracing::debug!(
                    target = %slot.id(),
                    originator = %originator_ref,
                    "R3: wiring subsequent-ref dependency"
                );
                *slot = Arc::new(DependencyOverriddenTask {
                    inner: Arc::clone(slot),
                    deps,
                });
                changed = true;
            }
        }

        Ok(RuleOutcome {
            tasks: current,
            changed,
        })
    }
}

/// Wraps a task, overriding its declared dependencies while preserving its
/// implementation ID, labels and behavior.
struct DependencyOverriddenTask {
    inner: Arc<dyn Task>,
    deps: Vec<String>,
}

#[async_trait]
impl Task for DependencyOverriddenTask {
    fn id(&self) -> &ImplementationId {
        self.inner.id()
    }

    fn dependencies(&self) -> &[String] {
        &self.deps
    }

    fn labels(&self) -> &TaskLabels {
        self.inner.labels()
    }

    async fn run(&self, ctx: &TaskContext) -> std::result::Result<TaskValue, TaskError> {
        self.inner.run(ctx).await
    }
}
