//! Iterative graph resolution: rewrites a task set by applying ordered
//! resolver rules until a fixed point.

mod error;
mod rules;

pub use error::{Error, Result};
pub use rules::{
    DependencyResolverRule, RequiredLabelRule, ResolverRule, RuleOutcome, SubsequentRefsRule,
};

use inspect_task_model::Task;
use std::sync::Arc;

/// Bounds and knobs for [`GraphResolver::resolve`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum number of full rule passes before giving up with
    /// [`Error::DidNotConverge`].
    pub max_iterations: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
        }
    }
}

/// Applies an ordered pipeline of [`ResolverRule`]s to a task set until a
/// full pass leaves every rule reporting `changed = false`.
///
/// The default pipeline is R1 (required-label injection), R2
/// (priority-based dependency resolution), R3 (subsequent-refs rewiring),
/// in that order; callers needing a different pipeline can supply their
/// own via [`GraphResolver::with_rules`].
pub struct GraphResolver {
    rules: Vec<Box<dyn ResolverRule>>,
    config: ResolverConfig,
}

impl Default for GraphResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl GraphResolver {
    /// The default rule pipeline: R1, R2, R3.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            rules: vec![
                Box::new(RequiredLabelRule),
                Box::new(DependencyResolverRule),
                Box::new(SubsequentRefsRule),
            ],
            config,
        }
    }

    /// Build a resolver from a custom, ordered rule pipeline.
    #[must_use]
    pub fn with_rules(rules: Vec<Box<dyn ResolverRule>>, config: ResolverConfig) -> Self {
        Self { rules, config }
    }

    /// Resolve `required` against `catalog`, applying each rule in order
    /// and repeating until a pass changes nothing.
    ///
    /// # Errors
    /// Returns [`Error::UnresolvableDependency`] if a rule needs a
    /// reference the catalog cannot provide, or [`Error::DidNotConverge`]
    /// if the configured iteration bound is exhausted first.
    #[tracing::instrument(skip(self, required, catalog), fields(rules = self.rules.len()))]
    pub fn resolve(
        &self,
        required: Vec<Arc<dyn Task>>,
        catalog: &[Arc<dyn Task>],
    ) -> Result<Vec<Arc<dyn Task>>> {
        let mut tasks = required;

        for pass in 0..self.config.max_iterations {
            let mut pass_changed = false;

            for rule in &self.rules {
                let outcome = rule.apply(tasks, catalog)?;
                tasks = outcome.tasks;
                if outcome.changed {
                    tracing::debug!(rule = rule.name(), pass, "rule changed the graph");
                    pass_changed = true;
                }
            }

            if !pass_changed {
                tracing::info!(passes = pass + 1, tasks = tasks.len(), "resolver converged");
                return Ok(tasks);
            }
        }

        Err(Error::DidNotConverge)
    }
}
