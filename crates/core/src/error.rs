//! The error taxonomy a caller assembling an inspection run sees: graph
//! construction, resolution and execution errors from the engine crates,
//! plus fetch and input-validation errors from the collaborator layer.

use thiserror::Error;

/// Unified error type spanning the engine and its collaborators.
///
/// Configuration errors ([`Error::Graph`], [`Error::Resolver`]) are surfaced
/// synchronously before a [`inspect_task_runner::LocalRunner`] ever starts.
/// [`Error::RunFailed`] and [`Error::Cancelled`] come from a finished run's
/// outcome; [`Error::Fetch`] comes from the log-fetch stack. Input
/// validation errors are not represented here at all: they are surfaced as
/// form-field hints via [`crate::InspectionRunMetadata`], never as a runner
/// failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Duplicate implementation ID, missing dependency, or cyclic
    /// dependency, detected while building or sorting a task set.
    #[error(transparent)]
    Graph(#[from] inspect_task_graph::Error),
    /// An unresolvable dependency or resolver non-convergence.
    #[error(transparent)]
    Resolver(#[from] inspect_task_resolver::Error),
    /// The runner itself was misused (not runnable, run called twice).
    #[error(transparent)]
    Runner(#[from] inspect_task_runner::Error),
    /// A log fetch failed or observed an invalid resource name.
    #[error(transparent)]
    Fetch(#[from] inspect_log_fetch::Error),
    /// A task in a finished run failed; carries the first failure's
    /// message, already naming the offending implementation ID.
    #[error("{0}")]
    RunFailed(String),
    /// The caller's context was cancelled and no task itself failed.
    #[error("cancelled")]
    Cancelled,
}

/// Convert a finished run's outcome into a `Result`: a task's own error
/// always takes precedence over cancellation.
pub fn outcome_to_result(
    outcome: inspect_task_runner::RunOutcome,
) -> Result<inspect_task_runner::ResultMap, Error> {
    match outcome {
        inspect_task_runner::RunOutcome::Completed(results) => Ok(results),
        inspect_task_runner::RunOutcome::Failed(message) => Err(Error::RunFailed(message)),
        inspect_task_runner::RunOutcome::Cancelled => Err(Error::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspect_task_runner::{ResultMap, RunOutcome};

    #[test]
    fn completed_outcome_yields_results() {
        let result = outcome_to_result(RunOutcome::Completed(ResultMap::new()));
        assert!(result.is_ok());
    }

    #[test]
    fn failed_outcome_takes_precedence_and_is_reported() {
        let result = outcome_to_result(RunOutcome::Failed("task foo#default failed: boom".into()));
        assert!(matches!(result, Err(Error::RunFailed(m)) if m.contains("boom")));
    }

    #[test]
    fn cancelled_outcome_is_reported_as_cancelled() {
        let result = outcome_to_result(RunOutcome::Cancelled);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
