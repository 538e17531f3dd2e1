//! Typed labels attached to a task definition.

/// Default `selection-priority` when a task implementation declares none.
pub const DEFAULT_SELECTION_PRIORITY: i64 = 0;

/// Typed key-value labels carried by a [`crate::Task`].
///
/// Carries `required`, `selection-priority`, `subsequent-refs`, `feature`,
/// and `requested-resource-name`.
#[derive(Debug, Clone, Default)]
pub struct TaskLabels {
    /// Forces inclusion via resolver rule R1 regardless of whether anything
    /// in the graph depends on this task.
    pub required: bool,
    /// Tie-breaker used by resolver rule R2 when multiple tasks provide the
    /// same reference.
    pub selection_priority: i64,
    /// Tasks that, if present in the graph, must gain a dependency on this
    /// task (resolver rule R3).
    pub subsequent_refs: Vec<String>,
    /// Pure metadata for visualization: rendered as a double circle by
    /// `dump_graphviz`.
    pub feature: bool,
    /// Optional input-form hook; not interpreted by the engine itself.
    pub requested_resource_name: Option<String>,
}

impl TaskLabels {
    /// A label set with only `required` set, as a convenience for tasks
    /// built by resolver rule R1 test fixtures.
    #[must_use]
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// Builder-style setter for `selection_priority`.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.selection_priority = priority;
        self
    }

    /// Builder-style setter for `subsequent_refs`.
    #[must_use]
    pub fn with_subsequent_refs(mut self, refs: Vec<String>) -> Self {
        self.subsequent_refs = refs;
        self
    }

    /// Builder-style setter for `feature`.
    #[must_use]
    pub fn with_feature(mut self, feature: bool) -> Self {
        self.feature = feature;
        self
    }
}
