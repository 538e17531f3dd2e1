//! The context-carried value types a run assembles before tasks execute.
//!
//! `TaskResultMap` is [`inspect_task_runner::ResultMap`] itself, inserted
//! into the [`inspect_task_model::TaskContext`] by
//! [`inspect_task_runner::LocalRunner::run`]; the three types below are
//! defined here and inserted by the caller before `run` is invoked. All
//! four live in the same typed registry, keyed by their own `TypeId`, so a
//! task reads them with `ctx.get::<T>().await` or `ctx.with::<T, _>(...)`.

use std::collections::HashMap;
use std::sync::RwLock;

/// Cross-task scratch store, keyed by the caller's own typed keys.
///
/// Unlike `TaskResultMap`, which is reference-keyed and populated only by
/// a task's own successful return value, this map is free-form: any task
/// can stash and retrieve arbitrary typed values under arbitrary string
/// keys, for state that doesn't fit the reference/result model (partial
/// progress, a resolved client handle, a parsed filter).
#[derive(Default)]
pub struct InspectionSharedMap {
    values: RwLock<HashMap<String, Box<dyn std::any::Any + Send + Sync>>>,
}

impl InspectionSharedMap {
    /// An empty shared map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous value there.
    pub fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.into(), Box::new(value));
    }

    /// Clone out the value stored under `key`, if present and of type `T`.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        self.values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }
}

/// A single form-field hint: an input-validation error attached to a named
/// field rather than surfaced as a runner failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFieldHint {
    /// The `requested-resource-name` label (or other field identifier)
    /// this hint is attached to.
    pub field: String,
    /// Human-readable validation message, e.g. `"invalid input"`.
    pub message: String,
}

/// User-visible metadata accumulated over a run: the query text a task
/// resolved, any error messages set for display, and form-field validation
/// hints. Distinct from `TaskResultMap`/`InspectionSharedMap`, which are
/// task-to-task plumbing the user never sees.
#[derive(Default)]
pub struct InspectionRunMetadata {
    query: RwLock<Option<String>>,
    errors: RwLock<Vec<String>>,
    form_fields: RwLock<Vec<FormFieldHint>>,
}

impl InspectionRunMetadata {
    /// Fresh, empty metadata for a run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the query text a task resolved for this run.
    pub fn set_query(&self, query: impl Into<String>) {
        *self.query.write().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(query.into());
    }

    /// The query text set so far, if any.
    #[must_use]
    pub fn query(&self) -> Option<String> {
        self.query.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Append a user-visible error message.
    pub fn push_error(&self, message: impl Into<String>) {
        self.errors
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message.into());
    }

    /// All user-visible error messages recorded so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Attach an input-validation hint to a form field.
    pub fn push_form_field_hint(&self, hint: FormFieldHint) {
        self.form_fields
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(hint);
    }

    /// All form-field hints recorded so far.
    #[must_use]
    pub fn form_field_hints(&self) -> Vec<FormFieldHint> {
        self.form_fields.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

/// Caller-supplied form inputs for this run, as a string-keyed map.
///
/// Read-only once constructed: the caller assembles it from the inspection
/// form before the run starts, and tasks only read from it via
/// `requested-resource-name` labels.
#[derive(Debug, Clone, Default)]
pub struct InspectionTaskInput {
    fields: HashMap<String, String>,
}

impl InspectionTaskInput {
    /// Build an input set from caller-supplied fields.
    #[must_use]
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// The value supplied for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}
