//! Task references and implementation identifiers.

use std::fmt;

/// Hash suffix used when a task implementation does not declare its own.
pub const DEFAULT_IMPLEMENTATION_HASH: &str = "default";

/// A stable string identifying a capability a task provides.
///
/// Several tasks may share a reference if they are alternative
/// implementations of the same capability; they are distinguished by their
/// implementation hash.
pub type TaskRef = String;

/// `(reference, implementation-hash)`, rendered as `reference#hash`.
///
/// Uniqueness invariant: within one task set, all implementation IDs are
/// distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImplementationId {
    reference: String,
    hash: String,
}

impl ImplementationId {
    /// Build an implementation ID from a reference and hash.
    pub fn new(reference: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            hash: hash.into(),
        }
    }

    /// Build an implementation ID using the default hash.
    pub fn with_default_hash(reference: impl Into<String>) -> Self {
        Self::new(reference, DEFAULT_IMPLEMENTATION_HASH)
    }

    /// The task reference this implementation provides.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The implementation hash distinguishing this alternative.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The canonical string form, `reference#hash`.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// Whether this implementation provides the given reference, i.e.
    /// whether its reference component matches exactly.
    #[must_use]
    pub fn provides(&self, reference: &str) -> bool {
        self.reference == reference
    }
}

impl fmt::Display for ImplementationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.reference, self.hash)
    }
}

/// Parses the `reference#hash` form back into an [`ImplementationId`].
///
/// References never contain `#`, so splitting on the first occurrence is
/// unambiguous.
impl std::str::FromStr for ImplementationId {
    type Err = ParseImplementationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('#') {
            Some((reference, hash)) if !reference.is_empty() => {
                Ok(Self::new(reference, hash))
            }
            _ => Err(ParseImplementationIdError(s.to_string())),
        }
    }
}

/// Error returned when a string does not parse as `reference#hash`.
#[derive(Debug, thiserror::Error)]
#[error("invalid implementation id: {0:?} (expected \"reference#hash\")")]
pub struct ParseImplementationIdError(String);
