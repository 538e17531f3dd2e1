//! Log entries and resource containers.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One log record streamed from an upstream source, in timestamp-ascending
/// order within a single partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the upstream recorded this entry.
    pub timestamp: DateTime<Utc>,
    /// The entry's payload, opaque to the engine (domain log parsing is
    /// out of scope here).
    pub payload: String,
}

impl LogEntry {
    /// Build a log entry.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, payload: impl Into<String>) -> Self {
        Self {
            timestamp,
            payload: payload.into(),
        }
    }
}

/// The scope a cloud operation runs against. Only `project` is recognized;
/// other prefixes are rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceContainer {
    /// `projects/<id>`.
    Project(String),
}

impl ResourceContainer {
    /// The canonical identifier string for this container, e.g.
    /// `projects/my-project`.
    #[must_use]
    pub fn identifier(&self) -> String {
        match self {
            Self::Project(id) => format!("projects/{id}"),
        }
    }
}

impl fmt::Display for ResourceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Parse a resource name's container prefix.
///
/// `projects/<id>[/...]` recognizes the project, ignoring any suffix.
/// Every other prefix (`organizations/`, `folders/`, `billingAccounts/`, or
/// anything unrecognized) is rejected.
impl FromStr for ResourceContainer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, '/');
        match (parts.next(), parts.next()) {
            (Some("projects"), Some(id)) if !id.is_empty() => Ok(Self::Project(id.to_string())),
            _ => Err(Error::InvalidResourceName(s.to_string())),
        }
    }
}

/// Group resource names by container and split each group into chunks of at
/// most `max_chunk` names.
///
/// Returns groups in the order their container was first seen, and chunks
/// in the order names were encountered within that group.
pub fn batch_resource_names(
    names: &[String],
    max_chunk: usize,
) -> Result<Vec<(ResourceContainer, Vec<Vec<String>>)>> {
    let mut order: Vec<ResourceContainer> = Vec::new();
    let mut grouped: std::collections::HashMap<ResourceContainer, Vec<String>> =
        std::collections::HashMap::new();

    for name in names {
        let container: ResourceContainer = name.parse()?;
        if !grouped.contains_key(&container) {
            order.push(container.clone());
        }
        grouped.entry(container).or_default().push(name.clone());
    }

    Ok(order
        .into_iter()
        .map(|container| {
            let names = grouped.remove(&container).unwrap_or_default();
            let chunks = names
                .chunks(max_chunk.max(1))
                .map(<[String]>::to_vec)
                .collect();
            (container, chunks)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_project_prefix() {
        let container: ResourceContainer = "projects/my-proj".parse().unwrap();
        assert_eq!(container, ResourceContainer::Project("my-proj".to_string()));
    }

    #[test]
    fn parses_project_with_suffix() {
        let container: ResourceContainer = "projects/my-proj/logs/foo".parse().unwrap();
        assert_eq!(container, ResourceContainer::Project("my-proj".to_string()));
    }

    #[test]
    fn rejects_unsupported_prefixes() {
        for bad in ["organizations/1", "folders/2", "billingAccounts/3", "garbage"] {
            let err = bad.parse::<ResourceContainer>().unwrap_err();
            assert!(matches!(err, Error::InvalidResourceName(_)));
        }
    }

    #[test]
    fn batches_by_container_and_chunk_size() {
        let names: Vec<String> = (0..250)
            .map(|i| format!("projects/p1/logs/{i}"))
            .collect();
        let batches = batch_resource_names(&names, 100).unwrap();
        assert_eq!(batches.len(), 1);
        let (container, chunks) = &batches[0];
        assert_eq!(*container, ResourceContainer::Project("p1".to_string()));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn batching_rejects_invalid_name() {
        let names = vec!["organizations/1".to_string()];
        assert!(batch_resource_names(&names, 100).is_err());
    }
}
