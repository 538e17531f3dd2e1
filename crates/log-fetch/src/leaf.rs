//! The leaf log fetcher contract.

use crate::entry::{LogEntry, ResourceContainer};
use crate::error::Result;
use async_trait::async_trait;
use inspect_task_model::TaskContext;
use tokio::sync::mpsc;

/// Streams log entries from an upstream source into a sink channel.
///
/// Implementations must close `sink` on return, success or error (dropping
/// it is sufficient), and must stop producing once `ctx` is cancelled.
#[async_trait]
pub trait LogFetcher: Send + Sync {
    /// Stream matching entries, in timestamp-ascending order, until
    /// exhausted or `ctx` is cancelled.
    async fn fetch(
        &self,
        sink: mpsc::Sender<LogEntry>,
        ctx: TaskContext,
        filter: &str,
        container: &ResourceContainer,
        resource_names: &[String],
    ) -> Result<()>;
}

/// An in-memory [`LogFetcher`] test double with a fixed log set, used to
/// exercise the progress and partitioning layers without a real upstream.
#[derive(Debug, Clone, Default)]
pub struct StaticLogFetcher {
    entries: Vec<LogEntry>,
}

impl StaticLogFetcher {
    /// Build a fetcher that yields exactly `entries`, regardless of filter,
    /// container, or resource names. Entries are sorted by timestamp so the
    /// fetcher always honors ascending order.
    #[must_use]
    pub fn new(mut entries: Vec<LogEntry>) -> Self {
        entries.sort_by_key(|e| e.timestamp);
        Self { entries }
    }
}

#[async_trait]
impl LogFetcher for StaticLogFetcher {
    async fn fetch(
        &self,
        sink: mpsc::Sender<LogEntry>,
        ctx: TaskContext,
        _filter: &str,
        _container: &ResourceContainer,
        _resource_names: &[String],
    ) -> Result<()> {
        for entry in &self.entries {
            if ctx.is_cancelled() {
                return Err(crate::error::Error::Cancelled);
            }
            if sink.send(entry.clone()).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}
