//! Progress-reporting wrapper around a leaf fetcher.
//!
//! Grounded in `crates/events/src/bus.rs`'s mpsc-forwarding background task
//! and `crates/ci/src/executor/engine.rs`'s worker-spawn style: one task
//! forwards entries while sampling the running count and latest timestamp,
//! a second ticks progress samples on an interval, racing cancellation via
//! `tokio::select!`.

use crate::entry::{LogEntry, ResourceContainer};
use crate::error::{Error, Result};
use crate::leaf::LogFetcher;
use crate::progress::{FetchConfig, LogFetchProgress};
use chrono::{DateTime, Utc};
use inspect_task_model::TaskContext;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The channels and background task produced by a fetch call.
///
/// `logs` and `progress` stream concurrently; `task` resolves to the
/// fetch's eventual outcome once both channels have been drained and
/// closed.
pub struct FetchHandle {
    /// Log entries, in the order the upstream produced them.
    pub logs: mpsc::Receiver<LogEntry>,
    /// Progress samples, monotonic in `count`.
    pub progress: mpsc::Receiver<LogFetchProgress>,
    /// Resolves once the fetch finishes; carries the upstream's error, if
    /// any.
    pub task: JoinHandle<Result<()>>,
}

/// Wraps a [`LogFetcher`], adding periodic `{count, fraction}` emissions.
pub struct ProgressFetcher {
    inner: Arc<dyn LogFetcher>,
    config: FetchConfig,
}

impl ProgressFetcher {
    /// Build a progress-reporting wrapper around `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn LogFetcher>, config: FetchConfig) -> Self {
        Self { inner, config }
    }

    /// Start fetching `[begin, end]`, returning channels that stream
    /// immediately while the fetch runs in the background.
    #[allow(clippy::too_many_arguments)]
    pub fn fetch(
        &self,
        ctx: TaskContext,
        filter: String,
        container: ResourceContainer,
        resource_names: Vec<String>,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetchHandle {
        let (log_tx, log_rx) = mpsc::channel(self.config.channel_capacity);
        let (progress_tx, progress_rx) = mpsc::channel(self.config.channel_capacity);
        let inner = Arc::clone(&self.inner);
        let tick_interval = self.config.tick_interval;
        let begin_millis = begin.timestamp_millis();
        let end_millis = end.timestamp_millis();

        let task = tokio::spawn(async move {
            let _ = progress_tx.send(LogFetchProgress::zero()).await;

            let (inner_tx, mut inner_rx) = mpsc::channel::<LogEntry>(32);
            let latest_millis = Arc::new(AtomicI64::new(begin_millis));
            let count = Arc::new(AtomicU64::new(0));

            let forward_latest = Arc::clone(&latest_millis);
            let forward_count = Arc::clone(&count);
            let forward_task: JoinHandle<()> = tokio::spawn(async move {
                while let Some(entry) = inner_rx.recv().await {
                    forward_latest.fetch_max(entry.timestamp.timestamp_millis(), Ordering::SeqCst);
                    forward_count.fetch_add(1, Ordering::SeqCst);
                    if log_tx.send(entry).await.is_err() {
                        break;
                    }
                }
            });

            let tick_latest = Arc::clone(&latest_millis);
            let tick_count = Arc::clone(&count);
            let tick_progress_tx = progress_tx.clone();
            let tick_ctx = ctx.clone();
            let ticker: JoinHandle<()> = tokio::spawn(async move {
                let mut interval = tokio::time::interval(tick_interval);
                interval.tick().await;
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let latest = tick_latest.load(Ordering::SeqCst);
                            let c = tick_count.load(Ordering::SeqCst);
                            let fraction = fraction_of(begin_millis, end_millis, latest);
                            if tick_progress_tx.send(LogFetchProgress { count: c, fraction }).await.is_err() {
                                break;
                            }
                        }
                        () = tick_ctx.cancelled() => break,
                    }
                }
            });

            let fetch_result = inner
                .fetch(inner_tx, ctx.clone(), &filter, &container, &resource_names)
                .await;
            ticker.abort();

            match fetch_result {
                Ok(()) => {
                    let _ = forward_task.await;
                    let final_count = count.load(Ordering::SeqCst);
                    let _ = progress_tx.send(LogFetchProgress::complete(final_count)).await;
                    tracing::info!(count = final_count, "fetch complete");
                    Ok(())
                }
                Err(err) => {
                    forward_task.abort();
                    tracing::warn!(error = %err, "fetch failed, closing channels");
                    Err(err)
                }
            }
        });

        FetchHandle { logs: log_rx, progress: progress_rx, task }
    }
}

fn fraction_of(begin_millis: i64, end_millis: i64, latest_millis: i64) -> f32 {
    let span = (end_millis - begin_millis).max(1) as f64;
    (((latest_millis - begin_millis) as f64) / span).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::StaticLogFetcher;
    use chrono::TimeZone;
    use std::time::Duration;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn emits_zero_then_final_complete_sample() {
        let begin = ts(0);
        let end = ts(3600);
        let fetcher = StaticLogFetcher::new(vec![
            LogEntry::new(ts(900), "a"),
            LogEntry::new(ts(1800), "b"),
        ]);
        let progress = ProgressFetcher::new(
            Arc::new(fetcher),
            FetchConfig { tick_interval: Duration::from_millis(20), ..Default::default() },
        );
        let container = ResourceContainer::Project("p".to_string());
        let mut handle = progress.fetch(
            TaskContext::new(),
            String::new(),
            container,
            vec![],
            begin,
            end,
        );

        let mut logs = Vec::new();
        while let Some(entry) = handle.logs.recv().await {
            logs.push(entry);
        }
        assert_eq!(logs.len(), 2);

        let mut samples = Vec::new();
        while let Some(sample) = handle.progress.recv().await {
            samples.push(sample);
        }
        assert_eq!(samples.first(), Some(&LogFetchProgress::zero()));
        assert_eq!(samples.last(), Some(&LogFetchProgress::complete(2)));

        handle.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn upstream_error_closes_channels_without_final_sample() {
        struct FailingFetcher;
        #[async_trait::async_trait]
        impl LogFetcher for FailingFetcher {
            async fn fetch(
                &self,
                _sink: mpsc::Sender<LogEntry>,
                _ctx: TaskContext,
                _filter: &str,
                _container: &ResourceContainer,
                _resource_names: &[String],
            ) -> Result<()> {
                Err(Error::Upstream("boom".to_string()))
            }
        }

        let progress = ProgressFetcher::new(Arc::new(FailingFetcher), FetchConfig::default());
        let container = ResourceContainer::Project("p".to_string());
        let mut handle = progress.fetch(
            TaskContext::new(),
            String::new(),
            container,
            vec![],
            ts(0),
            ts(10),
        );

        assert!(handle.logs.recv().await.is_none());
        let samples: Vec<_> = std::iter::from_fn(|| handle.progress.try_recv().ok()).collect();
        assert!(!samples.iter().any(|s| (s.fraction - 1.0).abs() < f32::EPSILON));

        let err = handle.task.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
