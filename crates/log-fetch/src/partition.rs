//! Time-partitioning fan-out fetcher.
//!
//! Grounded in `crates/ci/src/executor/engine.rs::execute_group`: a
//! `Semaphore` bounds how many of the `N` child fetches run at once, a
//! `JoinSet` drives them, and the first child error cancels the rest.

use crate::entry::{LogEntry, ResourceContainer};
use crate::error::{Error, Result};
use crate::leaf::LogFetcher;
use crate::progress::{FetchConfig, LogFetchProgress};
use crate::progress_fetcher::{FetchHandle, ProgressFetcher};
use chrono::{DateTime, Utc};
use inspect_task_model::TaskContext;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::{RwLock, Semaphore, mpsc};
use tokio::task::JoinSet;

/// Splits a time range into `N` equal sub-ranges and fans out through a
/// bounded work group of size `P`, aggregating child progress into one
/// stream.
pub struct PartitionedFetcher {
    fetcher: Arc<ProgressFetcher>,
    config: FetchConfig,
}

impl PartitionedFetcher {
    /// Build a partitioned fetcher around a leaf `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn LogFetcher>, config: FetchConfig) -> Self {
        let fetcher = Arc::new(ProgressFetcher::new(inner, config.clone()));
        Self { fetcher, config }
    }

    /// Start a partitioned fetch of `[begin, end]` split into `partitions`
    /// sub-ranges, run with at most `parallelism` concurrently.
    #[allow(clippy::too_many_arguments)]
    pub fn fetch(
        &self,
        ctx: TaskContext,
        filter: String,
        container: ResourceContainer,
        resource_names: Vec<String>,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        partitions: usize,
        parallelism: usize,
    ) -> FetchHandle {
        let boundaries = partition_boundaries(begin, end, partitions.max(1));
        let n = boundaries.len();
        let (log_tx, log_rx) = mpsc::channel(self.config.channel_capacity);
        let (progress_tx, progress_rx) = mpsc::channel(self.config.channel_capacity);
        let fetcher = Arc::clone(&self.fetcher);
        let aggregate_tick = self.config.aggregate_tick_interval;
        let parallelism = parallelism.max(1);

        let task = tokio::spawn(async move {
            let _ = progress_tx.send(LogFetchProgress::zero()).await;

            let partition_progress: Arc<RwLock<Vec<LogFetchProgress>>> =
                Arc::new(RwLock::new(vec![LogFetchProgress::zero(); n]));
            let semaphore = Arc::new(Semaphore::new(parallelism));
            let fan_out_ctx = ctx.child_token();
            let first_error: Arc<StdMutex<Option<Error>>> = Arc::new(StdMutex::new(None));

            let mut join_set: JoinSet<()> = JoinSet::new();
            for (idx, (pbegin, pend)) in boundaries.into_iter().enumerate() {
                let semaphore = Arc::clone(&semaphore);
                let fetcher = Arc::clone(&fetcher);
                let filter = filter.clone();
                let container = container.clone();
                let resource_names = resource_names.clone();
                let partition_progress = Arc::clone(&partition_progress);
                let outer_log_tx = log_tx.clone();
                let child_ctx = fan_out_ctx.clone();
                let first_error = Arc::clone(&first_error);

                join_set.spawn(async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return;
                    };
                    let FetchHandle { mut logs, mut progress, task } = fetcher.fetch(
                        child_ctx.clone(),
                        filter,
                        container,
                        resource_names,
                        pbegin,
                        pend,
                    );

                    loop {
                        tokio::select! {
                            Some(entry) = logs.recv() => {
                                if outer_log_tx.send(entry).await.is_err() {
                                    break;
                                }
                            }
                            Some(sample) = progress.recv() => {
                                partition_progress.write().await[idx] = sample;
                            }
                            else => break,
                        }
                    }

                    let outcome = match task.await {
                        Ok(result) => result,
                        Err(_join_error) => {
                            Err(Error::Upstream(format!("partition {idx} did not complete")))
                        }
                    };
                    if let Err(err) = outcome {
                        let mut guard = first_error.lock().unwrap_or_else(|e| e.into_inner());
                        if guard.is_none() {
                            *guard = Some(err);
                        }
                        child_ctx.cancel();
                    }
                });
            }

            let ticker_done = Arc::new(AtomicBool::new(false));
            let ticker = {
                let ticker_progress = Arc::clone(&partition_progress);
                let ticker_tx = progress_tx.clone();
                let ticker_done = Arc::clone(&ticker_done);
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(aggregate_tick);
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        if ticker_done.load(Ordering::SeqCst) {
                            break;
                        }
                        let (count, fraction) = {
                            let guard = ticker_progress.read().await;
                            let count: u64 = guard.iter().map(|p| p.count).sum();
                            let fraction = guard.iter().map(|p| p.fraction).sum::<f32>() / n as f32;
                            (count, fraction)
                        };
                        if ticker_tx.send(LogFetchProgress { count, fraction }).await.is_err() {
                            break;
                        }
                    }
                })
            };

            while join_set.join_next().await.is_some() {}
            ticker_done.store(true, Ordering::SeqCst);
            let _ = ticker.await;

            match first_error.lock().unwrap_or_else(|e| e.into_inner()).take() {
                Some(err) => {
                    tracing::warn!(error = %err, "partitioned fetch failed, cancelling siblings");
                    Err(err)
                }
                None => {
                    let total: u64 = partition_progress.read().await.iter().map(|p| p.count).sum();
                    let _ = progress_tx.send(LogFetchProgress::complete(total)).await;
                    tracing::info!(count = total, partitions = n, "partitioned fetch complete");
                    Ok(())
                }
            }
        });

        FetchHandle { logs: log_rx, progress: progress_rx, task }
    }
}

/// Split `[begin, end]` into `n` equal sub-ranges; the final boundary is
/// forced to `end` exactly, defending against floating duration drift.
fn partition_boundaries(
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    n: usize,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let span = end - begin;
    let step = span / i32::try_from(n).unwrap_or(i32::MAX);
    let mut boundaries = Vec::with_capacity(n);
    let mut cursor = begin;
    for i in 0..n {
        let next = if i + 1 == n { end } else { cursor + step };
        boundaries.push((cursor, next));
        cursor = next;
    }
    boundaries
}
