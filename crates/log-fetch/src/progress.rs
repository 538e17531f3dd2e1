//! Progress wire type and fetcher configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Progress sample published on a side channel during log fetching.
///
/// Wire format is exactly these two fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogFetchProgress {
    /// Running total of entries forwarded so far.
    pub count: u64,
    /// `(latestObservedLogTimestamp - beginTime) / (endTime - beginTime)`,
    /// clamped to `[0, 1]`.
    pub fraction: f32,
}

impl LogFetchProgress {
    /// The zero sample emitted at the start of every fetch.
    #[must_use]
    pub const fn zero() -> Self {
        Self { count: 0, fraction: 0.0 }
    }

    /// The forced-complete sample emitted once a fetch finishes
    /// successfully.
    #[must_use]
    pub const fn complete(count: u64) -> Self {
        Self { count, fraction: 1.0 }
    }
}

/// Tunables for the fetcher stack, styled on `EngineConfig`
/// (`crates/ci/src/executor/engine.rs`).
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Page size requested from the leaf upstream. Default 1000.
    pub page_size: usize,
    /// Interval between progress samples for a single fetch. Default 500ms.
    pub tick_interval: Duration,
    /// Interval between aggregate progress samples for a partitioned fetch.
    /// Default: double the child interval.
    pub aggregate_tick_interval: Duration,
    /// Channel capacity for log and progress streams.
    pub channel_capacity: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let tick_interval = Duration::from_millis(500);
        Self {
            page_size: 1000,
            tick_interval,
            aggregate_tick_interval: tick_interval * 2,
            channel_capacity: 256,
        }
    }
}
