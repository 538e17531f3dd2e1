//! Library crates never install a global subscriber; only the binary that
//! embeds this engine does. This helper exists solely so tests across the
//! workspace can opt into seeing `tracing` output without each crate
//! re-implementing the same boilerplate.

/// Install a `tracing-subscriber` writer scoped to the test harness.
/// Safe to call from multiple tests: a second call is a silent no-op.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
