//! Tracing setup for applications and tests driving the scheduler.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "sage_jobs=info";

/// Install a fmt subscriber that prints worker thread names, filtered by
/// `RUST_LOG` or [`DEFAULT_LOG_FILTER`].
///
/// Does nothing if a global subscriber is already installed, so it is safe to
/// call from every test.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_LOG_FILTER);
}

/// Like [`init_tracing`] with a caller-chosen fallback filter.
pub fn init_tracing_with(default_filter: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
