//! Tests for utility functions

use sage_jobs::util::{init_tracing, init_tracing_with, DEFAULT_LOG_FILTER};

#[test]
fn test_init_tracing_is_repeatable() {
    init_tracing();
    init_tracing();
    init_tracing_with("sage_jobs=debug");
    assert!(tracing::dispatcher::has_been_set());
}

#[test]
fn test_default_filter_targets_crate() {
    assert!(DEFAULT_LOG_FILTER.starts_with("sage_jobs"));
}
