//! Tests for builders

use sage_jobs::builders::{build_pool, build_scheduler};
use sage_jobs::config::SchedulerConfig;
use sage_jobs::core::SchedulerError;

#[test]
fn test_build_pool() {
    let cfg = SchedulerConfig::new().with_worker_count(2);
    let pool = build_pool(&cfg).expect("Failed to build pool");
    assert_eq!(pool.thread_count(), 2);
    assert_eq!(pool.enqueue(|| 21 * 2).unwrap().wait().unwrap(), 42);
}

#[test]
fn test_build_scheduler() {
    let cfg = SchedulerConfig::new().with_worker_count(3);
    let scheduler = build_scheduler(&cfg).expect("Failed to build scheduler");
    assert!(scheduler.is_initialized());
    assert_eq!(scheduler.thread_count(), 3);
}

#[test]
fn test_build_with_invalid_config() {
    let cfg = SchedulerConfig::new().with_thread_stack_size(8);
    assert!(matches!(build_pool(&cfg), Err(SchedulerError::InvalidConfig(_))));
    assert!(matches!(build_scheduler(&cfg), Err(SchedulerError::InvalidConfig(_))));
}
