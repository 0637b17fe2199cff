//! Fixed-size worker thread pool with a priority heap and a FIFO queue.
//!
//! The `WorkerPool` owns a set of dedicated OS threads that drain two queues
//! guarded by a single mutex:
//!
//! - a **priority max-heap**, fed by [`WorkerPool::enqueue_task`], and
//! - a **FIFO queue**, fed by [`WorkerPool::enqueue`].
//!
//! Workers always drain the heap first and only look at the FIFO queue when the
//! heap is empty. Under a sustained stream of prioritized work, FIFO submissions
//! can therefore starve indefinitely.
//!
//! # Example
//!
//! ```rust
//! use sage_jobs::core::{Task, WorkerPool};
//!
//! let pool = WorkerPool::new(2)?;
//!
//! let answer = pool.enqueue(|| 6 * 7)?;
//! pool.enqueue_task(Task::new(|| println!("fire and forget"), 5))?;
//!
//! assert_eq!(answer.wait()?, 42);
//! pool.wait_all();
//! pool.shutdown();
//! # Ok::<(), sage_jobs::core::PoolError>(())
//! ```

mod future;
mod native;

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub use future::TaskFuture;
pub use native::WorkerPool;

/// Worker count used when hardware concurrency cannot be determined.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has begun stopping and no longer accepts work.
    PoolShutdown,

    /// The operation timed out.
    Timeout,

    /// The task panicked; carries the panic message.
    TaskPanicked(String),

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (thread spawn failure, result channel closed, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::TaskPanicked(msg) => write!(f, "task panicked: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Point-in-time statistics about pool utilization.
///
/// Every field is a racy snapshot meant for observability only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Tasks currently executing.
    pub active_tasks: usize,

    /// Tasks waiting in either queue.
    pub queued_tasks: usize,

    /// Total tasks accepted into a queue.
    pub submitted_tasks: u64,

    /// Total tasks that ran to completion.
    pub completed_tasks: u64,

    /// Total tasks that panicked.
    pub failed_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicUsize,
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, queued_tasks: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks,
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
        }
    }
}

/// Resolve a requested worker count: `0` means "one per hardware thread".
#[must_use]
pub fn resolve_worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    match num_cpus::get() {
        0 => DEFAULT_WORKER_COUNT,
        n => n,
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::PoolShutdown;
        assert_eq!(format!("{}", err), "pool has been shut down");

        let err = PoolError::TaskPanicked("boom".into());
        assert_eq!(format!("{}", err), "task panicked: boom");

        let err = PoolError::Timeout;
        assert_eq!(format!("{}", err), "operation timed out");
    }

    #[test]
    fn test_pool_stats_default() {
        let stats = PoolStats::default();
        assert_eq!(stats.worker_count, 0);
        assert_eq!(stats.active_tasks, 0);
        assert_eq!(stats.completed_tasks, 0);
    }

    #[test]
    fn test_pool_counters_snapshot() {
        let counters = PoolCounters::default();
        counters.submitted_tasks.fetch_add(10, Ordering::Relaxed);
        counters.completed_tasks.fetch_add(5, Ordering::Relaxed);
        counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
        counters.active_tasks.fetch_add(2, Ordering::Relaxed);

        let stats = counters.snapshot(4, 3);
        assert_eq!(stats.worker_count, 4);
        assert_eq!(stats.queued_tasks, 3);
        assert_eq!(stats.active_tasks, 2);
        assert_eq!(stats.submitted_tasks, 10);
        assert_eq!(stats.completed_tasks, 5);
        assert_eq!(stats.failed_tasks, 1);
    }

    #[test]
    fn test_resolve_worker_count() {
        assert_eq!(resolve_worker_count(3), 3);
        assert!(resolve_worker_count(0) >= 1);
    }

    #[test]
    fn test_panic_message_variants() {
        let static_payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(static_payload.as_ref()), "static str");

        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned_payload.as_ref()), "owned");

        let other_payload: Box<dyn Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(other_payload.as_ref()), "non-string panic payload");
    }
}
