//! Native implementation of `WorkerPool` using OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: idle workers block on a `Condvar`; `wait_all` blocks on a second one
//! - **One lock**: both queues, the stop transition and the active-task accounting
//!   that `wait_all` depends on are changed under the same `parking_lot::Mutex`
//! - **Drain on shutdown**: workers exit only once stop is set *and* both queues are empty
//! - **Panic isolation**: every task runs inside `catch_unwind`; a worker never dies with its task

use std::cell::Cell;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::bounded;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::core::task::{Job, Task};

use super::{panic_message, PoolCounters, PoolError, PoolStats, TaskFuture};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Id of the pool owning the current thread, 0 outside any worker.
    static CURRENT_POOL: Cell<u64> = const { Cell::new(0) };
}

/// The two queues drained by the workers.
struct Queues {
    priority: BinaryHeap<Task>,
    fifo: VecDeque<Job>,
}

impl Queues {
    fn new() -> Self {
        Self {
            priority: BinaryHeap::new(),
            fifo: VecDeque::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.fifo.is_empty()
    }

    fn len(&self) -> usize {
        self.priority.len() + self.fifo.len()
    }

    /// Priority heap first, FIFO only when the heap is empty.
    fn pop(&mut self) -> Option<Job> {
        self.priority
            .pop()
            .map(Task::into_job)
            .or_else(|| self.fifo.pop_front())
    }
}

enum Lane {
    Priority(Task),
    Fifo(Job),
}

/// State shared between the pool handle and its workers.
pub(crate) struct Shared {
    id: u64,
    queues: Mutex<Queues>,
    work_available: Condvar,
    all_quiescent: Condvar,
    stop: AtomicBool,
    counters: PoolCounters,
}

impl Shared {
    fn new() -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            queues: Mutex::new(Queues::new()),
            work_available: Condvar::new(),
            all_quiescent: Condvar::new(),
            stop: AtomicBool::new(false),
            counters: PoolCounters::default(),
        }
    }

    fn is_current_worker(&self) -> bool {
        CURRENT_POOL.with(|current| current.get() == self.id)
    }

    fn push(&self, lane: Lane, allow_while_draining: bool) -> Result<(), PoolError> {
        {
            let mut queues = self.queues.lock();
            if self.stop.load(Ordering::Acquire)
                && !(allow_while_draining && self.is_current_worker())
            {
                error!(pool_id = self.id, "Cannot enqueue on a stopped worker pool");
                return Err(PoolError::PoolShutdown);
            }
            match lane {
                Lane::Priority(task) => queues.priority.push(task),
                Lane::Fifo(job) => queues.fifo.push_back(job),
            }
        }
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        self.work_available.notify_one();
        Ok(())
    }

    /// Push a task released by a completed dependency.
    ///
    /// Unlike regular submissions this is still accepted while the pool drains
    /// for shutdown, provided the caller is one of this pool's workers: that
    /// worker is alive and will pick the task up after its current one.
    pub(crate) fn submit_deferred(&self, task: Task) -> Result<(), PoolError> {
        self.push(Lane::Priority(task), true)
    }
}

/// Worker pool with a fixed set of dedicated OS threads.
///
/// The pool is shut down (draining queued work) when dropped.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    thread_count: usize,
}

impl WorkerPool {
    /// Create a pool with `thread_count` workers; `0` means one per hardware thread
    /// (falling back to 4 when that cannot be determined).
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Internal` if a worker thread could not be spawned.
    pub fn new(thread_count: usize) -> Result<Self, PoolError> {
        Self::with_config(&SchedulerConfig::new().with_worker_count(thread_count))
    }

    /// Create a pool from a full configuration.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration does not validate
    /// - `PoolError::Internal` if a worker thread could not be spawned
    pub fn with_config(config: &SchedulerConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let thread_count = config.resolved_worker_count();
        let shared = Arc::new(Shared::new());
        let mut workers = Vec::with_capacity(thread_count);

        for worker_id in 0..thread_count {
            match spawn_worker(worker_id, Arc::clone(&shared), config) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    error!(worker_id = worker_id, error = %e, "Failed to spawn worker thread");
                    let partial = Self {
                        shared,
                        thread_count: workers.len(),
                        workers: Mutex::new(workers),
                    };
                    partial.shutdown();
                    return Err(PoolError::Internal(format!(
                        "failed to spawn worker thread {worker_id}: {e}"
                    )));
                }
            }
        }

        info!(
            pool_id = shared.id,
            thread_count = thread_count,
            "WorkerPool started"
        );

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            thread_count,
        })
    }

    /// Submit a closure to the FIFO queue and get a future for its result.
    ///
    /// A panic inside `func` is logged by the worker and delivered through the
    /// returned future as `PoolError::TaskPanicked`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::PoolShutdown` (and logs) if the pool has begun stopping.
    pub fn enqueue<F, T>(&self, func: F) -> Result<TaskFuture<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let job: Job = Box::new(move || match panic::catch_unwind(AssertUnwindSafe(func)) {
            Ok(value) => {
                let _ = tx.send(Ok(value));
            }
            Err(payload) => {
                let _ = tx.send(Err(panic_message(payload.as_ref())));
                // Re-raise without invoking the panic hook again so the worker
                // loop still logs and counts the failure.
                panic::resume_unwind(payload);
            }
        });

        self.shared.push(Lane::Fifo(job), false)?;
        Ok(TaskFuture::new(rx))
    }

    /// Submit a prioritized, fire-and-forget task to the priority heap.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::PoolShutdown` (and logs) if the pool has begun
    /// stopping; the task is dropped without running.
    pub fn enqueue_task(&self, task: Task) -> Result<(), PoolError> {
        debug!(priority = task.priority(), "Task submitted to priority queue");
        self.shared.push(Lane::Priority(task), false)
    }

    /// Block until both queues are empty and no task is executing.
    ///
    /// This is a best-effort snapshot when other threads keep submitting. Calling
    /// it from one of this pool's own workers never returns, since the caller
    /// itself counts as active.
    pub fn wait_all(&self) {
        let shared = &self.shared;
        let mut queues = shared.queues.lock();
        shared.all_quiescent.wait_while(&mut queues, |q| {
            !q.is_empty() || shared.counters.active_tasks.load(Ordering::Acquire) > 0
        });
    }

    /// Stop accepting work, let the workers drain what is queued, and join them.
    ///
    /// Idempotent. When invoked from one of the pool's own workers, that worker is
    /// not joined; it exits on its own once the queues are drained.
    pub fn shutdown(&self) {
        {
            let _queues = self.shared.queues.lock();
            if self.shared.stop.swap(true, Ordering::AcqRel) {
                return;
            }
        }

        info!(pool_id = self.shared.id, "Shutting down worker pool");
        self.shared.work_available.notify_all();

        let workers = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        for (idx, worker) in workers.into_iter().enumerate() {
            if worker.thread().id() == current {
                warn!(worker_id = idx, "Shutdown requested from inside a worker; not joining it");
                continue;
            }
            match worker.join() {
                Ok(()) => debug!(worker_id = idx, "Worker joined"),
                Err(_) => warn!(worker_id = idx, "Worker panicked outside of a task"),
            }
        }

        info!(
            pool_id = self.shared.id,
            thread_count = self.thread_count,
            "Worker pool shut down complete"
        );
    }

    /// Whether `shutdown` has begun.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.stop.load(Ordering::Acquire)
    }

    /// Number of worker threads, fixed at construction.
    #[must_use]
    pub const fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Tasks executing right now (racy snapshot).
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.shared.counters.active_tasks.load(Ordering::Relaxed)
    }

    /// Tasks waiting in either queue (racy snapshot).
    #[must_use]
    pub fn queued_tasks(&self) -> usize {
        self.shared.queues.lock().len()
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let queued = self.queued_tasks();
        self.shared.counters.snapshot(self.thread_count, queued)
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("pool_id", &self.shared.id)
            .field("thread_count", &self.thread_count)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    shared: Arc<Shared>,
    config: &SchedulerConfig,
) -> io::Result<JoinHandle<()>> {
    let mut builder =
        thread::Builder::new().name(format!("{}-{worker_id}", config.thread_name_prefix));
    if let Some(stack_size) = config.thread_stack_size {
        builder = builder.stack_size(stack_size);
    }
    builder.spawn(move || worker_loop(worker_id, &shared))
}

fn worker_loop(worker_id: usize, shared: &Shared) {
    CURRENT_POOL.with(|current| current.set(shared.id));
    debug!(worker_id = worker_id, "Worker thread started");

    loop {
        let job = {
            let mut queues = shared.queues.lock();
            shared.work_available.wait_while(&mut queues, |q| {
                q.is_empty() && !shared.stop.load(Ordering::Acquire)
            });
            // Empty here means stop is set and nothing is left to drain.
            let Some(job) = queues.pop() else {
                break;
            };
            shared.counters.active_tasks.fetch_add(1, Ordering::AcqRel);
            job
        };

        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => {
                shared.counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                shared.counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                error!(
                    worker_id = worker_id,
                    panic = %panic_message(payload.as_ref()),
                    "Task panicked"
                );
            }
        }

        {
            let _queues = shared.queues.lock();
            shared.counters.active_tasks.fetch_sub(1, Ordering::AcqRel);
        }
        shared.all_quiescent.notify_all();
    }

    debug!(worker_id = worker_id, "Worker thread exiting");
}
