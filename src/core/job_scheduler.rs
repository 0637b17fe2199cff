//! Dependency-aware job scheduling on top of a [`WorkerPool`].
//!
//! A `JobScheduler` is an explicit context object: the application creates one
//! at its composition root, initializes it, and hands references to whatever
//! needs to submit work. There is no process-wide instance.
//!
//! The scheduler's lock is only held long enough to clone out the pool handle,
//! so blocking calls such as [`JobScheduler::wait_all`] never hold it while a
//! job on the pool submits more work.
//!
//! Dependencies never block a worker. A job with dependencies is parked as a
//! continuation on the merged dependency handle and pushed onto the priority
//! queue by whichever thread completes the last dependency, so dependency chains
//! of any depth run on any number of workers.
//!
//! ```rust
//! use sage_jobs::core::JobScheduler;
//!
//! let scheduler = JobScheduler::new();
//! scheduler.initialize(2)?;
//!
//! let load = scheduler.schedule(|| println!("load"), 0, &[])?;
//! let parse = scheduler.schedule(|| println!("parse"), 5, &[load.clone()])?;
//! let fill = scheduler.parallel_for(0, 1024, 64, |i| { let _ = i * 2; })?;
//!
//! parse.wait();
//! fill.wait();
//! scheduler.shutdown();
//! # Ok::<(), sage_jobs::core::SchedulerError>(())
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::core::job_handle::{CompletionGuard, JobHandle};
use crate::core::parallel::{self, Partition};
use crate::core::task::Task;
use crate::core::worker_pool::{PoolStats, WorkerPool};
use crate::core::SchedulerError;

/// Job scheduler context owning one worker pool.
#[derive(Default)]
pub struct JobScheduler {
    pool: RwLock<Option<Arc<WorkerPool>>>,
}

impl JobScheduler {
    /// An uninitialized scheduler; call [`JobScheduler::initialize`] before use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the worker pool with `thread_count` workers (`0` = hardware).
    ///
    /// Calling this while already initialized logs a warning and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Pool` if the pool could not be started.
    pub fn initialize(&self, thread_count: usize) -> Result<(), SchedulerError> {
        self.initialize_with(&SchedulerConfig::new().with_worker_count(thread_count))
    }

    /// Start the worker pool from a full configuration.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if the configuration does not validate
    /// - `SchedulerError::Pool` if the pool could not be started
    pub fn initialize_with(&self, config: &SchedulerConfig) -> Result<(), SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let mut slot = self.pool.write();
        if let Some(pool) = slot.as_ref() {
            warn!(
                thread_count = pool.thread_count(),
                "JobScheduler already initialized"
            );
            return Ok(());
        }

        let pool = WorkerPool::with_config(config)?;
        info!(
            thread_count = pool.thread_count(),
            "JobScheduler initialized"
        );
        *slot = Some(Arc::new(pool));
        Ok(())
    }

    /// Drain queued jobs, stop the workers and return to the uninitialized state.
    ///
    /// Idempotent. Jobs still waiting on dependencies when their release comes
    /// from outside the pool after this point are dropped with an error log.
    pub fn shutdown(&self) {
        let Some(pool) = self.pool.write().take() else {
            return;
        };
        pool.shutdown();
        info!("JobScheduler shutdown complete");
    }

    /// Whether a worker pool is live.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.pool.read().is_some()
    }

    /// Clone out the live pool; the read guard is released before returning.
    fn pool(&self) -> Option<Arc<WorkerPool>> {
        self.pool.read().clone()
    }

    fn with_pool<R>(
        &self,
        f: impl FnOnce(&WorkerPool) -> Result<R, SchedulerError>,
    ) -> Result<R, SchedulerError> {
        let pool = self.pool().ok_or(SchedulerError::NotInitialized)?;
        f(&pool)
    }

    /// Schedule `func` to run once every handle in `dependencies` is complete.
    ///
    /// Returns immediately with a pending handle that completes after `func`
    /// returns (or panics; the panic is logged by the worker). With no
    /// dependencies the job is queued at once; otherwise it is queued by the
    /// thread that completes the last dependency.
    ///
    /// Dependency cycles are not detected: such jobs never run.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::NotInitialized` if there is no live pool
    /// - `SchedulerError::Pool` if the pool rejected the job
    pub fn schedule<F>(
        &self,
        func: F,
        priority: i32,
        dependencies: &[JobHandle],
    ) -> Result<JobHandle, SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.with_pool(|pool| {
            let handle = JobHandle::new();
            let done = handle.clone();
            let task = Task::new(
                move || {
                    let _done = CompletionGuard::new(done);
                    func();
                },
                priority,
            );

            if dependencies.is_empty() {
                pool.enqueue_task(task)?;
                return Ok(handle);
            }

            debug!(
                priority = priority,
                dependencies = dependencies.len(),
                "Job deferred until dependencies complete"
            );
            let shared = pool.shared();
            JobHandle::when_all(dependencies).on_complete(move || {
                if let Err(e) = shared.submit_deferred(task) {
                    error!(error = %e, "Dependent job dropped; its handle will never complete");
                }
            });
            Ok(handle)
        })
    }

    /// Run `func(i)` for every `i` in `[start, end)` in batches of at most
    /// `batch_size` indices, returning one handle for the whole range.
    ///
    /// Indices inside a batch run in ascending order on one worker; batches run
    /// in parallel in no particular order. An empty range returns an already
    /// complete handle without scheduling anything.
    ///
    /// # Errors
    ///
    /// Same as [`JobScheduler::schedule`].
    pub fn parallel_for<F>(
        &self,
        start: usize,
        end: usize,
        batch_size: usize,
        func: F,
    ) -> Result<JobHandle, SchedulerError>
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        if batch_size == 0 {
            warn!("parallel_for called with batch_size 0; using 1");
        }
        self.parallel_for_with(start, end, Partition::Batched(batch_size), func)
    }

    /// [`JobScheduler::parallel_for`] with an explicit partition policy.
    ///
    /// # Errors
    ///
    /// Same as [`JobScheduler::schedule`].
    pub fn parallel_for_with<F>(
        &self,
        start: usize,
        end: usize,
        partition: Partition,
        func: F,
    ) -> Result<JobHandle, SchedulerError>
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        if start >= end {
            return Ok(JobHandle::completed());
        }

        self.with_pool(|pool| {
            let handle = JobHandle::new();
            let func = Arc::new(func);
            let chunks = partition.chunks(start, end, pool.thread_count());
            debug!(start, end, batches = chunks.len(), "parallel_for dispatch");

            for range in chunks {
                handle.add_dependency();
                // Moved into the task: completes the batch when it runs, or
                // undoes the registration if the task is dropped unrun.
                let batch_done = CompletionGuard::new(handle.clone());
                let func = Arc::clone(&func);
                pool.enqueue_task(Task::new(
                    move || {
                        let _batch_done = batch_done;
                        range.for_each(|i| func(i));
                    },
                    0,
                ))?;
            }

            handle.complete();
            Ok(handle)
        })
    }

    /// Blocking per-worker parallel-for on this scheduler's pool.
    ///
    /// # Errors
    ///
    /// `SchedulerError::NotInitialized`, or the pool error from
    /// [`parallel::parallel_for`].
    pub fn parallel_for_chunked<F>(
        &self,
        start: usize,
        end: usize,
        func: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.with_pool(|pool| Ok(parallel::parallel_for(pool, start, end, func)?))
    }

    /// Blocking per-worker parallel for-each on this scheduler's pool.
    ///
    /// # Errors
    ///
    /// `SchedulerError::NotInitialized`, or the pool error from
    /// [`parallel::parallel_for_each`].
    pub fn parallel_for_each<T, F>(
        &self,
        items: Vec<T>,
        func: F,
    ) -> Result<Vec<T>, SchedulerError>
    where
        T: Send + 'static,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.with_pool(|pool| Ok(parallel::parallel_for_each(pool, items, func)?))
    }

    /// Block until the whole pool is quiescent (no queued and no running tasks).
    ///
    /// This is a global condition, stronger than waiting on any one handle.
    /// Returns immediately when uninitialized.
    pub fn wait_all(&self) {
        if let Some(pool) = self.pool() {
            pool.wait_all();
        }
    }

    /// Worker thread count, or 0 when uninitialized.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.pool().map_or(0, |pool| pool.thread_count())
    }

    /// Pool statistics, or `None` when uninitialized.
    #[must_use]
    pub fn stats(&self) -> Option<PoolStats> {
        self.pool().map(|pool| pool.stats())
    }

    /// Log thread, active and queued task counts at info level.
    pub fn log_stats(&self) {
        let Some(stats) = self.stats() else {
            info!("JobScheduler stats: not initialized");
            return;
        };
        info!("JobScheduler stats:");
        info!("  thread count: {}", stats.worker_count);
        info!("  active tasks: {}", stats.active_tasks);
        info!("  queued tasks: {}", stats.queued_tasks);
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobScheduler")
            .field("pool", &*self.pool.read())
            .finish()
    }
}

/// Initializes a scheduler on construction and shuts it down when dropped.
///
/// ```rust
/// use sage_jobs::core::{JobScheduler, JobSchedulerGuard};
///
/// let scheduler = JobScheduler::new();
/// {
///     let jobs = JobSchedulerGuard::new(&scheduler, 2)?;
///     jobs.schedule(|| (), 0, &[])?.wait();
/// }
/// assert!(!scheduler.is_initialized());
/// # Ok::<(), sage_jobs::core::SchedulerError>(())
/// ```
#[must_use = "the scheduler is shut down as soon as the guard is dropped"]
pub struct JobSchedulerGuard<'a> {
    scheduler: &'a JobScheduler,
}

impl<'a> JobSchedulerGuard<'a> {
    /// Initialize `scheduler` with `thread_count` workers for the guard's scope.
    ///
    /// # Errors
    ///
    /// Same as [`JobScheduler::initialize`].
    pub fn new(scheduler: &'a JobScheduler, thread_count: usize) -> Result<Self, SchedulerError> {
        scheduler.initialize(thread_count)?;
        Ok(Self { scheduler })
    }
}

impl Deref for JobSchedulerGuard<'_> {
    type Target = JobScheduler;

    fn deref(&self) -> &JobScheduler {
        self.scheduler
    }
}

impl Drop for JobSchedulerGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}
