//! Core scheduling abstractions: tasks, the worker pool, job handles and the scheduler.

pub mod error;
pub mod job_handle;
pub mod job_scheduler;
pub mod parallel;
pub mod task;
pub mod worker_pool;

pub use error::{AppResult, SchedulerError};
pub use job_handle::JobHandle;
pub use job_scheduler::{JobScheduler, JobSchedulerGuard};
pub use parallel::{parallel_for, parallel_for_each, Partition};
pub use task::{Job, Task, DEFAULT_PRIORITY};
pub use worker_pool::{PoolError, PoolStats, TaskFuture, WorkerPool, DEFAULT_WORKER_COUNT};
