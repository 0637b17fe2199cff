//! # SAGE Jobs
//!
//! The engine's in-process concurrency scheduling core: a fixed-size worker
//! thread pool, a priority/FIFO dual-queue policy, dependency-aware job handles,
//! and batched parallel-for built on top of them.
//!
//! ## Components
//!
//! - **[`core::WorkerPool`]**: a fixed set of OS threads draining a priority
//!   max-heap and a FIFO queue under one mutex. The heap always wins, so FIFO work
//!   can starve under sustained prioritized load.
//! - **[`core::JobHandle`]**: a cloneable, shared completion counter. Waiting parks
//!   on a condition variable; continuations run when the counter reaches zero.
//! - **[`core::JobScheduler`]**: an explicit scheduler context that owns one pool
//!   and adds dependency-aware `schedule` and batched `parallel_for`.
//! - **[`core::parallel`]**: partition policies and blocking per-worker
//!   `parallel_for` / `parallel_for_each` that run on any pool.
//!
//! ## Worker pool
//!
//! ```rust
//! use sage_jobs::core::{Task, WorkerPool};
//!
//! let pool = WorkerPool::new(4)?;
//! let sum = pool.enqueue(|| (1..=10).sum::<u32>())?;
//! pool.enqueue_task(Task::new(|| println!("urgent"), 100))?;
//!
//! assert_eq!(sum.wait()?, 55);
//! pool.shutdown();
//! # Ok::<(), sage_jobs::core::PoolError>(())
//! ```
//!
//! ## Job scheduler
//!
//! ```rust
//! use sage_jobs::config::SchedulerConfig;
//! use sage_jobs::builders::build_scheduler;
//!
//! let scheduler = build_scheduler(&SchedulerConfig::new().with_worker_count(2))?;
//!
//! let physics = scheduler.schedule(|| println!("step physics"), 10, &[])?;
//! let render = scheduler.schedule(|| println!("build draw lists"), 0, &[physics])?;
//! render.wait();
//!
//! scheduler.log_stats();
//! scheduler.shutdown();
//! # Ok::<(), sage_jobs::core::SchedulerError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, pool, handles and scheduler.
pub mod core;
/// Configuration models for pools and schedulers.
pub mod config;
/// Builders to construct pools and schedulers from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
