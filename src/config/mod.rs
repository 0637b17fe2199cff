//! Configuration models for worker pools and the job scheduler.

pub mod pool;

pub use pool::{SchedulerConfig, DEFAULT_THREAD_NAME_PREFIX, MIN_THREAD_STACK_SIZE};
