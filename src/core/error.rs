//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::worker_pool::PoolError;

/// Errors produced by the job scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler has no live worker pool.
    #[error("job scheduler is not initialized")]
    NotInitialized,
    /// Scheduler configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The underlying worker pool rejected or failed the operation.
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
