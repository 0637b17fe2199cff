//! Builders to construct worker pools and schedulers from configuration.

use tracing::debug;

use crate::config::SchedulerConfig;
use crate::core::{JobScheduler, SchedulerError, WorkerPool};

/// Validate `cfg` and start a standalone worker pool.
///
/// # Errors
///
/// - `SchedulerError::InvalidConfig` if the configuration does not validate
/// - `SchedulerError::Pool` if the pool could not be started
pub fn build_pool(cfg: &SchedulerConfig) -> Result<WorkerPool, SchedulerError> {
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;
    debug!(worker_count = cfg.worker_count, "Building worker pool");
    Ok(WorkerPool::with_config(cfg)?)
}

/// Validate `cfg` and return an initialized job scheduler.
///
/// # Errors
///
/// Same as [`build_pool`].
pub fn build_scheduler(cfg: &SchedulerConfig) -> Result<JobScheduler, SchedulerError> {
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;
    let scheduler = JobScheduler::new();
    scheduler.initialize_with(cfg)?;
    Ok(scheduler)
}
