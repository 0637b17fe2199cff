//! Tests for error types

use sage_jobs::core::{PoolError, SchedulerError};

#[test]
fn test_not_initialized_error() {
    let err = SchedulerError::NotInitialized;
    assert_eq!(format!("{}", err), "job scheduler is not initialized");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("worker_count".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: worker_count");
}

#[test]
fn test_pool_error_wrapped() {
    let err: SchedulerError = PoolError::PoolShutdown.into();
    assert!(matches!(err, SchedulerError::Pool(PoolError::PoolShutdown)));
    assert_eq!(format!("{}", err), "worker pool error: pool has been shut down");
}

#[test]
fn test_pool_error_messages() {
    assert_eq!(PoolError::Timeout.to_string(), "operation timed out");
    assert_eq!(
        PoolError::TaskPanicked("boom".into()).to_string(),
        "task panicked: boom"
    );
    assert_eq!(
        PoolError::InvalidConfig("bad".into()).to_string(),
        "invalid configuration: bad"
    );
    assert_eq!(PoolError::Internal("spawn".into()).to_string(), "internal error: spawn");
}

#[test]
fn test_errors_convert_to_anyhow() {
    fn fails() -> sage_jobs::core::AppResult<()> {
        Err(SchedulerError::NotInitialized)?;
        Ok(())
    }

    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
