//! Result handle for closures submitted through `WorkerPool::enqueue`.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use super::PoolError;

/// Outcome sent by the worker: the closure's value or its panic message.
pub(crate) type TaskOutcome<T> = Result<T, String>;

/// The pending result of a closure submitted with [`WorkerPool::enqueue`].
///
/// Waiting blocks on a channel, never polls. A panic inside the closure is
/// delivered as [`PoolError::TaskPanicked`].
///
/// [`WorkerPool::enqueue`]: super::WorkerPool::enqueue
#[derive(Debug)]
#[must_use = "dropping a TaskFuture discards the task's result"]
pub struct TaskFuture<T> {
    rx: Receiver<TaskOutcome<T>>,
}

impl<T> TaskFuture<T> {
    pub(crate) const fn new(rx: Receiver<TaskOutcome<T>>) -> Self {
        Self { rx }
    }

    /// Block until the task finishes and return its value.
    ///
    /// # Errors
    ///
    /// - `PoolError::TaskPanicked` if the closure panicked
    /// - `PoolError::Internal` if the task was dropped without running
    pub fn wait(self) -> Result<T, PoolError> {
        match self.rx.recv() {
            Ok(outcome) => outcome.map_err(PoolError::TaskPanicked),
            Err(_) => Err(dropped()),
        }
    }

    /// Block for at most `timeout`.
    ///
    /// # Errors
    ///
    /// - `PoolError::Timeout` if the task has not finished in time
    /// - `PoolError::TaskPanicked` if the closure panicked
    /// - `PoolError::Internal` if the task was dropped or the value was already taken
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, PoolError> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => outcome.map_err(PoolError::TaskPanicked),
            Err(RecvTimeoutError::Timeout) => Err(PoolError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(dropped()),
        }
    }

    /// Take the result if it is already available, without blocking.
    pub fn try_get(&self) -> Option<Result<T, PoolError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome.map_err(PoolError::TaskPanicked)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(dropped())),
        }
    }

    /// Whether a result is waiting to be taken.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }
}

#[cfg(feature = "tokio-runtime")]
impl<T: Send + 'static> TaskFuture<T> {
    /// Await the result from an async context.
    ///
    /// The blocking wait is moved onto tokio's blocking thread pool so the
    /// calling runtime is never stalled.
    ///
    /// # Errors
    ///
    /// Same as [`TaskFuture::wait`], plus `PoolError::Internal` if the blocking
    /// helper task failed.
    pub async fn wait_async(self) -> Result<T, PoolError> {
        tokio::task::spawn_blocking(move || self.wait())
            .await
            .map_err(|e| PoolError::Internal(format!("blocking wait failed: {e}")))?
    }
}

fn dropped() -> PoolError {
    PoolError::Internal("task result channel closed before a value was produced".into())
}
