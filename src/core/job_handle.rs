//! Shared completion counters for scheduled work.
//!
//! A [`JobHandle`] is a cheap, cloneable reference to one atomic counter. Every
//! clone aliases the same counter, so a handle returned to a caller and the
//! copies captured by scheduled tasks all observe the same completion.
//!
//! The counter starts at 1 (the *pending bias*). Each unit of work registered
//! with [`JobHandle::add_dependency`] adds one, each [`JobHandle::complete`]
//! removes one, and the final `complete` cancels the bias. The handle is
//! complete exactly when the counter reaches zero.
//!
//! Waiting never spins: [`JobHandle::wait`] parks on a condition variable, and
//! [`JobHandle::on_complete`] registers a continuation that the completing
//! thread runs.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::error;

use crate::core::task::Job;

struct Latch {
    done: bool,
    continuations: Vec<Job>,
}

struct HandleState {
    counter: AtomicIsize,
    latch: Mutex<Latch>,
    released: Condvar,
}

/// Reference-counted completion counter shared by all clones.
#[derive(Clone)]
pub struct JobHandle {
    state: Arc<HandleState>,
}

impl JobHandle {
    /// A pending handle (counter = 1).
    #[must_use]
    pub fn new() -> Self {
        Self::with_count(1, false)
    }

    /// A handle that is already complete (counter = 0).
    #[must_use]
    pub fn completed() -> Self {
        Self::with_count(0, true)
    }

    fn with_count(count: isize, done: bool) -> Self {
        Self {
            state: Arc::new(HandleState {
                counter: AtomicIsize::new(count),
                latch: Mutex::new(Latch {
                    done,
                    continuations: Vec::new(),
                }),
                released: Condvar::new(),
            }),
        }
    }

    /// Whether the counter has reached zero. Never blocks.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.counter.load(Ordering::Acquire) == 0
    }

    /// Current counter value, for diagnostics.
    #[must_use]
    pub fn pending(&self) -> isize {
        self.state.counter.load(Ordering::Acquire)
    }

    /// Register one more unit of outstanding work.
    pub fn add_dependency(&self) {
        self.state.counter.fetch_add(1, Ordering::AcqRel);
    }

    /// Mark one unit of work as finished.
    ///
    /// The call that brings the counter to zero wakes every waiter and runs all
    /// registered continuations on the current thread.
    pub fn complete(&self) {
        let previous = self.state.counter.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            self.release();
        } else if previous <= 0 {
            error!(
                counter = previous - 1,
                "JobHandle completed more times than work was registered"
            );
            debug_assert!(previous > 0, "JobHandle counter went negative");
        }
    }

    fn release(&self) {
        let continuations = {
            let mut latch = self.state.latch.lock();
            latch.done = true;
            mem::take(&mut latch.continuations)
        };
        self.state.released.notify_all();
        for continuation in continuations {
            continuation();
        }
    }

    /// Block the calling thread until the handle completes.
    ///
    /// Calling this from a worker thread on work queued behind the caller in an
    /// exhausted pool still deadlocks; prefer [`JobHandle::on_complete`] or
    /// scheduling with dependencies from inside jobs.
    pub fn wait(&self) {
        if self.is_complete() {
            return;
        }
        let mut latch = self.state.latch.lock();
        self.state.released.wait_while(&mut latch, |latch| !latch.done);
    }

    /// Block for at most `timeout`; returns whether the handle completed.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_complete() {
            return true;
        }
        let mut latch = self.state.latch.lock();
        let _ = self
            .state
            .released
            .wait_while_for(&mut latch, |latch| !latch.done, timeout);
        latch.done
    }

    /// Run `continuation` once the handle completes.
    ///
    /// If it is already complete the continuation runs immediately on the
    /// calling thread; otherwise it runs on whichever thread completes it.
    pub fn on_complete<F>(&self, continuation: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut latch = self.state.latch.lock();
            if !latch.done {
                latch.continuations.push(Box::new(continuation));
                return;
            }
        }
        continuation();
    }

    /// A handle that completes once every handle in `handles` has completed.
    ///
    /// An empty slice yields an already-complete handle.
    #[must_use]
    pub fn when_all(handles: &[Self]) -> Self {
        let merged = Self::new();
        for handle in handles {
            merged.add_dependency();
            let merged = merged.clone();
            handle.on_complete(move || merged.complete());
        }
        merged.complete();
        merged
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Completes the wrapped handle when dropped, including during unwinding.
pub(crate) struct CompletionGuard(JobHandle);

impl CompletionGuard {
    pub(crate) const fn new(handle: JobHandle) -> Self {
        Self(handle)
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.complete();
    }
}
