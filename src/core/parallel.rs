//! Range partitioning and blocking parallel-for helpers.
//!
//! Two partition policies share one pool:
//!
//! - [`Partition::Batched`] splits a range into caller-sized batches (used by
//!   [`JobScheduler::parallel_for`](crate::core::JobScheduler::parallel_for)).
//! - [`Partition::PerWorker`] splits it by the pool's thread count (used by the
//!   blocking [`parallel_for`] / [`parallel_for_each`] below).
//!
//! ```rust
//! use sage_jobs::core::{parallel, WorkerPool};
//!
//! let pool = WorkerPool::new(4)?;
//! let squares = parallel::parallel_for_each(&pool, (0..100_u64).collect(), |x| *x *= *x)?;
//! assert_eq!(squares[9], 81);
//! # Ok::<(), sage_jobs::core::PoolError>(())
//! ```

use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use super::worker_pool::{PoolError, TaskFuture, WorkerPool};

/// How a range of indices is split into chunks of sequential work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Contiguous batches of at most this many indices (`0` is treated as `1`).
    Batched(usize),
    /// About one chunk per worker thread: `max(1, len / workers)` indices each.
    PerWorker,
}

impl Partition {
    /// Chunk length for a range of `len` indices on `workers` threads.
    #[must_use]
    pub fn chunk_size(self, len: usize, workers: usize) -> usize {
        match self {
            Self::Batched(size) => size.max(1),
            Self::PerWorker => (len / workers.max(1)).max(1),
        }
    }

    /// Contiguous chunks covering `[start, end)` in ascending order.
    #[must_use]
    pub fn chunks(self, start: usize, end: usize, workers: usize) -> Chunks {
        let len = end.saturating_sub(start);
        Chunks {
            next: start,
            end,
            size: self.chunk_size(len, workers),
        }
    }
}

/// Iterator over the chunks produced by [`Partition::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks {
    next: usize,
    end: usize,
    size: usize,
}

impl Iterator for Chunks {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next >= self.end {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.size).min(self.end);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next).div_ceil(self.size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks {}

/// Run `func(i)` for every `i` in `[start, end)` and block until all are done.
///
/// The range is split per worker and each chunk goes through the pool's FIFO
/// queue. Do not call this from one of `pool`'s own workers when the pool may be
/// saturated: the caller blocks a worker while waiting.
///
/// # Errors
///
/// - `PoolError::PoolShutdown` if the pool is stopping (chunks already queued still run)
/// - `PoolError::TaskPanicked` with the first panic seen, after every chunk has finished
pub fn parallel_for<F>(
    pool: &WorkerPool,
    start: usize,
    end: usize,
    func: F,
) -> Result<(), PoolError>
where
    F: Fn(usize) + Send + Sync + 'static,
{
    if start >= end {
        return Ok(());
    }

    let func = Arc::new(func);
    let chunks = Partition::PerWorker.chunks(start, end, pool.thread_count());
    debug!(start, end, chunks = chunks.len(), "parallel_for dispatch");

    let mut futures = Vec::with_capacity(chunks.len());
    for range in chunks {
        let func = Arc::clone(&func);
        futures.push(pool.enqueue(move || range.for_each(|i| func(i))));
    }
    join_all(futures).map(|_| ())
}

/// Apply `func` to every element of `items` in parallel and return the vector
/// in its original order.
///
/// # Errors
///
/// Same as [`parallel_for`]. On error the items are lost.
pub fn parallel_for_each<T, F>(
    pool: &WorkerPool,
    items: Vec<T>,
    func: F,
) -> Result<Vec<T>, PoolError>
where
    T: Send + 'static,
    F: Fn(&mut T) + Send + Sync + 'static,
{
    let len = items.len();
    if len == 0 {
        return Ok(items);
    }

    let func = Arc::new(func);
    let chunk_size = Partition::PerWorker.chunk_size(len, pool.thread_count());
    let mut futures = Vec::with_capacity(len.div_ceil(chunk_size));
    let mut rest = items;
    while !rest.is_empty() {
        let tail = rest.split_off(chunk_size.min(rest.len()));
        let mut chunk = rest;
        rest = tail;

        let func = Arc::clone(&func);
        futures.push(pool.enqueue(move || {
            chunk.iter_mut().for_each(|item| func(item));
            chunk
        }));
    }

    let chunks = join_all(futures)?;
    let mut out = Vec::with_capacity(len);
    for chunk in chunks {
        out.extend(chunk);
    }
    Ok(out)
}

/// Wait on every submitted chunk, then report the first failure if any.
fn join_all<T>(
    submissions: Vec<Result<TaskFuture<T>, PoolError>>,
) -> Result<Vec<T>, PoolError> {
    let mut values = Vec::with_capacity(submissions.len());
    let mut first_error = None;
    for submission in submissions {
        match submission.and_then(TaskFuture::wait) {
            Ok(value) => values.push(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(values), Err)
}
