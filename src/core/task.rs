//! Prioritized units of work.

use std::cmp::Ordering;
use std::fmt;

/// A boxed, type-erased unit of work runnable on a worker thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Priority used when none is given.
pub const DEFAULT_PRIORITY: i32 = 0;

/// A prioritized, fire-and-forget unit of work.
///
/// Tasks are ordered solely by `priority`: the pool's max-heap pops the highest
/// priority first. Tasks with equal priority have no guaranteed relative order.
///
/// ```
/// use sage_jobs::core::Task;
///
/// let urgent = Task::new(|| println!("first"), 10);
/// let lazy = Task::new(|| println!("later"), -5);
/// assert!(urgent > lazy);
/// ```
pub struct Task {
    job: Job,
    priority: i32,
}

impl Task {
    /// Wrap a closure with the given priority (higher runs first).
    pub fn new<F>(func: F, priority: i32) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            job: Box::new(func),
            priority,
        }
    }

    /// Priority of this task.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn into_job(self) -> Job {
        self.job
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_task_ordering_by_priority() {
        let low = Task::new(|| {}, -1);
        let normal = Task::new(|| {}, DEFAULT_PRIORITY);
        let high = Task::new(|| {}, 7);

        assert!(high > normal);
        assert!(normal > low);
        assert_eq!(Task::new(|| {}, 3), Task::new(|| {}, 3));
    }

    #[test]
    fn test_heap_pops_highest_first() {
        let mut heap = BinaryHeap::new();
        for priority in [3, -2, 9, 0, 5] {
            heap.push(Task::new(|| {}, priority));
        }

        let popped: Vec<i32> = std::iter::from_fn(|| heap.pop().map(|t| t.priority())).collect();
        assert_eq!(popped, vec![9, 5, 3, 0, -2]);
    }

    #[test]
    fn test_into_job_runs_closure() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let task = Task::new(move || tx.send(42).unwrap(), 1);
        (task.into_job())();
        assert_eq!(rx.recv().unwrap(), 42);
    }

    #[test]
    fn test_debug_shows_priority() {
        let task = Task::new(|| {}, 4);
        assert!(format!("{task:?}").contains("priority: 4"));
    }
}
