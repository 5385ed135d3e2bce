//! # Pending task queue.
//!
//! [`PendingTaskQueue`] buffers deferred [`PendingTask`]s until the engine is
//! ready, then hands them out in enqueue order.
//!
//! ## Rules
//! - `enqueue` appends to the tail; safe under concurrent callers.
//! - `drain_all` atomically takes every task present at the instant of the call.
//!   A racing `enqueue` lands either in that batch or in the next one.
//! - `drain_with` serializes delivery: only one drainer posts at a time, it
//!   keeps draining until the queue is empty, and re-checks after releasing
//!   its drain gate so a task enqueued in that gap is never stranded.
//!
//! ```text
//! drain_with(post):
//!   loop {
//!     try_acquire(drain gate) ── fail ──► return (holder will re-check)
//!     while batch = drain_all() not empty { post(task) for task in batch }
//!     release drain gate
//!     if queue empty ──► return
//!   }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::gate::Gate;

/// Deferred zero-argument action.
pub type PendingTask = Box<dyn FnOnce() + Send + 'static>;

/// Thread-safe FIFO of deferred actions.
#[derive(Default)]
pub struct PendingTaskQueue {
    tasks: Mutex<VecDeque<PendingTask>>,
    draining: Gate,
}

impl PendingTaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `task` to the tail.
    pub fn enqueue(&self, task: PendingTask) {
        self.lock().push_back(task);
    }

    /// Removes and returns every queued task, in enqueue order.
    pub fn drain_all(&self) -> Vec<PendingTask> {
        self.lock().drain(..).collect()
    }

    /// Drains the queue into `post`, one drainer at a time.
    ///
    /// Returns the number of tasks this call posted. A call that finds another
    /// drainer active returns `0` immediately; that drainer delivers the tasks.
    ///
    /// `post` must not unwind: a panic would drop the rest of the batch.
    pub fn drain_with<F>(&self, mut post: F) -> usize
    where
        F: FnMut(PendingTask),
    {
        let mut posted = 0;
        loop {
            let Some(guard) = self.draining.try_acquire() else {
                return posted;
            };
            loop {
                let batch = self.drain_all();
                if batch.is_empty() {
                    break;
                }
                posted += batch.len();
                batch.into_iter().for_each(&mut post);
            }
            drop(guard);

            if self.is_empty() {
                return posted;
            }
        }
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Tasks are opaque boxes; a panic elsewhere cannot leave the deque torn.
    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PendingTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTaskQueue")
            .field("len", &self.len())
            .field("draining", &self.draining.is_held())
            .finish()
    }
}
