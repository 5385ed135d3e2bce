//! # Task executors: where drained tasks run.
//!
//! When the engine becomes ready the coordinator drains its queue and hands
//! every task to a [`TaskExecutor`] via [`TaskExecutor::post`], in enqueue order.
//!
//! ## Implementations
//! - [`InlineExecutor`]: runs the task right away on the draining thread.
//! - [`DispatchExecutor`]: a dedicated, named OS thread fed by an unbounded
//!   queue; tasks run one at a time in post order (a "UI thread").
//! - any `Fn(PendingTask) + Send + Sync` closure.
//!
//! ## Rules
//! - `post` must not drop tasks and must not unwind; the built-in executors
//!   catch task panics and log them.
//!
//! ```text
//! drain ──► post(t1) ──► [unbounded queue] ──► dispatch thread: t1(), t2(), ...
//!      └──► post(t2) ──┘
//! ```

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;

use crate::queue::PendingTask;

/// Runs drained tasks on a designated execution context.
pub trait TaskExecutor: Send + Sync + 'static {
    /// Schedules `task` to run exactly once.
    fn post(&self, task: PendingTask);
}

impl<F> TaskExecutor for F
where
    F: Fn(PendingTask) + Send + Sync + 'static,
{
    fn post(&self, task: PendingTask) {
        self(task)
    }
}

/// Runs each task immediately on the thread that drains the queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn post(&self, task: PendingTask) {
        run_guarded(task);
    }
}

/// Serializes tasks on one dedicated thread.
#[derive(Debug)]
pub struct DispatchExecutor {
    tx: mpsc::UnboundedSender<PendingTask>,
    thread: ThreadId,
}

impl DispatchExecutor {
    /// Spawns the dispatch thread with the given name.
    ///
    /// The thread exits once the executor (its only sender) is dropped and
    /// every task already posted has run.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<PendingTask>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            while let Some(task) = rx.blocking_recv() {
                run_guarded(task);
            }
        })?;

        Ok(Self {
            tx,
            thread: handle.thread().id(),
        })
    }

    /// Id of the dispatch thread.
    pub fn thread_id(&self) -> ThreadId {
        self.thread
    }
}

impl TaskExecutor for DispatchExecutor {
    fn post(&self, task: PendingTask) {
        if self.tx.send(task).is_err() {
            tracing::error!("dispatch thread is gone; task dropped");
        }
    }
}

/// Runs a task, logging instead of propagating a panic.
pub(crate) fn run_guarded(task: PendingTask) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        tracing::warn!(panic = %panic_message(payload.as_ref()), "pending task panicked");
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
