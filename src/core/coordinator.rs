//! # Coordinator: gates every access to the shared engine.
//!
//! The [`Coordinator`] owns the lifecycle state, the pending-task queue and a
//! non-blocking [`Gate`]. It guarantees the engine is initialized once,
//! allows it to be redeployed, and delivers every deferred task exactly once.
//!
//! ## Decision paths
//! ```text
//! startup(task?):
//!   enqueue(task)                               (always, if given)
//!   storage unavailable ──► StartupDeferred, return
//!   try_acquire(gate) ── busy ──► return        (holder's path drains later)
//!   state ∈ {Uninitialized, Failed*} ──► InProgress, release, spawn init body
//!   otherwise                        ──► release, run_check()
//!
//! init body done:
//!   InProgress ─► Ready | Failed ─► drain (on Ready)
//!
//! deploy():                                     (suspends the caller)
//!   try_acquire(gate) ── busy ──► false
//!   state == InProgress ──► release, false
//!   InProgress, release ─► notifier ─► Engine::deploy ─► Ready | Failed ─► drain
//!
//! run_check():
//!   Uninitialized | Failed* ─► startup()   Ready ─► drain   InProgress ─► no-op
//!
//!   * Failed only when `retry_failed_init` is set and the engine never reached Ready
//! ```
//!
//! ## Rules
//! - At most one init or deploy body runs at any time (the two exclude each other).
//! - `Engine::init` succeeds at most once; after that only `deploy()` leaves `Failed`.
//! - The gate is held only for decisions and the writes that leave `Uninitialized`,
//!   `Ready` or `Failed`, never across a body.
//! - Leaving `InProgress` is reserved to the body that entered it, so it needs
//!   no gate; gate holders that see `InProgress` never write.
//! - A body always runs to completion on the runtime, even if the `deploy()`
//!   caller stops waiting.
//! - If the runtime drops a body task, the state still moves to `Failed`.
//! - Tasks are posted to the executor in enqueue order, one drainer at a time.
//! - A drain triggered by `run_check()` or `run_after_started()` reads `Ready`
//!   without the gate; a `deploy()` claiming the engine right after may run its
//!   body while those tasks execute. Executors that need a quiet engine should
//!   re-check `is_ready()` inside the task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::CoordinatorConfig;
use crate::core::runner::{BodyOutcome, Operation, run_body};
use crate::engine::{DependentNotifier, EngineRef, StorageAvailability};
use crate::error::{EngineError, LifecycleError};
use crate::events::{Bus, Event, EventKind};
use crate::executor::TaskExecutor;
use crate::gate::Gate;
use crate::queue::{PendingTask, PendingTaskQueue};
use crate::state::{LifecycleState, StatusChannel, StatusStream};

use super::builder::CoordinatorBuilder;

/// Shared state behind every [`Coordinator`] handle.
pub(crate) struct Inner {
    pub(crate) cfg: CoordinatorConfig,
    pub(crate) engine: EngineRef,
    pub(crate) storage: Arc<dyn StorageAvailability>,
    pub(crate) notifier: Arc<dyn DependentNotifier>,
    pub(crate) executor: Arc<dyn TaskExecutor>,
    pub(crate) status: StatusChannel,
    pub(crate) queue: PendingTaskQueue,
    pub(crate) gate: Gate,
    /// Set once any body has reached `Ready`.
    pub(crate) initialized: AtomicBool,
    pub(crate) bus: Bus,
    pub(crate) runtime: Handle,
}

/// Engine lifecycle coordinator.
///
/// Cheap to clone; every clone refers to the same engine, state and queue.
/// Construct one per engine with [`Coordinator::builder`] and pass it to
/// every consumer.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Starts building a coordinator for `engine`.
    pub fn builder(engine: EngineRef) -> CoordinatorBuilder {
        CoordinatorBuilder::new(engine)
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Requests engine startup, optionally queueing `task` to run once it is ready.
    ///
    /// Never blocks on the engine. The task is queued even if startup is
    /// deferred (storage unavailable) or another caller owns the gate.
    pub fn startup(&self, task: Option<PendingTask>) {
        let _ = self.try_startup(task);
    }

    /// Like [`startup`](Self::startup) but reports a deferred start.
    ///
    /// `Ok` means the engine is starting, ready, or owned by another caller
    /// whose path will drain the queue.
    ///
    /// # Errors
    /// [`LifecycleError::StorageUnavailable`] if storage could not be read; the
    /// task stays queued for a later trigger.
    pub fn try_startup(&self, task: Option<PendingTask>) -> Result<(), LifecycleError> {
        if let Some(task) = task {
            self.inner.queue.enqueue(task);
        }
        self.inner.startup()
    }

    /// Redeploys the engine, suspending the caller until the body finishes.
    ///
    /// Returns `false` when the engine is busy (a startup or deploy is in
    /// progress) or when the deploy failed; the reason is logged and published.
    pub async fn deploy(&self) -> bool {
        self.try_deploy().await.is_ok()
    }

    /// Like [`deploy`](Self::deploy) but reports why it did not succeed.
    ///
    /// # Errors
    /// - [`LifecycleError::Busy`] if the gate is held or the state is `InProgress`
    /// - [`LifecycleError::DeployFailed`] if the notifier or engine body failed
    /// - [`LifecycleError::RuntimeUnavailable`] if the runtime dropped the body task
    pub async fn try_deploy(&self) -> Result<(), LifecycleError> {
        self.inner.begin_deploy()?;

        match self.inner.spawn_body(Operation::Deploy).await {
            Ok(res) => res,
            Err(je) => {
                // The runtime dropped the task; its drop already recorded `Failed`.
                tracing::error!(error = %je, "deploy task did not complete");
                Err(LifecycleError::RuntimeUnavailable)
            }
        }
    }

    /// Blocking variant of [`deploy`](Self::deploy) for threads outside the runtime.
    ///
    /// Must not be called from inside an async context of the coordinator's
    /// runtime: it parks the calling thread until the deploy finishes.
    pub fn deploy_blocking(&self) -> bool {
        let (tx, rx) = std_mpsc::channel();
        let this = self.clone();
        self.inner.runtime.spawn(async move {
            let _ = tx.send(this.deploy().await);
        });
        rx.recv().unwrap_or(false)
    }

    /// Starts the engine if needed, or drains the queue if it is ready.
    pub fn run_check(&self) {
        self.inner.run_check();
    }

    /// True if the engine is ready.
    pub fn is_ready(&self) -> bool {
        self.inner.status.current() == LifecycleState::Ready
    }

    /// Queues `task` to run once the engine is ready, then triggers a check.
    ///
    /// The task runs exactly once: promptly if the engine is ready, otherwise
    /// after the in-flight startup completes. If storage is unavailable, it
    /// waits for a later trigger.
    pub fn run_after_started<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.queue.enqueue(Box::new(task));
        self.inner.run_check();
    }

    /// Stream of lifecycle states: the current one first, then every change.
    pub fn observe_status(&self) -> StatusStream {
        self.inner.status.observe()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.inner.status.current()
    }

    /// Number of tasks waiting for the engine.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// Receiver of raw lifecycle events.
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// The coordinator's configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.cfg
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("engine", &self.inner.engine.name())
            .field("state", &self.inner.status.current())
            .field("pending", &self.inner.queue.len())
            .finish()
    }
}

impl Inner {
    /// `Failed` means "load again" only while no body has ever reached `Ready`.
    fn needs_init(&self, state: LifecycleState) -> bool {
        match state {
            LifecycleState::Uninitialized => true,
            LifecycleState::Failed => {
                self.cfg.retry_failed_init && !self.initialized.load(Ordering::SeqCst)
            }
            LifecycleState::InProgress | LifecycleState::Ready => false,
        }
    }

    fn startup(self: &Arc<Self>) -> Result<(), LifecycleError> {
        if !self.storage.is_available() {
            tracing::debug!(pending = self.queue.len(), "storage unavailable; startup deferred");
            self.bus
                .publish(Event::new(EventKind::StartupDeferred).with_count(self.queue.len()));
            return Err(LifecycleError::StorageUnavailable);
        }

        let Some(guard) = self.gate.try_acquire() else {
            tracing::debug!("gate busy; startup left to current holder");
            return Ok(());
        };

        if self.needs_init(self.status.current()) {
            let _ = self.status.transition(LifecycleState::InProgress);
            drop(guard);
            tracing::debug!(engine = self.engine.name(), "starting engine in background");
            self.publish(Operation::Init.started_kind());
            self.spawn_body(Operation::Init);
            Ok(())
        } else {
            drop(guard);
            self.run_check();
            Ok(())
        }
    }

    /// Runs the body for `op` on the runtime and records its outcome.
    ///
    /// The caller must already have moved the state to `InProgress`.
    fn spawn_body(self: &Arc<Self>, op: Operation) -> JoinHandle<Result<(), LifecycleError>> {
        let task = BodyTask::new(Arc::clone(self), op);
        self.runtime.spawn(async move {
            let outcome = run_body(
                op,
                task.inner.engine.clone(),
                task.inner.notifier.clone(),
                task.inner.cfg.slow_body_threshold(),
            )
            .await;
            task.complete(outcome)
        })
    }

    fn run_check(self: &Arc<Self>) {
        let state = self.status.current();
        if self.needs_init(state) {
            let _ = self.startup();
        } else if state == LifecycleState::Ready {
            self.drain();
        }
    }

    /// Decision half of a deploy: claims the engine or reports it busy.
    fn begin_deploy(&self) -> Result<(), LifecycleError> {
        let claimed = match self.gate.try_acquire() {
            Some(_guard) if self.status.current() != LifecycleState::InProgress => {
                self.status.transition(LifecycleState::InProgress).is_ok()
            }
            _ => false,
        };

        if claimed {
            tracing::debug!(engine = self.engine.name(), "deploy started");
            self.publish(Operation::Deploy.started_kind());
            Ok(())
        } else {
            tracing::debug!("deploy rejected: engine busy");
            self.publish(EventKind::DeployRejected);
            Err(LifecycleError::Busy)
        }
    }

    /// Records the outcome of a body and drains on success.
    fn finish(&self, op: Operation, outcome: BodyOutcome) -> Result<(), LifecycleError> {
        let BodyOutcome { result, elapsed } = outcome;
        let next = if result.is_ok() {
            self.initialized.store(true, Ordering::SeqCst);
            LifecycleState::Ready
        } else {
            LifecycleState::Failed
        };
        // Only the finisher may leave InProgress; gate holders back off while it lasts.
        let _ = self.status.transition(next);

        let event = Event::new(if result.is_ok() {
            op.completed_kind()
        } else {
            op.failed_kind()
        })
        .with_engine(self.engine.name())
        .with_elapsed(elapsed);

        match result {
            Ok(()) => {
                tracing::info!(
                    engine = self.engine.name(),
                    op = op.as_str(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "engine ready"
                );
                self.bus.publish(event);
                self.drain();
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    engine = self.engine.name(),
                    op = op.as_str(),
                    error = %e,
                    "engine body failed"
                );
                self.bus.publish(event.with_error(e.to_string()));
                Err(op.failure(e))
            }
        }
    }

    /// Hands every queued task to the executor, in order.
    fn drain(&self) -> usize {
        let executor = &self.executor;
        let posted = self.queue.drain_with(|task| executor.post(task));
        if posted > 0 {
            tracing::debug!(count = posted, "drained pending tasks");
            self.bus.publish(Event::new(EventKind::TasksDrained).with_count(posted));
        }
        posted
    }

    fn publish(&self, kind: EventKind) {
        self.bus.publish(Event::new(kind).with_engine(self.engine.name()));
    }
}

/// Owns the `InProgress` state of one body until its outcome is recorded.
///
/// If the runtime drops the task first (shut down, or never started), the
/// drop records a failure so the state cannot stay `InProgress`.
struct BodyTask {
    inner: Arc<Inner>,
    op: Operation,
    started: Instant,
    armed: bool,
}

impl BodyTask {
    fn new(inner: Arc<Inner>, op: Operation) -> Self {
        Self {
            inner,
            op,
            started: Instant::now(),
            armed: true,
        }
    }

    fn complete(mut self, outcome: BodyOutcome) -> Result<(), LifecycleError> {
        self.armed = false;
        self.inner.finish(self.op, outcome)
    }
}

impl Drop for BodyTask {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(op = self.op.as_str(), "engine body task dropped by the runtime");
        let outcome = BodyOutcome {
            result: Err(EngineError::Panicked {
                info: "body task dropped before completion".into(),
            }),
            elapsed: self.started.elapsed(),
        };
        let _ = self.inner.finish(self.op, outcome);
    }
}
