use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    config::CoordinatorConfig,
    engine::{AlwaysAvailable, DependentNotifier, EngineRef, NoopNotifier, StorageAvailability},
    error::LifecycleError,
    events::Bus,
    executor::{InlineExecutor, TaskExecutor},
    gate::Gate,
    queue::PendingTaskQueue,
    state::StatusChannel,
    subscribers::{Subscribe, SubscriberSet},
};

use super::coordinator::{Coordinator, Inner};

/// Builder for a [`Coordinator`] with optional collaborators.
///
/// Defaults: storage always available, no dependent notification, tasks
/// run inline on the draining thread, no subscribers.
pub struct CoordinatorBuilder {
    engine: EngineRef,
    cfg: CoordinatorConfig,
    storage: Arc<dyn StorageAvailability>,
    notifier: Arc<dyn DependentNotifier>,
    executor: Arc<dyn TaskExecutor>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
}

impl CoordinatorBuilder {
    /// Creates a builder for `engine` with default collaborators.
    pub fn new(engine: EngineRef) -> Self {
        Self {
            engine,
            cfg: CoordinatorConfig::default(),
            storage: Arc::new(AlwaysAvailable),
            notifier: Arc::new(NoopNotifier),
            executor: Arc::new(InlineExecutor),
            subscribers: Vec::new(),
            runtime: None,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: CoordinatorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the storage availability check consulted by `startup()`.
    pub fn with_storage(mut self, storage: impl StorageAvailability) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    /// Sets the notifier invoked right before every `Engine::deploy`.
    pub fn with_notifier(mut self, notifier: impl DependentNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Sets the executor that receives drained tasks.
    pub fn with_executor(mut self, executor: impl TaskExecutor) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Runs engine bodies and subscriber workers on `runtime` instead of the
    /// ambient one.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the coordinator.
    ///
    /// # Errors
    /// [`LifecycleError::RuntimeUnavailable`] if no runtime was given and the
    /// caller is not inside one.
    pub fn build(self) -> Result<Coordinator, LifecycleError> {
        let runtime = match self.runtime {
            Some(h) => h,
            None => Handle::try_current().map_err(|_| LifecycleError::RuntimeUnavailable)?,
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let status = StatusChannel::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone(), &runtime);
            spawn_listener(&runtime, &bus, &status, set);
        }

        tracing::debug!(engine = self.engine.name(), "coordinator built");

        Ok(Coordinator::from_inner(Arc::new(Inner {
            cfg: self.cfg,
            engine: self.engine,
            storage: self.storage,
            notifier: self.notifier,
            executor: self.executor,
            status,
            queue: PendingTaskQueue::new(),
            gate: Gate::new(),
            initialized: AtomicBool::new(false),
            bus,
            runtime,
        })))
    }
}

/// Forwards bus events to the subscriber set until the coordinator is dropped.
///
/// The status sender lives in the coordinator, so its closing marks the end.
fn spawn_listener(runtime: &Handle, bus: &Bus, status: &StatusChannel, set: SubscriberSet) {
    let mut rx = bus.subscribe();
    let mut alive = status.watch();
    runtime.spawn(async move {
        loop {
            tokio::select! {
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = alive.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        // Flush what was published before the coordinator went away.
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
        set.shutdown().await;
    });
}
