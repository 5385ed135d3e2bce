//! # engine-lifecycle
//!
//! **engine-lifecycle** gates a single slow, shared engine (one that must be
//! loaded once and can be re-provisioned later) behind a lifecycle state
//! machine, so many concurrent callers can ask for it without blocking.
//!
//! Callers that arrive before the engine is ready hand in a task; the task is
//! queued and runs exactly once, in arrival order, as soon as the engine
//! becomes ready.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   startup(task?)   run_after_started(task)   run_check()      deploy()
//!        │                   │                     │               │
//!        ▼                   ▼                     ▼               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Coordinator                                                      │
//! │  - Gate (non-blocking try-acquire; guards decisions + state)      │
//! │  - StatusChannel (atomic cell + watch; observe_status())          │
//! │  - PendingTaskQueue (FIFO; drained under its own gate)            │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬───────────────────────────────┬────────────────────┬───────┘
//!        ▼                               ▼                    ▼
//!  spawn_blocking:                 TaskExecutor::post    Bus ──► listener
//!  Engine::init / notifier +       (Inline / Dispatch          │
//!  Engine::deploy                   / closure)                 ▼
//!                                                        SubscriberSet
//!                                                     ┌───────┼───────┐
//!                                                     ▼       ▼       ▼
//!                                                LogWriter  sub2    subN
//! ```
//!
//! ### Lifecycle
//! ```text
//!                  startup()             body ok
//!  Uninitialized ───────────► InProgress ────────► Ready ──┐
//!                              ▲    │                      │ deploy()
//!                              │    │ body err/panic       │
//!              startup()/      │    ▼                      │
//!              deploy()        └─ Failed ◄─────────────────┘ (via InProgress)
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                                  |
//! |-------------------|-------------------------------------------------------------|-----------------------------------------------------|
//! | **Coordination**  | Init once, redeploy, defer tasks until ready.               | [`Coordinator`], [`CoordinatorBuilder`]             |
//! | **Collaborators** | Plug in the engine, storage check and dependent notifier.   | [`Engine`], [`EngineFn`], [`StorageAvailability`]   |
//! | **Execution**     | Choose where drained tasks run.                             | [`TaskExecutor`], [`InlineExecutor`], [`DispatchExecutor`] |
//! | **Observation**   | Stream the lifecycle state; subscribe to events.            | [`LifecycleState`], [`StatusStream`], [`Subscribe`] |
//! | **Errors**        | Typed errors for engine bodies and coordinator outcomes.    | [`EngineError`], [`LifecycleError`]                 |
//! | **Configuration** | Centralize coordinator settings.                            | [`CoordinatorConfig`]                               |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use futures::StreamExt;
//! use engine_lifecycle::{Coordinator, EngineFn, EngineRef, LifecycleState, LogWriter, Subscribe};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine: EngineRef = EngineFn::arc("dictionary", || Ok(()), || Ok(()));
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!
//!     let coordinator = Coordinator::builder(engine)
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let ran = Arc::new(AtomicUsize::new(0));
//!     let r = ran.clone();
//!     let mut status = coordinator.observe_status();
//!
//!     coordinator.startup(Some(Box::new(move || {
//!         r.fetch_add(1, Ordering::SeqCst);
//!     })));
//!
//!     while let Some(state) = status.next().await {
//!         if state == LifecycleState::Ready {
//!             break;
//!         }
//!     }
//!     assert_eq!(ran.load(Ordering::SeqCst), 1);
//!
//!     assert!(coordinator.deploy().await);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod engine;
mod error;
mod events;
mod executor;
mod gate;
mod queue;
mod state;
mod subscribers;

// ---- Public re-exports ----

pub use config::CoordinatorConfig;
pub use core::{Coordinator, CoordinatorBuilder};
pub use engine::{
    AlwaysAvailable, DependentNotifier, Engine, EngineFn, EngineRef, NoopNotifier,
    StorageAvailability,
};
pub use error::{EngineError, LifecycleError};
pub use events::{Bus, Event, EventKind};
pub use executor::{DispatchExecutor, InlineExecutor, TaskExecutor};
pub use gate::{Gate, GateGuard};
pub use queue::{PendingTask, PendingTaskQueue};
pub use state::{LifecycleState, StatusChannel, StatusStream};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
