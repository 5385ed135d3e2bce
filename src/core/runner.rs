//! # Run one slow engine body.
//!
//! Executes `Engine::init` or (notifier + `Engine::deploy`) on the blocking
//! pool and turns every way it can end into a [`BodyOutcome`].
//!
//! ```text
//! Init:    spawn_blocking(engine.init())
//! Deploy:  spawn_blocking(notifier.notify_directory_changed(); engine.deploy())
//!
//!   Ok(Ok(()))   → Ok
//!   Ok(Err(e))   → Err(e)
//!   Err(panic)   → Err(EngineError::Panicked)
//!   Err(cancel)  → Err(EngineError::Panicked)   (runtime shutting down)
//! ```
//!
//! ## Rules
//! - The body never runs on the caller's thread and is never aborted.
//! - The notifier runs strictly before `Engine::deploy`, on the same thread.
//! - Bodies slower than the configured threshold log a warning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::{DependentNotifier, EngineRef};
use crate::error::{EngineError, LifecycleError};
use crate::events::EventKind;
use crate::executor::panic_message;

/// Which slow body to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Init,
    Deploy,
}

impl Operation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Deploy => "deploy",
        }
    }

    pub(crate) fn started_kind(self) -> EventKind {
        match self {
            Operation::Init => EventKind::InitStarted,
            Operation::Deploy => EventKind::DeployStarted,
        }
    }

    pub(crate) fn completed_kind(self) -> EventKind {
        match self {
            Operation::Init => EventKind::InitCompleted,
            Operation::Deploy => EventKind::DeployCompleted,
        }
    }

    pub(crate) fn failed_kind(self) -> EventKind {
        match self {
            Operation::Init => EventKind::InitFailed,
            Operation::Deploy => EventKind::DeployFailed,
        }
    }

    pub(crate) fn failure(self, source: EngineError) -> LifecycleError {
        match self {
            Operation::Init => LifecycleError::InitFailed { source },
            Operation::Deploy => LifecycleError::DeployFailed { source },
        }
    }
}

/// Result of one body plus how long it took.
#[derive(Debug)]
pub(crate) struct BodyOutcome {
    pub result: Result<(), EngineError>,
    pub elapsed: Duration,
}

/// Runs the body for `op` on the blocking pool of the current runtime.
pub(crate) async fn run_body(
    op: Operation,
    engine: EngineRef,
    notifier: Arc<dyn DependentNotifier>,
    slow: Option<Duration>,
) -> BodyOutcome {
    let started = Instant::now();
    let joined = tokio::task::spawn_blocking(move || match op {
        Operation::Init => engine.init(),
        Operation::Deploy => {
            notifier.notify_directory_changed();
            engine.deploy()
        }
    })
    .await;
    let elapsed = started.elapsed();

    let result = match joined {
        Ok(res) => res,
        Err(je) if je.is_panic() => Err(EngineError::Panicked {
            info: panic_message(je.into_panic().as_ref()),
        }),
        Err(je) => Err(EngineError::Panicked {
            info: je.to_string(),
        }),
    };

    if let Some(threshold) = slow.filter(|t| elapsed > *t) {
        tracing::warn!(
            op = op.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            threshold_ms = threshold.as_millis() as u64,
            "engine body was slow"
        );
    }

    BodyOutcome { result, elapsed }
}
