//! # LogWriter: lifecycle events rendered through `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  engine_lifecycle: init completed engine="rime" elapsed_ms=2310
//! WARN  engine_lifecycle: deploy rejected: engine busy
//! ERROR engine_lifecycle: deploy failed engine="rime" elapsed_ms=40 error="engine failed: bad schema"
//! DEBUG engine_lifecycle: tasks drained count=3
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let engine = e.engine.as_deref().unwrap_or("-");
        let error = e.error.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::StartupDeferred => {
                tracing::info!(pending = ?e.count, "startup deferred: storage unavailable");
            }
            EventKind::InitStarted => tracing::info!(engine, "init started"),
            EventKind::InitCompleted => {
                tracing::info!(engine, elapsed_ms = ?e.elapsed_ms, "init completed");
            }
            EventKind::InitFailed => {
                tracing::error!(engine, elapsed_ms = ?e.elapsed_ms, error, "init failed");
            }
            EventKind::DeployStarted => tracing::info!(engine, "deploy started"),
            EventKind::DeployCompleted => {
                tracing::info!(engine, elapsed_ms = ?e.elapsed_ms, "deploy completed");
            }
            EventKind::DeployFailed => {
                tracing::error!(engine, elapsed_ms = ?e.elapsed_ms, error, "deploy failed");
            }
            EventKind::DeployRejected => tracing::warn!("deploy rejected: engine busy"),
            EventKind::TasksDrained => tracing::debug!(count = ?e.count, "tasks drained"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = engine, reason = error, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(subscriber = engine, info = error, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
