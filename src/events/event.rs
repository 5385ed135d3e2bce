//! # Lifecycle events emitted by the coordinator.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (timestamps, engine name, elapsed time, drained count, error text).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use engine_lifecycle::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InitCompleted)
//!     .with_engine("rime")
//!     .with_elapsed(Duration::from_millis(2300));
//!
//! assert_eq!(ev.kind, EventKind::InitCompleted);
//! assert_eq!(ev.engine.as_deref(), Some("rime"));
//! assert_eq!(ev.elapsed_ms, Some(2300));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup ===
    /// `startup()` found storage unavailable; nothing was started.
    ///
    /// Sets: `pending`
    StartupDeferred,

    /// The initial engine load began.
    ///
    /// Sets: `engine`
    InitStarted,

    /// The initial engine load finished; state is `Ready`.
    ///
    /// Sets: `engine`, `elapsed_ms`
    InitCompleted,

    /// The initial engine load failed or panicked; state is `Failed`.
    ///
    /// Sets: `engine`, `elapsed_ms`, `error`
    InitFailed,

    // === Deploy ===
    /// A deploy began (dependents were about to be notified).
    ///
    /// Sets: `engine`
    DeployStarted,

    /// A deploy finished; state is `Ready`.
    ///
    /// Sets: `engine`, `elapsed_ms`
    DeployCompleted,

    /// A deploy failed or panicked; state is `Failed`.
    ///
    /// Sets: `engine`, `elapsed_ms`, `error`
    DeployFailed,

    /// A deploy was refused because the engine was busy.
    DeployRejected,

    // === Queue ===
    /// Deferred tasks were handed to the executor.
    ///
    /// Sets: `count`
    TasksDrained,

    // === Subscribers ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `engine` (subscriber name), `error` (reason)
    SubscriberOverflow,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `engine` (subscriber name), `error` (panic info)
    SubscriberPanicked,
}

/// Lifecycle event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Engine (or subscriber) name, if applicable.
    pub engine: Option<Arc<str>>,
    /// Duration of the engine body in milliseconds.
    pub elapsed_ms: Option<u64>,
    /// Number of tasks drained or still pending.
    pub count: Option<usize>,
    /// Error text for failures.
    pub error: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            engine: None,
            elapsed_ms: None,
            count: None,
            error: None,
        }
    }

    /// Attaches an engine name.
    #[inline]
    pub fn with_engine(mut self, engine: impl Into<Arc<str>>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Attaches a body duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a task count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches error text.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_engine(subscriber)
            .with_error(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_engine(subscriber)
            .with_error(info)
    }

    /// True for failure events (`InitFailed`, `DeployFailed`).
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self.kind, EventKind::InitFailed | EventKind::DeployFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::InitStarted);
        let b = Event::new(EventKind::InitCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_failure_classification() {
        assert!(Event::new(EventKind::DeployFailed).is_failure());
        assert!(!Event::new(EventKind::DeployRejected).is_failure());
    }

    #[test]
    fn test_subscriber_overflow_fields() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.engine.as_deref(), Some("audit"));
        assert_eq!(ev.error.as_deref(), Some("full"));
    }
}
