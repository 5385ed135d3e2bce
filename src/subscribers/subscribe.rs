//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for reacting to lifecycle events
//! (logging, metrics, showing a "deploy failed" notification). Each subscriber
//! is driven by a dedicated worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block the coordinator nor
//!   other subscribers.
//! - On queue overflow, events for that subscriber are **dropped** and a
//!   `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use engine_lifecycle::{Event, EventKind, Subscribe};
//!
//! struct Toast;
//!
//! #[async_trait]
//! impl Subscribe for Toast {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::DeployFailed {
//!             // show a non-fatal notification
//!         }
//!     }
//!     fn name(&self) -> &'static str { "toast" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for lifecycle event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs and overflow events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}
