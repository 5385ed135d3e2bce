//! # Lifecycle event subscribers.
//!
//! ```text
//! Coordinator ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter   Metrics   Custom
//! ```
//!
//! - [`Subscribe`] the extension trait
//! - [`SubscriberSet`] per-subscriber queues and workers
//! - [`LogWriter`] built-in `tracing` renderer

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
