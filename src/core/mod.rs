//! Coordinator core: decisions, body execution, construction.
//!
//! The only public API from this module is [`Coordinator`] and its
//! [`CoordinatorBuilder`].
//!
//! Internal modules:
//! - [`coordinator`]: gate-protected startup/deploy/check decisions and draining;
//! - [`runner`]: runs one slow engine body on the blocking pool and classifies the outcome;
//! - [`builder`]: wires collaborators, the event bus and subscriber workers.

mod builder;
mod coordinator;
mod runner;

pub use builder::CoordinatorBuilder;
pub use coordinator::Coordinator;
