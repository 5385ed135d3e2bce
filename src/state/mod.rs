//! Lifecycle state and its observation channel.
//!
//! - [`LifecycleState`] tri-state (plus `Failed`) engine availability
//! - [`StatusChannel`] atomic cell + watch channel broadcasting changes

mod channel;
mod lifecycle;

pub use channel::{StatusChannel, StatusStream};
pub use lifecycle::LifecycleState;
