//! # Engine collaborators.
//!
//! The coordinator consumes three collaborators:
//! - [`Engine`]: the expensive shared resource (slow `init`, slow `deploy`);
//! - [`StorageAvailability`]: precondition consulted by `startup()`;
//! - [`DependentNotifier`]: told "directory changed" right before `Engine::deploy`.
//!
//! Engine bodies are **blocking**; the coordinator always runs them on the
//! blocking pool of its runtime, never on a caller's thread (except that
//! `deploy()` suspends its caller until the body finishes).
//!
//! [`EngineFn`] is a closure-backed engine, handy for embedding and tests:
//!
//! ```rust
//! use engine_lifecycle::{EngineFn, EngineRef};
//!
//! let engine: EngineRef = EngineFn::arc(
//!     "schemas",
//!     || Ok(()),   // init: load dictionaries
//!     || Ok(()),   // deploy: rebuild from user directory
//! );
//! assert_eq!(engine.name(), "schemas");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::EngineError;

/// The expensive shared resource gated by a [`Coordinator`](crate::Coordinator).
pub trait Engine: Send + Sync + 'static {
    /// Human-readable name (for logs and events).
    fn name(&self) -> &str {
        "engine"
    }

    /// First-time load. Called at most once per successful lifetime.
    fn init(&self) -> Result<(), EngineError>;

    /// Re-provisioning; always preceded by
    /// [`DependentNotifier::notify_directory_changed`].
    fn deploy(&self) -> Result<(), EngineError>;
}

/// Shared engine handle.
pub type EngineRef = Arc<dyn Engine>;

/// Storage precondition for `startup()`.
pub trait StorageAvailability: Send + Sync + 'static {
    /// Returns `true` if the engine's data can be read right now.
    fn is_available(&self) -> bool;
}

impl<F> StorageAvailability for F
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn is_available(&self) -> bool {
        self()
    }
}

/// Storage that is always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl StorageAvailability for AlwaysAvailable {
    fn is_available(&self) -> bool {
        true
    }
}

/// Collaborators that cache directory contents and must refresh before a deploy.
pub trait DependentNotifier: Send + Sync + 'static {
    /// Signals that the engine's data directory changed.
    fn notify_directory_changed(&self);
}

impl<F> DependentNotifier for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn notify_directory_changed(&self) {
        self()
    }
}

/// Notifier with no dependents.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl DependentNotifier for NoopNotifier {
    fn notify_directory_changed(&self) {}
}

/// Closure-backed engine.
pub struct EngineFn<I, D> {
    name: Cow<'static, str>,
    init: I,
    deploy: D,
}

impl<I, D> EngineFn<I, D>
where
    I: Fn() -> Result<(), EngineError> + Send + Sync + 'static,
    D: Fn() -> Result<(), EngineError> + Send + Sync + 'static,
{
    /// Creates a new closure-backed engine.
    pub fn new(name: impl Into<Cow<'static, str>>, init: I, deploy: D) -> Self {
        Self {
            name: name.into(),
            init,
            deploy,
        }
    }

    /// Creates the engine and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, init: I, deploy: D) -> Arc<Self> {
        Arc::new(Self::new(name, init, deploy))
    }
}

impl<I, D> Engine for EngineFn<I, D>
where
    I: Fn() -> Result<(), EngineError> + Send + Sync + 'static,
    D: Fn() -> Result<(), EngineError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> Result<(), EngineError> {
        (self.init)()
    }

    fn deploy(&self) -> Result<(), EngineError> {
        (self.deploy)()
    }
}
