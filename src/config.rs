//! # Coordinator configuration.
//!
//! Provides [`CoordinatorConfig`], the centralized settings for a
//! [`Coordinator`](crate::Coordinator).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`CoordinatorConfig::bus_capacity_clamped`]
//! - `slow_body_warning = 0s` → never warn about slow engine bodies
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use engine_lifecycle::CoordinatorConfig;
//!
//! let mut cfg = CoordinatorConfig::default();
//! cfg.retry_failed_init = false;
//! cfg.slow_body_warning = Duration::ZERO;
//!
//! assert_eq!(cfg.slow_body_threshold(), None);
//! ```

use std::time::Duration;

/// Configuration for a coordinator.
///
/// ## Field semantics
/// - `bus_capacity`: lifecycle event bus ring buffer size (min 1)
/// - `retry_failed_init`: whether a `Failed` engine that never became ready is re-initialized on the next trigger
/// - `slow_body_warning`: engine bodies slower than this log a warning (`0s` = off)
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Capacity of the lifecycle event bus.
    ///
    /// Subscribers lagging behind more than `bus_capacity` events skip the
    /// oldest ones.
    pub bus_capacity: usize,

    /// Treat [`LifecycleState::Failed`](crate::LifecycleState::Failed) like
    /// `Uninitialized` when `startup()` / `run_check()` decide whether to load
    /// the engine.
    ///
    /// Has no effect once any body has reached `Ready`: `Engine::init` never
    /// runs again after succeeding. With `false`, a failed engine stays failed
    /// until a successful `deploy()`.
    pub retry_failed_init: bool,

    /// Threshold above which a finished init/deploy body logs a warning.
    pub slow_body_warning: Duration,
}

impl CoordinatorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the slow-body warning threshold as an `Option`.
    ///
    /// - `None` → never warn
    /// - `Some(d)` → warn when a body takes longer than `d`
    #[inline]
    pub fn slow_body_threshold(&self) -> Option<Duration> {
        if self.slow_body_warning == Duration::ZERO {
            None
        } else {
            Some(self.slow_body_warning)
        }
    }
}

impl Default for CoordinatorConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `retry_failed_init = true`
    /// - `slow_body_warning = 10s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            retry_failed_init: true,
            slow_body_warning: Duration::from_secs(10),
        }
    }
}
