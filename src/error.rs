//! Error types used by the coordinator and its engine collaborators.
//!
//! This module defines two error enums:
//!
//! - [`EngineError`]: failures reported by (or caught around) an engine body.
//! - [`LifecycleError`]: outcomes of coordinator operations that did not succeed.
//!
//! Both provide `as_label` / `as_message` helpers for logs and event payloads.
//! None of these ever cross the public boundary as a panic: callers receive
//! them as values (or as booleans / state observations).

use thiserror::Error;

/// # Errors produced by engine bodies.
///
/// Engines return [`EngineError::Failed`] from `init` / `deploy`.
/// [`EngineError::Panicked`] is produced by the coordinator when a body
/// unwinds instead of returning.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine body reported a failure.
    #[error("engine failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The engine body panicked; the panic was caught on the background context.
    #[error("engine panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text, if it was a string.
        info: String,
    },
}

impl EngineError {
    /// Shorthand for [`EngineError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        EngineError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use engine_lifecycle::EngineError;
    ///
    /// let err = EngineError::failed("schema missing");
    /// assert_eq!(err.as_label(), "engine_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::Failed { .. } => "engine_failed",
            EngineError::Panicked { .. } => "engine_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EngineError::Failed { error } => format!("error: {error}"),
            EngineError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

/// # Outcomes of coordinator operations that did not succeed.
///
/// `StorageUnavailable` and `Busy` are normal, non-fatal outcomes: the caller
/// may simply try again later. `InitFailed` / `DeployFailed` wrap the engine
/// error that moved the coordinator into the `Failed` state.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Storage precondition did not hold; startup deferred.
    #[error("storage unavailable; startup deferred")]
    StorageUnavailable,

    /// Another startup or deploy owns the gate, or the engine is in progress.
    #[error("engine busy")]
    Busy,

    /// The initial engine load failed.
    #[error("init failed: {source}")]
    InitFailed {
        /// The engine error.
        source: EngineError,
    },

    /// Re-provisioning the engine failed.
    #[error("deploy failed: {source}")]
    DeployFailed {
        /// The engine error.
        source: EngineError,
    },

    /// No tokio runtime to run slow bodies on.
    #[error("no tokio runtime available for background work")]
    RuntimeUnavailable,
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use engine_lifecycle::LifecycleError;
    ///
    /// assert_eq!(LifecycleError::Busy.as_label(), "lifecycle_busy");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::StorageUnavailable => "lifecycle_storage_unavailable",
            LifecycleError::Busy => "lifecycle_busy",
            LifecycleError::InitFailed { .. } => "lifecycle_init_failed",
            LifecycleError::DeployFailed { .. } => "lifecycle_deploy_failed",
            LifecycleError::RuntimeUnavailable => "lifecycle_runtime_unavailable",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LifecycleError::StorageUnavailable => "storage unavailable".to_string(),
            LifecycleError::Busy => "busy".to_string(),
            LifecycleError::InitFailed { source } => format!("init: {}", source.as_message()),
            LifecycleError::DeployFailed { source } => {
                format!("deploy: {}", source.as_message())
            }
            LifecycleError::RuntimeUnavailable => "runtime unavailable".to_string(),
        }
    }

    /// Indicates whether retrying the same call later may succeed without
    /// any change to the engine.
    ///
    /// Returns `true` for [`LifecycleError::Busy`] and
    /// [`LifecycleError::StorageUnavailable`].
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LifecycleError::Busy | LifecycleError::StorageUnavailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_labels() {
        assert_eq!(EngineError::failed("x").as_label(), "engine_failed");
        let p = EngineError::Panicked {
            info: "boom".into(),
        };
        assert_eq!(p.as_label(), "engine_panicked");
        assert_eq!(p.as_message(), "panic: boom");
    }

    #[test]
    fn test_lifecycle_error_wraps_engine_error() {
        let err = LifecycleError::DeployFailed {
            source: EngineError::failed("bad schema"),
        };
        assert_eq!(err.to_string(), "deploy failed: engine failed: bad schema");
        assert_eq!(err.as_message(), "deploy: error: bad schema");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_outcomes() {
        assert!(LifecycleError::Busy.is_transient());
        assert!(LifecycleError::StorageUnavailable.is_transient());
        assert!(!LifecycleError::RuntimeUnavailable.is_transient());
    }
}
