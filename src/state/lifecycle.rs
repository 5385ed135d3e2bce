//! # Engine lifecycle state.
//!
//! [`LifecycleState`] describes engine availability. Legal edges:
//!
//! ```text
//!  Uninitialized ──► InProgress ──► Ready
//!                        ▲   │        │
//!                        │   ▼        │
//!                     Failed ◄────────┘ (via InProgress only)
//!
//!  Uninitialized → InProgress   first init begins
//!  InProgress    → Ready        init or deploy completed
//!  Ready         → InProgress   deploy begins
//!  InProgress    → Failed       init or deploy body failed
//!  Failed        → InProgress   init retry or deploy begins
//! ```
//!
//! Nothing ever returns to `Uninitialized`.

use std::fmt;

/// Engine availability.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Engine has never been started.
    #[default]
    Uninitialized = 0,
    /// An init or deploy body is running.
    InProgress = 1,
    /// Engine is loaded and usable.
    Ready = 2,
    /// The last init or deploy body failed.
    Failed = 3,
}

impl LifecycleState {
    /// Returns `true` if moving from `self` to `next` is a legal edge.
    ///
    /// Staying in the same state is not an edge and returns `false`.
    ///
    /// # Example
    /// ```
    /// use engine_lifecycle::LifecycleState;
    ///
    /// assert!(LifecycleState::Ready.can_transition_to(LifecycleState::InProgress));
    /// assert!(!LifecycleState::Ready.can_transition_to(LifecycleState::Uninitialized));
    /// ```
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, InProgress)
                | (InProgress, Ready)
                | (InProgress, Failed)
                | (Ready, InProgress)
                | (Failed, InProgress)
        )
    }

    /// Short lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::InProgress => "in_progress",
            LifecycleState::Ready => "ready",
            LifecycleState::Failed => "failed",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LifecycleState::InProgress,
            2 => LifecycleState::Ready,
            3 => LifecycleState::Failed,
            _ => LifecycleState::Uninitialized,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    const ALL: [LifecycleState; 4] = [Uninitialized, InProgress, Ready, Failed];

    #[test]
    fn test_legal_edges() {
        let legal = [
            (Uninitialized, InProgress),
            (InProgress, Ready),
            (InProgress, Failed),
            (Ready, InProgress),
            (Failed, InProgress),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_never_back_to_uninitialized() {
        for from in ALL {
            assert!(!from.can_transition_to(Uninitialized));
        }
    }

    #[test]
    fn test_u8_roundtrip() {
        for s in ALL {
            assert_eq!(LifecycleState::from_u8(s as u8), s);
        }
    }
}
