//! # Non-blocking mutual-exclusion gate.
//!
//! [`Gate`] serializes short *decisions* (who may start or deploy, state-cell
//! writes). It is a single atomic flag acquired with compare-and-swap; the
//! fast path never waits.
//!
//! ## Rules
//! - [`Gate::try_acquire`] returns `None` instead of waiting when the gate is held.
//! - Holding is represented by a [`GateGuard`]; dropping it releases the gate.
//!   A call can only release a gate it actually acquired.
//! - `GateGuard` is `!Send`: it is released by the thread that acquired it and
//!   cannot be held across an `.await` in a spawned future.
//! - Holders never run slow bodies.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Compare-and-swap gate.
#[derive(Debug, Default)]
pub struct Gate {
    held: AtomicBool,
}

impl Gate {
    /// Creates an open gate.
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Attempts to acquire the gate without blocking.
    ///
    /// # Example
    /// ```
    /// use engine_lifecycle::Gate;
    ///
    /// let gate = Gate::new();
    /// let guard = gate.try_acquire().expect("open gate");
    /// assert!(gate.try_acquire().is_none());
    /// drop(guard);
    /// assert!(gate.try_acquire().is_some());
    /// ```
    #[must_use]
    pub fn try_acquire(&self) -> Option<GateGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GateGuard {
                gate: self,
                _not_send: PhantomData,
            })
    }

    /// Returns `true` while some caller holds the gate.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

/// Proof of holding a [`Gate`]; releases it on drop.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a Gate,
    _not_send: PhantomData<*const ()>,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.held.store(false, Ordering::SeqCst);
    }
}
