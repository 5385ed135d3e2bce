//! # Status channel: current lifecycle state plus change notifications.
//!
//! [`StatusChannel`] keeps the state in an atomic cell for instantaneous
//! reads and mirrors every change into a [`tokio::sync::watch`] channel so
//! any number of observers can follow it.
//!
//! ## Rules
//! - `current()` never blocks and never waits for observers.
//! - `observe()` yields the current value first, then later values.
//! - A slow observer may skip intermediate values but always sees the latest one.
//! - Only legal edges (see [`LifecycleState::can_transition_to`]) are applied.

use std::sync::atomic::{AtomicU8, Ordering};

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

use super::LifecycleState;

/// Infinite stream of lifecycle states returned by [`StatusChannel::observe`].
pub type StatusStream = BoxStream<'static, LifecycleState>;

/// Broadcasts [`LifecycleState`] changes.
#[derive(Debug)]
pub struct StatusChannel {
    cell: AtomicU8,
    tx: watch::Sender<LifecycleState>,
}

impl StatusChannel {
    /// Creates a channel in [`LifecycleState::Uninitialized`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Uninitialized);
        Self {
            cell: AtomicU8::new(LifecycleState::Uninitialized as u8),
            tx,
        }
    }

    /// Instantaneous read of the current state.
    #[inline]
    pub fn current(&self) -> LifecycleState {
        LifecycleState::from_u8(self.cell.load(Ordering::SeqCst))
    }

    /// Applies `next` if it is a legal edge from the current state.
    ///
    /// Returns `Ok(previous)` when the state changed or already equals `next`
    /// (a no-op observation), `Err(current)` when the edge is illegal.
    pub fn transition(&self, next: LifecycleState) -> Result<LifecycleState, LifecycleState> {
        let mut outcome = Err(next);
        self.tx.send_if_modified(|cur| {
            let prev = *cur;
            if prev == next {
                outcome = Ok(prev);
                return false;
            }
            if !prev.can_transition_to(next) {
                outcome = Err(prev);
                return false;
            }
            // Cell and watch value change together under the watch lock.
            self.cell.store(next as u8, Ordering::SeqCst);
            *cur = next;
            outcome = Ok(prev);
            true
        });

        if let Err(cur) = outcome {
            tracing::warn!(from = %cur, to = %next, "illegal lifecycle transition rejected");
        }
        outcome
    }

    /// Returns a stream that yields the current state immediately, then every
    /// later state for as long as the channel lives.
    pub fn observe(&self) -> StatusStream {
        let rx = self.tx.subscribe();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let state = *rx.borrow_and_update();
            Some((state, (rx, false)))
        })
        .boxed()
    }

    /// Returns a raw watch receiver (for `select!`-style consumers).
    pub fn watch(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}
