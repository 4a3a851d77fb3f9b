#![forbid(unsafe_code)]

//! Single-threaded deferred result: pending until settled exactly once.
//!
//! # Design
//!
//! [`Promised<T, E>`] and [`Settle<T, E>`] are the two ends of one shared
//! settlement slot. `Settle` is cheaply cloneable and hands the resolve and
//! reject entry points to whoever drives the outcome (for this crate: the
//! rendered component's props). `Promised` is the consumer end: it can be
//! awaited as a `Future`, or inspected synchronously via
//! [`state()`](Promised::state) by hosts that poll.
//!
//! The rejection reason `E` is an opaque caller-chosen value. It passes
//! through verbatim; nothing here wraps or classifies it.
//!
//! # Invariants
//!
//! 1. Exactly one settlement: the first `resolve`/`reject` call on any
//!    `Settle` clone wins; every later call is ignored and reports `false`.
//! 2. A waker registered while pending is woken on settlement.
//! 3. `state()` never regresses: `Pending` → `Fulfilled` or `Rejected`,
//!    terminal thereafter.
//!
//! # Failure Modes
//!
//! - **All `Settle` clones dropped while pending**: the `Promised` stays
//!   pending forever. Awaiting it never completes. This is the documented
//!   fate of a superseded invocation whose component was unmounted.
//! - **Polled after completion**: the outcome is consumed by the completing
//!   poll; a `Future` must not be polled again after `Ready`, per the usual
//!   contract.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::{debug, trace};

/// Snapshot of a settlement slot's lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleState {
    /// Not yet resolved or rejected.
    Pending,
    /// Resolved with a value.
    Fulfilled,
    /// Rejected with a reason.
    Rejected,
}

/// Shared settlement slot between a [`Promised`] and its [`Settle`] handles.
struct Slot<T, E> {
    state: Cell<SettleState>,
    outcome: RefCell<Option<Result<T, E>>>,
    waker: RefCell<Option<Waker>>,
}

/// The consumer end of a deferred result.
///
/// Await it as a `Future<Output = Result<T, E>>`, or inspect it with
/// [`state()`](Self::state) without consuming anything.
pub struct Promised<T, E> {
    slot: Rc<Slot<T, E>>,
}

/// The producer end of a deferred result.
///
/// Cloneable; all clones refer to the same settlement slot.
pub struct Settle<T, E> {
    slot: Rc<Slot<T, E>>,
}

impl<T, E> Clone for Settle<T, E> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T, E> Promised<T, E> {
    /// Create a pending deferred result and its settlement handle.
    #[must_use]
    pub fn new() -> (Self, Settle<T, E>) {
        let slot = Rc::new(Slot {
            state: Cell::new(SettleState::Pending),
            outcome: RefCell::new(None),
            waker: RefCell::new(None),
        });
        (
            Self {
                slot: Rc::clone(&slot),
            },
            Settle { slot },
        )
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn state(&self) -> SettleState {
        self.slot.state.get()
    }

    /// Whether a settlement has happened (either path).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.state.get() != SettleState::Pending
    }
}

impl<T, E> Settle<T, E> {
    /// Fulfill the deferred result with `value`.
    ///
    /// Returns `true` if this call performed the settlement, `false` if the
    /// slot was already settled (the call is ignored).
    pub fn resolve(&self, value: T) -> bool {
        self.finish(Ok(value))
    }

    /// Reject the deferred result with `reason`, passed through verbatim.
    ///
    /// Returns `true` if this call performed the settlement, `false` if the
    /// slot was already settled (the call is ignored).
    pub fn reject(&self, reason: E) -> bool {
        self.finish(Err(reason))
    }

    /// Current lifecycle stage of the shared slot.
    #[must_use]
    pub fn state(&self) -> SettleState {
        self.slot.state.get()
    }

    fn finish(&self, outcome: Result<T, E>) -> bool {
        if self.slot.state.get() != SettleState::Pending {
            trace!("settlement ignored: already settled");
            return false;
        }
        let next = if outcome.is_ok() {
            SettleState::Fulfilled
        } else {
            SettleState::Rejected
        };
        self.slot.state.set(next);
        *self.slot.outcome.borrow_mut() = Some(outcome);
        debug!(state = ?next, "deferred result settled");
        if let Some(waker) = self.slot.waker.borrow_mut().take() {
            waker.wake();
        }
        true
    }
}

impl<T, E> Future for Promised<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.slot.outcome.borrow_mut().take() {
            return Poll::Ready(outcome);
        }
        *self.slot.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T, E> std::fmt::Debug for Promised<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promised")
            .field("state", &self.state())
            .finish()
    }
}

impl<T, E> std::fmt::Debug for Settle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settle")
            .field("state", &self.state())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
