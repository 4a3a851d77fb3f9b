#![forbid(unsafe_code)]

//! Shared single-value cell with equality-gated change notification.
//!
//! # Design
//!
//! [`Observable<T>`] holds one value behind `Rc<..>` shared ownership.
//! Writes go through a single gate: the next value is compared against the
//! current one with the cell's equality predicate, and only an *effective*
//! write (one that changes the value) bumps the version and notifies
//! subscribers. Notification is fully synchronous: every currently registered
//! subscriber runs before the write call returns.
//!
//! Subscribers are held as `Weak` references. The strong reference lives in
//! the [`Subscription`] returned by [`subscribe()`](Observable::subscribe);
//! dropping the guard (or calling [`Subscription::unsubscribe`]) kills the
//! callback, and dead entries are pruned lazily on the next notification.
//!
//! # Invariants
//!
//! 1. A write equal to the current value triggers zero notifications and no
//!    version bump.
//! 2. An effective write invokes each registered subscriber exactly once,
//!    with the freshly written value.
//! 3. A subscriber removed during a notification pass — even from inside
//!    another subscriber's callback — is not invoked for the remainder of
//!    that pass.
//! 4. Re-entrant writes from inside a callback are permitted; each effective
//!    write runs its own complete notification pass.
//!
//! # Failure Modes
//!
//! None. The cell has no fallible operations; the equality predicate is
//! trusted to be total and side-effect-free.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

type ListenerFn<T> = dyn Fn(&T);
type EqualityFn<T> = dyn Fn(&T, &T) -> bool;

/// Shared interior for [`Observable<T>`].
struct ObservableInner<T> {
    /// The current value.
    value: RefCell<T>,
    /// Monotonically increasing version, bumped on each effective write.
    version: Cell<u64>,
    /// Registered subscriber callbacks, weakly held in registration order.
    subscribers: RefCell<Vec<Weak<ListenerFn<T>>>>,
    /// Equality predicate gating writes.
    equals: Box<EqualityFn<T>>,
}

/// A shared, version-tracked value cell with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** cell.
///
/// # Invariants
///
/// 1. `get()` always returns the latest written value.
/// 2. `set()`/`update()` notify subscribers synchronously, and only when the
///    value actually changed under the cell's equality predicate.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a cell using `PartialEq` as the write gate.
    #[must_use]
    pub fn new(initial: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(initial, |a, b| a == b)
    }

    /// Create a cell with a custom equality predicate.
    ///
    /// The predicate decides whether a write is a no-op. It must be total
    /// and side-effect-free.
    #[must_use]
    pub fn with_equality(initial: T, equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(initial),
                version: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
                equals: Box::new(equals),
            }),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure writes back into the same cell (re-entrant
    /// borrow). Writes belong in subscriber callbacks, not in readers.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Write a new value.
    ///
    /// Returns `true` if the value changed (version bumped, subscribers
    /// notified), `false` if the write was gated off as equal to the current
    /// value. The resulting value is readable via [`get()`](Self::get)
    /// either way.
    pub fn set(&self, next: T) -> bool {
        {
            let current = self.inner.value.borrow();
            if (self.inner.equals)(&current, &next) {
                return false;
            }
        }
        *self.inner.value.borrow_mut() = next;
        self.inner.version.set(self.inner.version.get() + 1);
        self.notify();
        true
    }

    /// Derive the next value from the current one, then write it.
    ///
    /// The same no-op-if-equal gate as [`set()`](Self::set) applies to the
    /// derived value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = {
            let current = self.inner.value.borrow();
            f(&current)
        };
        self.set(next)
    }

    /// Register a change callback.
    ///
    /// The callback runs synchronously inside every effective write, with the
    /// freshly written value. The returned [`Subscription`] keeps the
    /// callback alive; dropping it unsubscribes.
    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<ListenerFn<T>> = Rc::new(listener);
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&callback));
        trace!(
            subscribers = self.subscriber_count(),
            "observable subscriber registered"
        );
        Subscription::new(callback)
    }

    /// Number of live subscribers (diagnostics).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Current version number. Increments by 1 on each effective write.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether two handles refer to the same underlying cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run all live subscribers against the freshly written value.
    ///
    /// The weak list is snapshot up front and each entry upgraded at
    /// invocation time, so a subscriber dropped mid-pass (from inside
    /// another callback) is skipped rather than invoked. The value is
    /// re-read per invocation: if a callback re-enters `set()`, the rest
    /// of the pass sees the value that write produced, not the one that
    /// started the pass.
    fn notify(&self) {
        let snapshot: Vec<Weak<ListenerFn<T>>> = self.inner.subscribers.borrow().clone();
        for weak in snapshot {
            if let Some(callback) = weak.upgrade() {
                let current = self.inner.value.borrow().clone();
                callback(&current);
            }
        }
        // Prune entries whose Subscription has gone away.
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0);
    }
}

/// RAII guard for a registered subscriber.
///
/// Holds the strong reference to the callback; the observable only holds a
/// `Weak`. Dropping the guard (or calling [`unsubscribe`](Self::unsubscribe))
/// removes the callback before it is next invoked.
#[must_use = "dropping the Subscription immediately unsubscribes"]
pub struct Subscription {
    anchor: RefCell<Option<Rc<dyn Any>>>,
}

impl Subscription {
    fn new<T: 'static>(callback: Rc<ListenerFn<T>>) -> Self {
        Self {
            anchor: RefCell::new(Some(Rc::new(callback))),
        }
    }

    /// Remove the subscriber explicitly. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if self.anchor.take().is_some() {
            trace!("observable subscriber removed");
        }
    }

    /// Whether the subscriber is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.anchor.borrow().is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
