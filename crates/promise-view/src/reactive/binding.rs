#![forbid(unsafe_code)]

//! Binding between an [`Observable`] and one mounted renderable unit.
//!
//! # Design
//!
//! A [`Binding`] is created when the unit mounts and dropped when it
//! unmounts. While alive, every effective write to the source invokes the
//! host's re-render hook; reads go straight through to the source, so the
//! unit sees the live value on every render, including the very first one
//! (no uninitialized flash).
//!
//! # Invariants
//!
//! 1. `get()` never returns a stale copy; it reads the source directly.
//! 2. The re-render hook fires once per effective write while the binding
//!    is alive, and never after drop.
//! 3. `rebind()` tears the previous subscription down before attaching to
//!    the new source.

use tracing::trace;

use super::observable::{Observable, Subscription};

/// Live connection from a mounted renderable unit to an [`Observable`].
#[derive(Debug)]
pub struct Binding<T: 'static> {
    source: Observable<T>,
    anchor: Subscription,
}

impl<T: Clone + 'static> Binding<T> {
    /// Attach to a source for the lifetime of a mounted unit.
    ///
    /// `request_render` is the host's scheduling hook: it must arrange for
    /// the unit to render again within the current cooperative pass.
    pub fn mount(source: &Observable<T>, request_render: impl Fn() + 'static) -> Self {
        let anchor = source.subscribe(move |_| request_render());
        trace!("binding mounted");
        Self {
            source: source.clone(),
            anchor,
        }
    }

    /// The live current value of the bound source.
    #[must_use]
    pub fn get(&self) -> T {
        self.source.get()
    }

    /// Access the live current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    /// Whether this binding observes the given cell.
    #[must_use]
    pub fn observes(&self, source: &Observable<T>) -> bool {
        self.source.ptr_eq(source)
    }

    /// Switch to a different source cell.
    ///
    /// The previous subscription is removed before the new one is attached,
    /// so the old source can never schedule a render for this unit again.
    pub fn rebind(&mut self, source: &Observable<T>, request_render: impl Fn() + 'static) {
        self.anchor.unsubscribe();
        self.anchor = source.subscribe(move |_| request_render());
        self.source = source.clone();
        trace!("binding moved to a new source");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        (count, move || count_clone.set(count_clone.get() + 1))
    }

    #[test]
    fn initial_value_readable_synchronously() {
        let cell = Observable::new(5);
        let (renders, hook) = counter();
        let binding = Binding::mount(&cell, hook);

        // First render reads the live value with no notification needed.
        assert_eq!(binding.get(), 5);
        assert_eq!(renders.get(), 0);
    }

    #[test]
    fn effective_write_schedules_render() {
        let cell = Observable::new(0);
        let (renders, hook) = counter();
        let binding = Binding::mount(&cell, hook);

        cell.set(1);
        assert_eq!(renders.get(), 1);
        assert_eq!(binding.get(), 1);

        cell.set(1); // gated
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn drop_tears_down_subscription() {
        let cell = Observable::new(0);
        let (renders, hook) = counter();
        let binding = Binding::mount(&cell, hook);
        assert_eq!(cell.subscriber_count(), 1);

        drop(binding);
        assert_eq!(cell.subscriber_count(), 0);

        cell.set(1);
        assert_eq!(renders.get(), 0);
    }

    #[test]
    fn rebind_moves_to_new_source() {
        let first = Observable::new(0);
        let second = Observable::new(10);
        let (renders, hook) = counter();
        let mut binding = Binding::mount(&first, hook);
        assert!(binding.observes(&first));

        let (renders2, hook2) = counter();
        binding.rebind(&second, hook2);
        assert!(binding.observes(&second));
        assert_eq!(first.subscriber_count(), 0);
        assert_eq!(binding.get(), 10);

        // Old source no longer reaches the unit.
        first.set(1);
        assert_eq!(renders.get(), 0);

        second.set(11);
        assert_eq!(renders2.get(), 1);
    }

    #[test]
    fn with_reads_through() {
        let cell = Observable::new(vec![1, 2, 3]);
        let (_, hook) = counter();
        let binding = Binding::mount(&cell, hook);
        assert_eq!(binding.with(|v| v.iter().sum::<i32>()), 6);
    }
}
