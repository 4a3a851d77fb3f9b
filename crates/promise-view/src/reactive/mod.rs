#![forbid(unsafe_code)]

//! Change tracking for the promise bridge.
//!
//! Two primitives live here:
//!
//! - [`Observable`]: the single-value cell the bridge writes invocation
//!   records into. Writes are equality-gated; effective writes notify
//!   subscribers synchronously, before the write call returns.
//! - [`Binding`]: the glue between a cell and one mounted renderable unit.
//!   While mounted it forwards every effective write to the host's
//!   re-render hook; reads always go to the live cell.
//!
//! A [`Subscription`] is the RAII side of `Observable::subscribe`: the cell
//! holds callbacks weakly, so dropping the guard (or a `Binding`, which owns
//! one) is all it takes to unsubscribe — mid-notification included, in which
//! case the remainder of that pass skips the removed callback. There is no
//! bulk clear; subscribers come and go one at a time with their guards.
//!
//! Everything is single-threaded: `Rc`-shared interiors, no locks, no async
//! scheduling. Version numbers count effective writes only, so a write of an
//! equal value is observably a no-op from every angle.

pub mod binding;
pub mod observable;

pub use binding::Binding;
pub use observable::{Observable, Subscription};
