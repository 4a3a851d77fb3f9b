#![forbid(unsafe_code)]

//! Bridge an imperative async call to a declaratively rendered component.
//!
//! Calling [`Invoker::invoke`] makes the wrapped component appear wherever
//! the paired [`PromiseView`] is mounted in the host's tree. The component
//! receives `resolve`/`reject` entry points through its [`Record`]; whichever
//! fires first settles the [`Promised`] returned to the caller, and the
//! component is removed.
//!
//! The crate is single-threaded by design: state lives in `Rc`-shared cells
//! and notification is synchronous within the write. The host rendering
//! engine supplies scheduling (a `request_render` hook at mount time) and
//! owns when renders actually commit.
//!
//! ```
//! use promise_view::{render_promise, Record};
//!
//! // A stand-in component: the rendered node is just a clone of the record,
//! // the way a real host would wire the record into button callbacks.
//! let (ask, view) = render_promise(|record: &Record<u32, (), String>| record.clone());
//! view.mount(|| { /* host: schedule a render */ });
//!
//! let answer = ask.invoke();
//! if let Some(form) = view.render() {
//!     form.resolve(42); // the user submitted "42"
//! }
//! assert_eq!(pollster::block_on(answer), Ok(42));
//! assert!(view.render().is_none()); // component is gone again
//! ```

pub mod bridge;
pub mod promise;
pub mod reactive;

pub use bridge::{Invoker, PromiseView, Record, render_promise};
pub use promise::{Promised, Settle, SettleState};
pub use reactive::{Binding, Observable, Subscription};
