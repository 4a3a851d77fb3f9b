#![forbid(unsafe_code)]

//! The promise bridge: an imperative call that renders a component and
//! settles when the component answers.
//!
//! [`render_promise`] wraps a caller-supplied component and returns a pair:
//! an [`Invoker`] and a [`PromiseView`]. Mount the view once somewhere in the
//! host's tree; each `invoke` then makes the component appear with `resolve`
//! and `reject` wired into its props, and the returned [`Promised`] settles
//! with whichever the component calls first. Settlement clears the shared
//! cell, which removes the component from the tree.
//!
//! # Lifecycle
//!
//! Per invocation: idle → pending (record visible, component rendered) →
//! settled (record cleared, component unmounted). Settled is
//! indistinguishable from idle at the cell level; a fresh `invoke` starts a
//! new cycle in the same slot.
//!
//! # Superseding
//!
//! A second `invoke` while the first is still pending overwrites the visible
//! record. The first invocation's [`Promised`] is *not* rejected: it stays
//! pending forever unless its [`Record`] was retained externally and settled
//! later. In that case its settlement still clears the cell, hiding whatever
//! record is visible at that moment. Both behaviors match the original
//! contract of the bridge; callers that need a hard guarantee should settle
//! or drop an invocation before starting the next one.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::promise::Promised;
use crate::reactive::{Binding, Observable};

static NEXT_INVOCATION_ID: AtomicU64 = AtomicU64::new(1);

fn next_invocation_id() -> u64 {
    NEXT_INVOCATION_ID.fetch_add(1, Ordering::Relaxed)
}

/// The invocation record: caller props plus the settlement entry points.
///
/// This is what the rendered component receives. Calling
/// [`resolve`](Self::resolve) or [`reject`](Self::reject) settles the
/// invocation's [`Promised`] (first call wins) and clears the bridge's cell.
///
/// Equality is identity: two records compare equal only if they belong to
/// the same invocation. Writing a fresh record into the cell therefore
/// always notifies, while clearing an already-empty cell never does.
pub struct Record<T, P, E> {
    id: u64,
    /// Caller-supplied props, passed through untouched.
    pub props: P,
    resolve: Rc<dyn Fn(T)>,
    reject: Rc<dyn Fn(E)>,
}

impl<T, P: Clone, E> Clone for Record<T, P, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            props: self.props.clone(),
            resolve: Rc::clone(&self.resolve),
            reject: Rc::clone(&self.reject),
        }
    }
}

impl<T, P, E> PartialEq for Record<T, P, E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T, P, E> Record<T, P, E> {
    /// Identifier of the invocation this record belongs to.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Fulfill the invocation with `value`.
    ///
    /// Ignored if the invocation already settled.
    pub fn resolve(&self, value: T) {
        (self.resolve)(value);
    }

    /// Reject the invocation with `reason`, passed through verbatim.
    ///
    /// Ignored if the invocation already settled.
    pub fn reject(&self, reason: E) {
        (self.reject)(reason);
    }
}

impl<T, P, E> std::fmt::Debug for Record<T, P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record").field("id", &self.id).finish()
    }
}

/// The imperative end of a bridge: starts invocations.
///
/// Cloneable; all clones write into the same cell.
pub struct Invoker<T, P, E> {
    cell: Observable<Option<Record<T, P, E>>>,
}

impl<T, P, E> Clone for Invoker<T, P, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, P, E> Invoker<T, P, E>
where
    T: 'static,
    P: Clone + 'static,
    E: 'static,
{
    /// Start an invocation with the given props.
    ///
    /// Writes the merged record into the cell (the paired [`PromiseView`]
    /// renders the component on its next pass) and returns the deferred
    /// result. Whichever of the record's `resolve`/`reject` fires first
    /// settles it; settlement then clears the cell on both paths.
    pub fn invoke_with(&self, props: P) -> Promised<T, E> {
        let (promised, settle) = Promised::new();
        let id = next_invocation_id();

        if let Some(previous) = self.cell.with(|record| record.as_ref().map(Record::id)) {
            debug!(superseded = previous, invocation = id, "invocation superseded");
        }

        let resolve = {
            let settle = settle.clone();
            let cell = self.cell.clone();
            Rc::new(move |value: T| {
                if settle.resolve(value) {
                    cell.set(None);
                }
            }) as Rc<dyn Fn(T)>
        };
        let reject = {
            let cell = self.cell.clone();
            Rc::new(move |reason: E| {
                if settle.reject(reason) {
                    cell.set(None);
                }
            }) as Rc<dyn Fn(E)>
        };

        debug!(invocation = id, "invocation started");
        self.cell.set(Some(Record {
            id,
            props,
            resolve,
            reject,
        }));
        promised
    }

    /// Start an invocation with default props.
    pub fn invoke(&self) -> Promised<T, E>
    where
        P: Default,
    {
        self.invoke_with(P::default())
    }

    /// Whether an invocation is currently visible in the cell.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.cell.with(Option::is_some)
    }
}

impl<T: 'static, P: Clone + 'static, E: 'static> std::fmt::Debug for Invoker<T, P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("pending", &self.cell.with(Option::is_some))
            .finish()
    }
}

/// The declarative end of a bridge: the renderable unit.
///
/// Mount it once per bridge instance. While no invocation is visible,
/// [`render`](Self::render) yields `None` — a true no-render, not an empty
/// placeholder.
pub struct PromiseView<T: 'static, P: 'static, E: 'static, N> {
    cell: Observable<Option<Record<T, P, E>>>,
    component: Box<dyn Fn(&Record<T, P, E>) -> N>,
    binding: RefCell<Option<Binding<Option<Record<T, P, E>>>>>,
}

impl<T: 'static, P: 'static, E: 'static, N> PromiseView<T, P, E, N> {
    /// Detach from the host. The cell keeps its value; only the
    /// re-render scheduling stops.
    pub fn unmount(&self) {
        if self.binding.borrow_mut().take().is_some() {
            trace!("promise view unmounted");
        }
    }

    /// Whether the view is currently attached to a host.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.binding.borrow().is_some()
    }
}

impl<T, P, E, N> PromiseView<T, P, E, N>
where
    T: 'static,
    P: Clone + 'static,
    E: 'static,
{
    /// Attach to the host's render scheduling.
    ///
    /// `request_render` is invoked on every effective cell change until
    /// [`unmount`](Self::unmount). Mounting again first tears down the
    /// previous binding.
    pub fn mount(&self, request_render: impl Fn() + 'static) {
        let mut slot = self.binding.borrow_mut();
        // Drop any previous binding before subscribing anew.
        *slot = None;
        *slot = Some(Binding::mount(&self.cell, request_render));
        trace!("promise view mounted");
    }

    /// Produce the node for the current pass.
    ///
    /// `None` while the cell is empty; otherwise the caller-supplied
    /// component applied to the live record. The read goes to the cell
    /// directly, so an invocation performed before [`mount`](Self::mount)
    /// is visible on the first post-mount render.
    pub fn render(&self) -> Option<N> {
        self.cell
            .with(|record| record.as_ref().map(|record| (self.component)(record)))
    }
}

impl<T: 'static, P: 'static, E: 'static, N> std::fmt::Debug for PromiseView<T, P, E, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromiseView")
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// Build a bridge around a caller-supplied component.
///
/// `component` maps the live [`Record`] to the host's node type `N`; it runs
/// once per render pass in which an invocation is visible. The returned
/// [`Invoker`] and [`PromiseView`] share one private cell, created here and
/// owned by this bridge instance alone.
///
/// # Example
///
/// ```
/// use promise_view::{render_promise, Record};
///
/// // The "component" here just exposes the record as the rendered node.
/// let (invoker, view) = render_promise(|record: &Record<i32, (), &str>| record.clone());
/// view.mount(|| { /* host schedules a re-render */ });
///
/// let pending = invoker.invoke();
/// let node = view.render().expect("component visible after invoke");
/// node.resolve(42);
///
/// assert!(view.render().is_none());
/// assert_eq!(pollster::block_on(pending), Ok(42));
/// ```
pub fn render_promise<T, P, E, N>(
    component: impl Fn(&Record<T, P, E>) -> N + 'static,
) -> (Invoker<T, P, E>, PromiseView<T, P, E, N>)
where
    T: 'static,
    P: Clone + 'static,
    E: 'static,
{
    let cell = Observable::new(None);
    (
        Invoker { cell: cell.clone() },
        PromiseView {
            cell,
            component: Box::new(component),
            binding: RefCell::new(None),
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
