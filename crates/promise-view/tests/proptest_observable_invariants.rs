//! Property-based invariant tests for the `Observable` cell.
//!
//! These tests verify notification invariants that must hold for **any**
//! sequence of writes and subscriber churn:
//!
//! 1. Notification count per subscriber equals the number of effective
//!    (value-changing) writes performed while it was registered.
//! 2. The notified value is always the freshly written value.
//! 3. The final readable value is the last effective write.
//! 4. Version equals the total number of effective writes.
//! 5. A removed subscriber receives nothing after removal, regardless of
//!    where in the sequence removal happens.

use std::cell::RefCell;
use std::rc::Rc;

use promise_view::{Observable, Subscription};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// One step of subscriber/write churn.
#[derive(Debug, Clone)]
enum Op {
    Write(i32),
    Subscribe,
    UnsubscribeOldest,
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            (-8i32..=8).prop_map(Op::Write),
            Just(Op::Subscribe),
            Just(Op::UnsubscribeOldest),
        ],
        0..64,
    )
}

proptest! {
    /// Invariants 1-4: a single subscriber registered up front observes
    /// exactly the effective writes, in order, each with the written value.
    #[test]
    fn subscriber_sees_every_effective_write(writes in proptest::collection::vec(-8i32..=8, 0..64)) {
        let cell = Observable::new(0i32);
        let seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = cell.subscribe(move |v| seen_clone.borrow_mut().push(*v));

        let mut model = 0i32;
        let mut expected = Vec::new();
        for w in writes {
            let changed = cell.set(w);
            prop_assert_eq!(changed, w != model);
            if w != model {
                model = w;
                expected.push(w);
            }
        }

        prop_assert_eq!(&*seen.borrow(), &expected);
        prop_assert_eq!(cell.get(), model);
        prop_assert_eq!(cell.version(), expected.len() as u64);
    }

    /// Invariant 5 plus set semantics: under arbitrary subscribe/unsubscribe
    /// churn, each subscriber's hit count equals the number of effective
    /// writes that happened while it was registered.
    #[test]
    fn churned_subscribers_count_only_their_window(ops in ops()) {
        let cell = Observable::new(0i32);

        struct Tracked {
            hits: Rc<RefCell<u64>>,
            expected: u64,
            sub: Option<Subscription>,
        }
        let mut tracked: Vec<Tracked> = Vec::new();
        let mut model = 0i32;

        for op in ops {
            match op {
                Op::Write(w) => {
                    if cell.set(w) {
                        model = w;
                        for t in tracked.iter_mut().filter(|t| t.sub.is_some()) {
                            t.expected += 1;
                        }
                    }
                }
                Op::Subscribe => {
                    let hits = Rc::new(RefCell::new(0u64));
                    let hits_clone = Rc::clone(&hits);
                    let sub = cell.subscribe(move |_| *hits_clone.borrow_mut() += 1);
                    tracked.push(Tracked { hits, expected: 0, sub: Some(sub) });
                }
                Op::UnsubscribeOldest => {
                    if let Some(t) = tracked.iter_mut().find(|t| t.sub.is_some()) {
                        t.sub.take();
                    }
                }
            }
        }

        prop_assert_eq!(cell.get(), model);
        for t in &tracked {
            prop_assert_eq!(*t.hits.borrow(), t.expected);
        }
        prop_assert_eq!(
            cell.subscriber_count(),
            tracked.iter().filter(|t| t.sub.is_some()).count()
        );
    }

    /// The updater form obeys the same gate as plain writes.
    #[test]
    fn update_gates_like_set(deltas in proptest::collection::vec(0i32..=2, 0..32)) {
        let cell = Observable::new(0i32);
        let hits = Rc::new(RefCell::new(0u64));
        let hits_clone = Rc::clone(&hits);
        let _sub = cell.subscribe(move |_| *hits_clone.borrow_mut() += 1);

        let mut effective = 0u64;
        for d in deltas {
            let changed = cell.update(|v| v + d);
            prop_assert_eq!(changed, d != 0);
            if d != 0 {
                effective += 1;
            }
        }
        prop_assert_eq!(*hits.borrow(), effective);
        prop_assert_eq!(cell.version(), effective);
    }
}
