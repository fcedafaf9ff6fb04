//! Property test strategies for child event streams
//!
//! Strategies generate abstract [`ListOp`]s; [`realize`] turns them into a
//! concrete, backend-consistent [`ChildEvent`] script by replaying them over a
//! plain `Vec` model of the remote order. The model also yields the order the
//! mirror must end up in, and how many events it must reject.
//!
//! # Example
//!
//! ```rust,ignore
//! use rowsync_testkit::strategies::{arb_list_ops, realize};
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn mirror_matches_model(ops in arb_list_ops(64)) {
//!         let script = realize(&ops);
//!         // apply script.events, compare with script.expected_order
//!     }
//! }
//! ```

use proptest::prelude::*;
use serde_json::json;

use rowsync_core::ChildEvent;

// Re-export proptest for convenience
pub use proptest;

/// An abstract list operation; slots are reduced modulo the current length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOp {
    /// Add a new child at `slot`.
    Add {
        /// Insertion slot.
        slot: usize,
    },
    /// Change the child at `slot`.
    Change {
        /// Target slot.
        slot: usize,
    },
    /// Remove the child at `slot`.
    Remove {
        /// Target slot.
        slot: usize,
    },
    /// Move the child at `slot` so it lands at `target`.
    Move {
        /// Source slot.
        slot: usize,
        /// Destination slot, counted after the child is taken out.
        target: usize,
    },
    /// Add a new child anchored to a key the mirror has never seen.
    AddWithUnknownAnchor,
    /// Remove a key that does not exist.
    RemoveUnknown,
    /// Change a key that does not exist.
    ChangeUnknown,
    /// Add an existing key a second time.
    AddDuplicate {
        /// Slot of the key to duplicate.
        slot: usize,
    },
}

/// Events plus the outcome a correct mirror must reach.
#[derive(Debug, Clone, PartialEq)]
pub struct EventScript {
    /// Events in delivery order.
    pub events: Vec<ChildEvent>,
    /// Keys in final display order.
    pub expected_order: Vec<String>,
    /// Number of events the mirror must reject.
    pub expected_errors: usize,
}

/// Strategy for a single operation, weighted toward well-formed events.
pub fn arb_list_op() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        6 => (0usize..64).prop_map(|slot| ListOp::Add { slot }),
        3 => (0usize..64).prop_map(|slot| ListOp::Change { slot }),
        3 => (0usize..64).prop_map(|slot| ListOp::Remove { slot }),
        4 => (0usize..64, 0usize..64).prop_map(|(slot, target)| ListOp::Move { slot, target }),
        1 => Just(ListOp::AddWithUnknownAnchor),
        1 => Just(ListOp::RemoveUnknown),
        1 => Just(ListOp::ChangeUnknown),
        1 => (0usize..64).prop_map(|slot| ListOp::AddDuplicate { slot }),
    ]
}

/// Strategy for operation sequences of up to `max_len` steps.
pub fn arb_list_ops(max_len: usize) -> impl Strategy<Value = Vec<ListOp>> {
    prop::collection::vec(arb_list_op(), 0..=max_len)
}

/// Strategy for operation sequences that never produce rejected events.
pub fn arb_valid_list_ops(max_len: usize) -> impl Strategy<Value = Vec<ListOp>> {
    let op = prop_oneof![
        6 => (0usize..64).prop_map(|slot| ListOp::Add { slot }),
        3 => (0usize..64).prop_map(|slot| ListOp::Change { slot }),
        3 => (0usize..64).prop_map(|slot| ListOp::Remove { slot }),
        4 => (0usize..64, 0usize..64).prop_map(|(slot, target)| ListOp::Move { slot, target }),
        1 => Just(ListOp::AddWithUnknownAnchor),
    ];
    prop::collection::vec(op, 0..=max_len)
}

/// Replay `ops` over a model of the remote order.
///
/// Operations that need an existing child are skipped while the model is
/// empty.
pub fn realize(ops: &[ListOp]) -> EventScript {
    let mut order: Vec<String> = Vec::new();
    let mut events = Vec::with_capacity(ops.len());
    let mut expected_errors = 0;

    for (step, op) in ops.iter().enumerate() {
        match *op {
            ListOp::Add { slot } => {
                let key = format!("k{step}");
                let position = slot % (order.len() + 1);
                let previous = position.checked_sub(1).map(|p| order[p].clone());
                events.push(ChildEvent::added(
                    key.clone(),
                    json!(step),
                    previous.as_deref(),
                ));
                order.insert(position, key);
            }
            ListOp::Change { slot } => {
                if order.is_empty() {
                    continue;
                }
                let key = order[slot % order.len()].clone();
                events.push(ChildEvent::changed(key, json!(format!("v{step}"))));
            }
            ListOp::Remove { slot } => {
                if order.is_empty() {
                    continue;
                }
                let key = order.remove(slot % order.len());
                events.push(ChildEvent::removed(key));
            }
            ListOp::Move { slot, target } => {
                if order.is_empty() {
                    continue;
                }
                let key = order.remove(slot % order.len());
                let position = target % (order.len() + 1);
                let previous = position.checked_sub(1).map(|p| order[p].clone());
                events.push(ChildEvent::moved(
                    key.clone(),
                    json!(step),
                    previous.as_deref(),
                ));
                order.insert(position, key);
            }
            ListOp::AddWithUnknownAnchor => {
                let key = format!("k{step}");
                events.push(ChildEvent::added(
                    key.clone(),
                    json!(step),
                    Some(format!("ghost{step}").as_str()),
                ));
                order.push(key);
            }
            ListOp::RemoveUnknown => {
                events.push(ChildEvent::removed(format!("ghost{step}")));
                expected_errors += 1;
            }
            ListOp::ChangeUnknown => {
                events.push(ChildEvent::changed(format!("ghost{step}"), json!(step)));
                expected_errors += 1;
            }
            ListOp::AddDuplicate { slot } => {
                if order.is_empty() {
                    continue;
                }
                let key = order[slot % order.len()].clone();
                events.push(ChildEvent::added(key, json!(step), None));
                expected_errors += 1;
            }
        }
    }

    EventScript {
        events,
        expected_order: order,
        expected_errors,
    }
}
