//! Recording view adapter and shadow row model
//!
//! [`ShadowRows`] replays row commands the way a list widget would, tracking
//! which key each visible row shows. New rows start unresolved and are filled
//! from the data source afterwards, exactly like a widget asking for the cell
//! of a freshly inserted row. Rows that already show a key keep it through
//! moves and deletes, so a wrong index anywhere in the command stream surfaces
//! as a mismatch against the store's order.

use std::cell::RefCell;
use std::rc::Rc;

use rowsync_binding::{CellKind, ViewAdapter};
use rowsync_core::RowSink;

/// One call received by a [`RecordingAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    /// `register_cell`
    Register {
        /// Reuse identifier.
        reuse_identifier: String,
        /// Registered kind.
        kind: CellKind,
    },
    /// `begin_updates`
    BeginUpdates,
    /// `end_updates`
    EndUpdates,
    /// `insert_row`
    Insert(usize),
    /// `delete_row`
    Delete(usize),
    /// `move_row`
    Move(usize, usize),
    /// `reload_row`
    Reload(usize),
    /// `reload_all`
    ReloadAll,
    /// `dequeue_cell`
    Dequeue(usize),
}

/// Row-by-row model of what a list widget is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowRows {
    rows: Vec<Option<String>>,
    stale: bool,
    in_batch: bool,
    violations: Vec<String>,
}

impl ShadowRows {
    /// Empty widget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill unresolved rows from `keys`, the data source's current order.
    ///
    /// After a full reload every row is taken from `keys`. A row count that
    /// disagrees with `keys` is recorded as a violation.
    pub fn resolve(&mut self, keys: &[String]) {
        if self.stale {
            self.rows = keys.iter().cloned().map(Some).collect();
            self.stale = false;
            return;
        }
        if self.rows.len() != keys.len() {
            self.violations.push(format!(
                "row count {} does not match item count {}",
                self.rows.len(),
                keys.len()
            ));
            return;
        }
        for (row, key) in self.rows.iter_mut().zip(keys) {
            if row.is_none() {
                *row = Some(key.clone());
            }
        }
    }

    /// Keys shown by each row; unresolved rows are `None`.
    pub fn rows(&self) -> &[Option<String>] {
        &self.rows
    }

    /// Keys shown, if every row is resolved.
    pub fn keys(&self) -> Option<Vec<String>> {
        if self.stale {
            return None;
        }
        self.rows.iter().cloned().collect()
    }

    /// Index misuse observed so far.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    fn check_index(&mut self, op: &str, index: usize, len: usize) -> bool {
        if index >= len {
            self.violations
                .push(format!("{op} at {index} with {len} rows"));
            return false;
        }
        true
    }

    fn check_batch(&mut self, op: &str) {
        if !self.in_batch {
            self.violations.push(format!("{op} outside begin/end"));
        }
    }
}

impl RowSink for ShadowRows {
    fn begin_updates(&mut self) {
        if self.in_batch {
            self.violations.push("nested begin_updates".to_string());
        }
        self.in_batch = true;
    }

    fn end_updates(&mut self) {
        if !self.in_batch {
            self.violations.push("end_updates without begin".to_string());
        }
        self.in_batch = false;
    }

    fn insert_row(&mut self, index: usize) {
        self.check_batch("insert");
        if self.check_index("insert", index, self.rows.len() + 1) {
            self.rows.insert(index, None);
        }
    }

    fn delete_row(&mut self, index: usize) {
        self.check_batch("delete");
        if self.check_index("delete", index, self.rows.len()) {
            self.rows.remove(index);
        }
    }

    fn move_row(&mut self, from: usize, to: usize) {
        self.check_batch("move");
        let len = self.rows.len();
        if self.check_index("move from", from, len) && self.check_index("move to", to, len) {
            let row = self.rows.remove(from);
            self.rows.insert(to, row);
        }
    }

    fn reload_row(&mut self, index: usize) {
        self.check_batch("reload");
        let len = self.rows.len();
        self.check_index("reload", index, len);
    }

    fn reload_all(&mut self) {
        if self.in_batch {
            self.violations.push("reload_all inside begin/end".to_string());
        }
        self.stale = true;
    }
}

/// Cell handed out by [`RecordingAdapter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCell {
    /// Identifier the cell was dequeued with.
    pub reuse_identifier: String,
    /// Row the cell was dequeued for.
    pub index: usize,
    /// Text set by the populate callback.
    pub text: Option<String>,
}

type CallHook = Box<dyn FnMut(&AdapterCall)>;

#[derive(Default)]
struct AdapterState {
    calls: Vec<AdapterCall>,
    shadow: ShadowRows,
}

/// [`ViewAdapter`] that records every call and maintains [`ShadowRows`].
///
/// Clones share state, so a test can keep one handle while the data source
/// owns another.
#[derive(Clone, Default)]
pub struct RecordingAdapter {
    state: Rc<RefCell<AdapterState>>,
    hook: Rc<RefCell<Option<CallHook>>>,
}

impl RecordingAdapter {
    /// Fresh adapter with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` after every recorded call.
    pub fn set_hook(&self, hook: impl FnMut(&AdapterCall) + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    /// Remove the hook.
    pub fn clear_hook(&self) {
        self.hook.borrow_mut().take();
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.state.borrow().calls.clone()
    }

    /// Row mutation calls so far, excluding registration and dequeues.
    pub fn row_calls(&self) -> Vec<AdapterCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| {
                !matches!(call, AdapterCall::Register { .. } | AdapterCall::Dequeue(_))
            })
            .cloned()
            .collect()
    }

    /// Forget recorded calls; the shadow rows are kept.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Count calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&AdapterCall) -> bool) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Resolve shadow rows against `keys` and return the shown keys.
    pub fn sync_rows(&self, keys: &[String]) -> Option<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.shadow.resolve(keys);
        state.shadow.keys()
    }

    /// Index misuse observed so far.
    pub fn violations(&self) -> Vec<String> {
        self.state.borrow().shadow.violations().to_vec()
    }

    fn record(&self, call: AdapterCall, apply: impl FnOnce(&mut ShadowRows)) {
        {
            let mut state = self.state.borrow_mut();
            apply(&mut state.shadow);
            state.calls.push(call.clone());
        }
        // The hook may call back into the data source
        let hook = self.hook.borrow_mut().take();
        if let Some(mut hook) = hook {
            hook(&call);
            let mut slot = self.hook.borrow_mut();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }
}

impl RowSink for RecordingAdapter {
    fn begin_updates(&mut self) {
        self.record(AdapterCall::BeginUpdates, |rows| rows.begin_updates());
    }

    fn end_updates(&mut self) {
        self.record(AdapterCall::EndUpdates, |rows| rows.end_updates());
    }

    fn insert_row(&mut self, index: usize) {
        self.record(AdapterCall::Insert(index), |rows| rows.insert_row(index));
    }

    fn delete_row(&mut self, index: usize) {
        self.record(AdapterCall::Delete(index), |rows| rows.delete_row(index));
    }

    fn move_row(&mut self, from: usize, to: usize) {
        self.record(AdapterCall::Move(from, to), |rows| rows.move_row(from, to));
    }

    fn reload_row(&mut self, index: usize) {
        self.record(AdapterCall::Reload(index), |rows| rows.reload_row(index));
    }

    fn reload_all(&mut self) {
        self.record(AdapterCall::ReloadAll, |rows| rows.reload_all());
    }
}

impl ViewAdapter for RecordingAdapter {
    type Cell = TestCell;

    fn register_cell(&mut self, reuse_identifier: &str, kind: &CellKind) {
        self.record(
            AdapterCall::Register {
                reuse_identifier: reuse_identifier.to_string(),
                kind: kind.clone(),
            },
            |_| {},
        );
    }

    fn dequeue_cell(&mut self, reuse_identifier: &str, index: usize) -> TestCell {
        self.record(AdapterCall::Dequeue(index), |_| {});
        TestCell {
            reuse_identifier: reuse_identifier.to_string(),
            index,
            text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_shadow_rows_track_moves() {
        let mut rows = ShadowRows::new();
        rows.reload_all();
        rows.resolve(&keys(&["a", "b", "c"]));

        rows.begin_updates();
        rows.move_row(0, 2);
        rows.end_updates();
        rows.resolve(&keys(&["b", "c", "a"]));

        assert_eq!(rows.keys(), Some(keys(&["b", "c", "a"])));
        assert!(rows.violations().is_empty());
    }

    #[test]
    fn test_shadow_rows_flag_bad_index() {
        let mut rows = ShadowRows::new();
        rows.begin_updates();
        rows.delete_row(0);
        rows.end_updates();
        assert_eq!(rows.violations().len(), 1);
    }

    #[test]
    fn test_shadow_rows_flag_mutation_outside_batch() {
        let mut rows = ShadowRows::new();
        rows.insert_row(0);
        assert_eq!(rows.violations(), &["insert outside begin/end".to_string()]);
    }

    #[test]
    fn test_recording_adapter_shares_state() {
        let adapter = RecordingAdapter::new();
        let mut owned = adapter.clone();
        owned.begin_updates();
        owned.insert_row(0);
        owned.end_updates();
        assert_eq!(
            adapter.calls(),
            vec![
                AdapterCall::BeginUpdates,
                AdapterCall::Insert(0),
                AdapterCall::EndUpdates
            ]
        );
        assert_eq!(adapter.sync_rows(&keys(&["a"])), Some(keys(&["a"])));
    }
}
