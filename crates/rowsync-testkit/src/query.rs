//! FakeQuery - scriptable in-memory realtime query
//!
//! Tests keep one handle and give a clone to the data source. Events pushed
//! through the test handle are delivered synchronously to whatever handlers
//! the data source registered.

use std::cell::RefCell;
use std::rc::Rc;

use rowsync_binding::{CancelHandler, ChildHandler, LoadedHandler, QueryCancelled, RemoteQuery};
use rowsync_core::{ChildEvent, ChildSnapshot, EventKind, RawValue};
use tracing::trace;

#[derive(Default)]
struct FakeQueryInner {
    path: String,
    handlers: Vec<(EventKind, Rc<RefCell<ChildHandler>>)>,
    loaded: Option<LoadedHandler>,
    cancelled: Option<CancelHandler>,
    observe_calls: usize,
    unobserve_calls: usize,
}

/// In-memory [`RemoteQuery`] driven by the test.
#[derive(Clone, Default)]
pub struct FakeQuery {
    inner: Rc<RefCell<FakeQueryInner>>,
}

impl FakeQuery {
    /// Create a query at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let query = Self::default();
        query.inner.borrow_mut().path = path.into();
        query
    }

    /// Deliver a snapshot to every handler registered for `kind`.
    pub fn emit(&self, kind: EventKind, snapshot: ChildSnapshot) {
        // Handlers may unobserve while running, so deliver from a copy
        let handlers: Vec<_> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .filter(|(registered, _)| *registered == kind)
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        trace!(?kind, key = %snapshot.key, handlers = handlers.len(), "fake query emit");

        for handler in handlers {
            let mut handler = handler.borrow_mut();
            (*handler)(snapshot.clone());
        }
    }

    /// Deliver a reconciler-level event.
    pub fn emit_event(&self, event: &ChildEvent) {
        let (kind, snapshot) = match event.clone() {
            ChildEvent::Added {
                key,
                value,
                previous_key,
            } => (
                EventKind::ChildAdded,
                ChildSnapshot {
                    key,
                    value,
                    previous_key,
                },
            ),
            ChildEvent::Changed { key, value } => (
                EventKind::ChildChanged,
                ChildSnapshot::new(key, value, None),
            ),
            ChildEvent::Removed { key } => (
                EventKind::ChildRemoved,
                ChildSnapshot::new(key, RawValue::Null, None),
            ),
            ChildEvent::Moved {
                key,
                value,
                previous_key,
            } => (
                EventKind::ChildMoved,
                ChildSnapshot {
                    key,
                    value,
                    previous_key,
                },
            ),
        };
        self.emit(kind, snapshot);
    }

    /// Child added after `previous_key`.
    pub fn add(&self, key: &str, value: RawValue, previous_key: Option<&str>) {
        self.emit(
            EventKind::ChildAdded,
            ChildSnapshot::new(key, value, previous_key),
        );
    }

    /// Child value changed.
    pub fn change(&self, key: &str, value: RawValue) {
        self.emit(EventKind::ChildChanged, ChildSnapshot::new(key, value, None));
    }

    /// Child removed.
    pub fn remove(&self, key: &str) {
        self.emit(
            EventKind::ChildRemoved,
            ChildSnapshot::new(key, RawValue::Null, None),
        );
    }

    /// Child moved after `previous_key`.
    pub fn move_child(&self, key: &str, value: RawValue, previous_key: Option<&str>) {
        self.emit(
            EventKind::ChildMoved,
            ChildSnapshot::new(key, value, previous_key),
        );
    }

    /// Signal the end of initial population.
    pub fn finish_loading(&self) {
        let handler = self.inner.borrow_mut().loaded.take();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Cancel the query from the backend side.
    pub fn cancel(&self, reason: &str) {
        let handler = self.inner.borrow_mut().cancelled.take();
        if let Some(handler) = handler {
            handler(QueryCancelled::new(reason));
        }
    }

    /// Returns true while any child handler is registered.
    pub fn is_observed(&self) -> bool {
        !self.inner.borrow().handlers.is_empty()
    }

    /// Number of `observe` calls received.
    pub fn observe_calls(&self) -> usize {
        self.inner.borrow().observe_calls
    }

    /// Number of `unobserve` calls received.
    pub fn unobserve_calls(&self) -> usize {
        self.inner.borrow().unobserve_calls
    }
}

impl RemoteQuery for FakeQuery {
    fn observe(&mut self, kind: EventKind, handler: ChildHandler) {
        let mut inner = self.inner.borrow_mut();
        inner.observe_calls += 1;
        inner.handlers.push((kind, Rc::new(RefCell::new(handler))));
    }

    fn observe_loaded(&mut self, handler: LoadedHandler) {
        self.inner.borrow_mut().loaded = Some(handler);
    }

    fn observe_cancelled(&mut self, handler: CancelHandler) {
        self.inner.borrow_mut().cancelled = Some(handler);
    }

    fn unobserve(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.unobserve_calls += 1;
        inner.handlers.clear();
        inner.loaded = None;
        inner.cancelled = None;
    }

    fn describe(&self) -> String {
        self.inner.borrow().path.clone()
    }
}
