//! Remote query subscription boundary
//!
//! A [`RemoteQuery`] is a live query against the realtime backend. The data
//! source registers one handler per [`EventKind`], plus one-shot handlers for
//! the end of initial population and for server-side cancellation.
//!
//! # Contract
//!
//! - Handlers are invoked on a single logical callback sequence, in the order
//!   the backend determined for the query.
//! - Handlers may be invoked synchronously from inside `observe`.
//! - [`unobserve`](RemoteQuery::unobserve) may be called from inside a running
//!   handler. Implementations must stop delivery without dropping the handler
//!   that is currently executing.

use rowsync_core::{ChildSnapshot, EventKind};
use thiserror::Error;

/// Handler for one kind of child event.
pub type ChildHandler = Box<dyn FnMut(ChildSnapshot)>;

/// One-shot handler fired after the initial result set has been delivered.
pub type LoadedHandler = Box<dyn FnOnce()>;

/// One-shot handler fired when the backend cancels the query.
pub type CancelHandler = Box<dyn FnOnce(QueryCancelled)>;

/// The backend stopped serving a query (for example, permission was revoked).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Query cancelled: {reason}")]
pub struct QueryCancelled {
    /// Backend-provided reason.
    pub reason: String,
}

impl QueryCancelled {
    /// Create a cancellation with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A subscribable, ordered realtime query.
pub trait RemoteQuery {
    /// Register `handler` for every event of `kind`.
    fn observe(&mut self, kind: EventKind, handler: ChildHandler);

    /// Register a handler for the end of initial population.
    fn observe_loaded(&mut self, handler: LoadedHandler);

    /// Register a handler for server-side cancellation.
    ///
    /// Queries that are never cancelled may ignore it.
    fn observe_cancelled(&mut self, handler: CancelHandler) {
        drop(handler);
    }

    /// Stop delivering events to every registered handler.
    fn unobserve(&mut self);

    /// Human-readable location of the query, used in logs.
    fn describe(&self) -> String {
        "query".to_string()
    }
}
