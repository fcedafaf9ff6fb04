//! EventReconciler - applies remote child events to the keyed ordered store
//!
//! Each event is one reconciliation turn: the value is decoded, the matching
//! store mutation is applied, and the row command describing that mutation is
//! returned. Events are applied strictly in arrival order.
//!
//! | Event          | Store mutation | Command                      |
//! |----------------|----------------|------------------------------|
//! | child added    | `insert`       | `InsertAt(new index)`        |
//! | child changed  | `update`       | `ReloadAt(index)`            |
//! | child removed  | `remove`       | `DeleteAt(old index)`        |
//! | child moved    | `move_after`   | `Move(from, to)`, or nothing |
//!
//! # Recovery
//!
//! A previous-sibling anchor the store has not seen yet is recovered by
//! appending the child at the end and logging the anomaly. Every other failure
//! is returned as a [`ReconcileError`] with the store left exactly as it was
//! before the event.

use tracing::{debug, warn};

use crate::command::RowCommand;
use crate::decode::{ModelDecoder, RawDecoder};
use crate::error::{ReconcileError, StoreError};
use crate::event::{ChildEvent, RawValue};
use crate::store::KeyedOrderedStore;

/// Translates child events into store mutations and row commands.
pub struct EventReconciler<V> {
    store: KeyedOrderedStore<V>,
    decoder: Box<dyn ModelDecoder<V>>,
}

impl EventReconciler<RawValue> {
    /// Reconciler that keeps raw snapshot values.
    pub fn raw() -> Self {
        Self::new(RawDecoder)
    }
}

impl<V> EventReconciler<V> {
    /// Create a reconciler with an empty store and the given model decoder.
    pub fn new(decoder: impl ModelDecoder<V> + 'static) -> Self {
        Self {
            store: KeyedOrderedStore::new(),
            decoder: Box::new(decoder),
        }
    }

    /// Read access to the mirrored store.
    pub fn store(&self) -> &KeyedOrderedStore<V> {
        &self.store
    }

    /// Drop all mirrored entries.
    pub fn reset(&mut self) {
        self.store.clear();
    }

    /// Apply one event.
    ///
    /// Returns the row command for the mutation, or `None` when the event
    /// left the display order unchanged (a move to the same position).
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] if the value fails to decode or the store
    /// rejects the mutation. The store is unchanged in either case.
    pub fn apply(&mut self, event: ChildEvent) -> Result<Option<RowCommand>, ReconcileError> {
        let kind = event.kind();
        let command = match event {
            ChildEvent::Added {
                key,
                value,
                previous_key,
            } => {
                let value = self.decoder.decode(&key, &value)?;
                let index = match previous_key.as_deref() {
                    Some(anchor) if !self.store.contains_key(anchor) => {
                        warn!(key = %key, anchor = %anchor, "Anchor not found, appending child");
                        self.store.push(key, value)?
                    }
                    after => self.store.insert(key, value, after)?,
                };
                Some(RowCommand::InsertAt { index })
            }
            ChildEvent::Changed { key, value } => {
                let value = self.decoder.decode(&key, &value)?;
                let index = self.store.update(&key, value)?;
                Some(RowCommand::ReloadAt { index })
            }
            ChildEvent::Removed { key } => {
                let index = self.store.remove(&key)?;
                Some(RowCommand::DeleteAt { index })
            }
            ChildEvent::Moved {
                key,
                value,
                previous_key,
            } => {
                let value = self.decoder.decode(&key, &value)?;
                let (from, to) = match self.store.move_after(&key, previous_key.as_deref()) {
                    Err(StoreError::AnchorNotFound { anchor }) => {
                        warn!(key = %key, anchor = %anchor, "Anchor not found, moving child to end");
                        self.store.move_to_end(&key)?
                    }
                    other => other?,
                };
                self.store.update(&key, value)?;
                (from != to).then_some(RowCommand::Move { from, to })
            }
        };

        debug!(?kind, ?command, len = self.store.len(), "Applied child event");
        Ok(command)
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for EventReconciler<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReconciler")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
