//! ListMirror - reconciler and emitter driven together
//!
//! One call to [`ListMirror::handle`] is one reconciliation turn: the event is
//! applied to the store and the resulting transaction is returned for the
//! caller to deliver. Keeping delivery outside the mirror lets the caller
//! release any borrow of the mirror before the view reads it back.

use crate::command::RowTransaction;
use crate::decode::ModelDecoder;
use crate::emitter::{CommandEmitter, EmitterPhase};
use crate::error::ReconcileError;
use crate::event::{ChildEvent, RawValue};
use crate::reconciler::EventReconciler;
use crate::store::KeyedOrderedStore;

/// Ordered mirror of a remote result set plus its pending row commands.
#[derive(Debug)]
pub struct ListMirror<V> {
    reconciler: EventReconciler<V>,
    emitter: CommandEmitter,
    initial_phase: EmitterPhase,
}

impl ListMirror<RawValue> {
    /// Mirror keeping raw snapshot values.
    pub fn raw(initial_phase: EmitterPhase) -> Self {
        Self::from_reconciler(EventReconciler::raw(), initial_phase)
    }
}

impl<V> ListMirror<V> {
    /// Create a mirror decoding values with `decoder`.
    pub fn new(decoder: impl ModelDecoder<V> + 'static, initial_phase: EmitterPhase) -> Self {
        Self::from_reconciler(EventReconciler::new(decoder), initial_phase)
    }

    fn from_reconciler(reconciler: EventReconciler<V>, initial_phase: EmitterPhase) -> Self {
        Self {
            reconciler,
            emitter: CommandEmitter::new(initial_phase),
            initial_phase,
        }
    }

    /// The mirrored entries.
    pub fn store(&self) -> &KeyedOrderedStore<V> {
        self.reconciler.store()
    }

    /// The emitter's phase.
    pub fn phase(&self) -> EmitterPhase {
        self.emitter.phase()
    }

    /// Apply one event and close the turn.
    ///
    /// The returned transaction is empty while buffering, and for events that
    /// leave the display order unchanged.
    ///
    /// # Errors
    ///
    /// Returns the [`ReconcileError`] raised by the reconciler. No command is
    /// recorded for a failed event.
    pub fn handle(&mut self, event: ChildEvent) -> Result<RowTransaction, ReconcileError> {
        if let Some(command) = self.reconciler.apply(event)? {
            self.emitter.record(command);
        }
        Ok(self.emitter.take_turn())
    }

    /// Mark the initial population complete.
    ///
    /// Returns the one-time reload transaction, or an empty transaction if the
    /// mirror was already live.
    pub fn mark_loaded(&mut self) -> RowTransaction {
        self.emitter.go_live()
    }

    /// Drop all entries and pending commands, returning to the initial phase.
    pub fn reset(&mut self) {
        self.reconciler.reset();
        self.emitter.reset(self.initial_phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RowCommand;
    use serde_json::json;

    #[test]
    fn test_initial_population_collapses_to_reload() {
        let mut mirror = ListMirror::raw(EmitterPhase::Buffering);
        let mut previous: Option<String> = None;
        for key in ["a", "b", "c", "d"] {
            let txn = mirror
                .handle(ChildEvent::added(key, json!(key), previous.as_deref()))
                .unwrap();
            assert!(txn.is_empty());
            previous = Some(key.to_string());
        }
        assert_eq!(mirror.mark_loaded().commands(), &[RowCommand::ReloadAll]);
        assert_eq!(mirror.store().len(), 4);

        let txn = mirror.handle(ChildEvent::removed("b")).unwrap();
        assert_eq!(txn.commands(), &[RowCommand::DeleteAt { index: 1 }]);
    }

    #[test]
    fn test_failed_event_records_nothing() {
        let mut mirror = ListMirror::raw(EmitterPhase::Live);
        assert!(mirror.handle(ChildEvent::removed("missing")).is_err());
        let txn = mirror.handle(ChildEvent::added("a", json!(1), None)).unwrap();
        assert_eq!(txn.commands(), &[RowCommand::InsertAt { index: 0 }]);
    }

    #[test]
    fn test_reset_restores_initial_phase() {
        let mut mirror = ListMirror::raw(EmitterPhase::Buffering);
        mirror.mark_loaded();
        mirror.handle(ChildEvent::added("a", json!(1), None)).unwrap();
        mirror.reset();
        assert!(mirror.store().is_empty());
        assert_eq!(mirror.phase(), EmitterPhase::Buffering);
    }
}
