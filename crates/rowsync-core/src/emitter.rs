//! CommandEmitter - batches row commands into transactions
//!
//! While the bound surface is still waiting for the initial result set the
//! emitter is *buffering*: commands are counted and dropped, because the
//! surface will load everything with one [`RowCommand::ReloadAll`] once the
//! initial population completes. After that the emitter is *live* and every
//! reconciliation turn yields a [`RowTransaction`] holding that turn's
//! commands, in creation order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{RowCommand, RowSink, RowTransaction};

/// Whether the emitter is collapsing or forwarding commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmitterPhase {
    /// Initial population in progress; commands collapse into one reload.
    #[default]
    Buffering,
    /// Each turn is delivered as its own transaction.
    Live,
}

/// Collects the commands of the current turn.
#[derive(Debug, Clone, Default)]
pub struct CommandEmitter {
    phase: EmitterPhase,
    pending: RowTransaction,
    suppressed: usize,
}

impl CommandEmitter {
    /// Create an emitter in the given phase.
    pub fn new(phase: EmitterPhase) -> Self {
        Self {
            phase,
            pending: RowTransaction::new(),
            suppressed: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> EmitterPhase {
        self.phase
    }

    /// Returns true once commands are forwarded individually.
    pub fn is_live(&self) -> bool {
        self.phase == EmitterPhase::Live
    }

    /// Number of commands collapsed while buffering.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Commands recorded for the current turn.
    pub fn pending(&self) -> &RowTransaction {
        &self.pending
    }

    /// Record a command produced by the current turn.
    pub fn record(&mut self, command: RowCommand) {
        match self.phase {
            EmitterPhase::Buffering => self.suppressed += 1,
            EmitterPhase::Live => self.pending.push(command),
        }
    }

    /// Close the current turn, returning its transaction.
    ///
    /// Always empty while buffering.
    pub fn take_turn(&mut self) -> RowTransaction {
        std::mem::take(&mut self.pending)
    }

    /// Finish initial population.
    ///
    /// Returns a transaction holding a single [`RowCommand::ReloadAll`] the
    /// first time it is called, and an empty transaction afterwards.
    pub fn go_live(&mut self) -> RowTransaction {
        if self.is_live() {
            return RowTransaction::new();
        }
        debug!(
            collapsed = self.suppressed,
            "Initial population complete, collapsing into reload"
        );
        self.phase = EmitterPhase::Live;
        self.suppressed = 0;
        self.pending = RowTransaction::new();
        RowTransaction::from(vec![RowCommand::ReloadAll])
    }

    /// Drop any commands not yet handed out.
    pub fn discard(&mut self) {
        self.pending = RowTransaction::new();
        self.suppressed = 0;
    }

    /// Discard pending work and return to `phase`.
    pub fn reset(&mut self, phase: EmitterPhase) {
        self.discard();
        self.phase = phase;
    }

    /// Close the current turn and apply it to `sink`.
    ///
    /// Returns the number of commands applied.
    pub fn flush<S: RowSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let turn = self.take_turn();
        turn.apply_while(sink, || true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffering_collapses_commands() {
        let mut emitter = CommandEmitter::default();
        for index in 0..5 {
            emitter.record(RowCommand::InsertAt { index });
            assert!(emitter.take_turn().is_empty());
        }
        assert_eq!(emitter.suppressed(), 5);

        let reload = emitter.go_live();
        assert_eq!(reload.commands(), &[RowCommand::ReloadAll]);
        assert_eq!(emitter.suppressed(), 0);
        assert!(emitter.go_live().is_empty());
    }

    #[test]
    fn test_live_turns_preserve_order() {
        let mut emitter = CommandEmitter::new(EmitterPhase::Live);
        emitter.record(RowCommand::DeleteAt { index: 2 });
        emitter.record(RowCommand::InsertAt { index: 0 });
        let turn = emitter.take_turn();
        assert_eq!(
            turn.commands(),
            &[
                RowCommand::DeleteAt { index: 2 },
                RowCommand::InsertAt { index: 0 }
            ]
        );
        assert!(emitter.take_turn().is_empty());
    }

    #[test]
    fn test_discard_drops_pending() {
        let mut emitter = CommandEmitter::new(EmitterPhase::Live);
        emitter.record(RowCommand::ReloadAt { index: 0 });
        emitter.discard();
        assert!(emitter.pending().is_empty());
    }

    #[test]
    fn test_reset_returns_to_buffering() {
        let mut emitter = CommandEmitter::new(EmitterPhase::Live);
        emitter.reset(EmitterPhase::Buffering);
        assert!(!emitter.is_live());
    }
}
