//! Row commands - UI mutations derived from reconciled events
//!
//! A [`RowCommand`] tells a list surface how its rows changed. Commands carry
//! the indices that were valid at the moment the store produced them, so a
//! sequence of commands replayed in order against a surface that started in
//! sync leaves it in sync.
//!
//! # Example
//!
//! ```rust,ignore
//! use rowsync_core::{RowCommand, RowTransaction};
//!
//! let txn = RowTransaction::from(vec![
//!     RowCommand::InsertAt { index: 0 },
//!     RowCommand::Move { from: 0, to: 2 },
//! ]);
//! txn.apply(&mut table_view);
//! ```

use serde::{Deserialize, Serialize};

/// A single mutation of the bound list surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowCommand {
    /// A row was inserted at `index`.
    InsertAt {
        /// Position of the new row.
        index: usize,
    },
    /// The row at `index` was deleted.
    DeleteAt {
        /// Position the row occupied before deletion.
        index: usize,
    },
    /// The row at `from` now lives at `to`.
    Move {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// The row at `index` has a new value.
    ReloadAt {
        /// Position of the changed row.
        index: usize,
    },
    /// Every row should be reloaded from the data source.
    ReloadAll,
}

/// Surface that row commands are applied to.
///
/// Implemented by view adapters. Calls always arrive on the thread that
/// delivers remote events.
pub trait RowSink {
    /// Start an atomic batch of row mutations.
    fn begin_updates(&mut self);

    /// Finish the batch started by [`begin_updates`](RowSink::begin_updates).
    fn end_updates(&mut self);

    /// Insert a row at `index`.
    fn insert_row(&mut self, index: usize);

    /// Delete the row at `index`.
    fn delete_row(&mut self, index: usize);

    /// Move the row at `from` to `to`.
    fn move_row(&mut self, from: usize, to: usize);

    /// Re-populate the row at `index`.
    fn reload_row(&mut self, index: usize);

    /// Discard all rows and reload from the data source.
    fn reload_all(&mut self);
}

impl RowCommand {
    /// Apply this command to a sink, outside of any transaction bookkeeping.
    pub fn apply<S: RowSink + ?Sized>(&self, sink: &mut S) {
        match *self {
            RowCommand::InsertAt { index } => sink.insert_row(index),
            RowCommand::DeleteAt { index } => sink.delete_row(index),
            RowCommand::Move { from, to } => sink.move_row(from, to),
            RowCommand::ReloadAt { index } => sink.reload_row(index),
            RowCommand::ReloadAll => sink.reload_all(),
        }
    }

    /// Returns true if this command replaces the whole surface.
    pub fn is_reload_all(&self) -> bool {
        matches!(self, RowCommand::ReloadAll)
    }
}

/// Commands produced during one reconciliation turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTransaction {
    commands: Vec<RowCommand>,
}

impl RowTransaction {
    /// Create an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&mut self, command: RowCommand) {
        self.commands.push(command);
    }

    /// Commands in application order.
    pub fn commands(&self) -> &[RowCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Apply every command between `begin_updates` and `end_updates`.
    ///
    /// An empty transaction touches nothing. A transaction holding
    /// [`RowCommand::ReloadAll`] is applied without begin/end notifications.
    pub fn apply<S: RowSink + ?Sized>(&self, sink: &mut S) {
        self.apply_while(sink, || true);
    }

    /// Like [`apply`](Self::apply), but stops applying commands once
    /// `keep_going` returns false. `end_updates` is still delivered for a batch
    /// that was begun. Returns the number of commands applied.
    pub fn apply_while<S, F>(&self, sink: &mut S, keep_going: F) -> usize
    where
        S: RowSink + ?Sized,
        F: Fn() -> bool,
    {
        if self.commands.is_empty() || !keep_going() {
            return 0;
        }
        if self.commands.iter().any(RowCommand::is_reload_all) {
            sink.reload_all();
            return 1;
        }

        sink.begin_updates();
        let mut applied = 0;
        for command in &self.commands {
            if !keep_going() {
                break;
            }
            command.apply(sink);
            applied += 1;
        }
        sink.end_updates();
        applied
    }

    /// Consume the transaction, yielding its commands.
    pub fn into_commands(self) -> Vec<RowCommand> {
        self.commands
    }
}

impl From<Vec<RowCommand>> for RowTransaction {
    fn from(commands: Vec<RowCommand>) -> Self {
        Self { commands }
    }
}

impl IntoIterator for RowTransaction {
    type Item = RowCommand;
    type IntoIter = std::vec::IntoIter<RowCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}
