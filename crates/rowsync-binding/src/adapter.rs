//! View adapter boundary
//!
//! A [`ViewAdapter`] is the list or grid widget the data source drives. Row
//! mutations arrive through the [`RowSink`] supertrait; cell registration and
//! dequeuing are the only other things the data source needs from the view.
//!
//! Adapters may read the data source (item count, items, keys) from inside any
//! row mutation callback. They must not request cells through
//! [`ListDataSource::cell_for`](crate::ListDataSource::cell_for) from inside
//! those callbacks.

use rowsync_core::RowSink;

use crate::config::CellKind;

/// The list surface a data source keeps in sync.
pub trait ViewAdapter: RowSink {
    /// Handle to a visual cell.
    type Cell;

    /// Register how cells for `reuse_identifier` are created.
    ///
    /// Never called for [`CellKind::Prototype`].
    fn register_cell(&mut self, reuse_identifier: &str, kind: &CellKind);

    /// Obtain a cell for the row at `index`, reusing one when possible.
    fn dequeue_cell(&mut self, reuse_identifier: &str, index: usize) -> Self::Cell;
}
