//! ListDataSource - binds a realtime query to a view adapter
//!
//! The data source owns the ordered mirror of the query's result set and the
//! adapter it drives. Attaching registers handlers on the query; each delivered
//! child event is one reconciliation turn whose row commands are applied to the
//! adapter as one transaction.
//!
//! # Borrow Discipline
//!
//! All state lives behind one shared, single-threaded handle. The mirror is
//! only mutably borrowed while an event is being reconciled, and that borrow is
//! released before the adapter sees the resulting commands. Adapters and
//! application callbacks can therefore read the data source, and can detach
//! it, from inside any callback.
//!
//! # Example
//!
//! ```rust,ignore
//! use rowsync_binding::{DataSourceConfig, ListDataSource};
//!
//! let source = ListDataSource::new(DataSourceConfig::new("message"), table_view)?;
//! source.populate_cells_with(|cell, value| cell.set_text(value["text"].as_str()));
//! source.attach(messages_query);
//!
//! // later, from the view
//! let rows = source.item_count();
//! let cell = source.cell_for(0)?;
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use rowsync_core::{
    ChildEvent, EmitterPhase, EventKind, ListMirror, ModelDecoder, RawValue, ReconcileError,
    RowCommand, RowTransaction,
};
use tracing::{debug, info, warn};

use crate::adapter::ViewAdapter;
use crate::config::DataSourceConfig;
use crate::error::DataSourceError;
use crate::query::{QueryCancelled, RemoteQuery};

type PopulateFn<C, V> = Rc<dyn Fn(&mut C, &V)>;
type ErrorCallback = Box<dyn FnMut(&ReconcileError)>;
type CancelCallback = Box<dyn FnMut(&QueryCancelled)>;

/// The query currently feeding the mirror.
struct Session {
    query: Box<dyn RemoteQuery>,
    generation: u64,
}

/// A transaction waiting for the adapter.
///
/// `generation` is `None` for transactions that must be applied even after
/// the subscription that produced them has gone away.
struct Outgoing {
    generation: Option<u64>,
    transaction: RowTransaction,
}

struct Shared<V, A: ViewAdapter> {
    config: DataSourceConfig,
    mirror: RefCell<ListMirror<V>>,
    adapter: RefCell<A>,
    outbox: RefCell<VecDeque<Outgoing>>,
    populate: RefCell<Option<PopulateFn<A::Cell, V>>>,
    on_error: RefCell<Option<ErrorCallback>>,
    on_cancelled: RefCell<Option<CancelCallback>>,
    session: RefCell<Option<Session>>,
    generation: Cell<u64>,
    active: Cell<bool>,
    needs_reset: Cell<bool>,
    pending_load: Cell<Option<u64>>,
}

impl<V, A: ViewAdapter> Shared<V, A> {
    fn is_current(&self, generation: u64) -> bool {
        self.active.get() && self.generation.get() == generation
    }

    fn deliver(&self, generation: u64, event: ChildEvent) {
        if !self.is_current(generation) {
            debug!(generation, key = %event.key(), "Ignoring event from detached subscription");
            return;
        }

        let result = self.mirror.borrow_mut().handle(event);
        match result {
            Ok(transaction) => self.enqueue(Some(generation), transaction),
            Err(err) => self.report(&err),
        }
        self.finish_turn();
    }

    fn loaded(&self, generation: u64) {
        if !self.is_current(generation) {
            return;
        }

        let transaction = match self.mirror.try_borrow_mut() {
            Ok(mut mirror) => mirror.mark_loaded(),
            Err(_) => {
                // Signalled from inside a decoder; the turn finishes the load
                self.pending_load.set(Some(generation));
                return;
            }
        };
        if !transaction.is_empty() {
            info!(
                rows = self.mirror.borrow().store().len(),
                "Initial population complete"
            );
        }
        self.enqueue(Some(generation), transaction);
        self.finish_turn();
    }

    fn cancelled(&self, generation: u64, cancellation: QueryCancelled) {
        if !self.is_current(generation) {
            return;
        }

        warn!(reason = %cancellation.reason, "Query cancelled by backend");
        self.detach();
        if let Ok(mut callback) = self.on_cancelled.try_borrow_mut() {
            if let Some(callback) = callback.as_mut() {
                callback(&cancellation);
            }
        }
    }

    fn detach(&self) {
        let session = self.session.borrow_mut().take();
        self.active.set(false);
        self.pending_load.set(None);
        if let Some(mut session) = session {
            session.query.unobserve();
            info!(
                query = %session.query.describe(),
                generation = session.generation,
                "Detached from query"
            );
        }
        self.discard_state();
    }

    fn enqueue(&self, generation: Option<u64>, transaction: RowTransaction) {
        if transaction.is_empty() {
            return;
        }
        self.outbox.borrow_mut().push_back(Outgoing {
            generation,
            transaction,
        });
        self.drain();
    }

    fn drain(&self) {
        // A drain further up the stack owns the adapter and will pick this up
        let Ok(mut adapter) = self.adapter.try_borrow_mut() else {
            return;
        };

        loop {
            let next = self.outbox.borrow_mut().pop_front();
            let Some(Outgoing {
                generation,
                transaction,
            }) = next
            else {
                break;
            };

            let applied = transaction.apply_while(&mut *adapter, || {
                generation.map_or(true, |generation| self.is_current(generation))
            });
            debug!(
                applied,
                total = transaction.len(),
                "Delivered row transaction"
            );
        }
    }

    fn report(&self, err: &ReconcileError) {
        warn!(error = %err, kind = ?err.kind(), "Reconciliation error, event skipped");
        if let Ok(mut callback) = self.on_error.try_borrow_mut() {
            if let Some(callback) = callback.as_mut() {
                callback(err);
            }
        }
    }

    /// Complete work deferred while the mirror was borrowed.
    ///
    /// Called whenever a borrow of the mirror that may have run application
    /// code ends.
    fn finish_turn(&self) {
        if self.needs_reset.get() {
            self.discard_state();
        }
        if let Some(generation) = self.pending_load.take() {
            self.loaded(generation);
        }
    }

    fn discard_state(&self) {
        self.outbox.borrow_mut().clear();

        let had_rows = match self.mirror.try_borrow_mut() {
            Ok(mut mirror) => {
                let had_rows = !mirror.store().is_empty();
                mirror.reset();
                had_rows
            }
            Err(_) => {
                // Detached mid-turn; the turn resets the mirror when it ends
                self.needs_reset.set(true);
                return;
            }
        };
        self.needs_reset.set(false);

        if had_rows {
            self.enqueue(None, RowTransaction::from(vec![RowCommand::ReloadAll]));
        }
    }
}

impl<V, A: ViewAdapter> Drop for Shared<V, A> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.get_mut().take() {
            session.query.unobserve();
        }
    }
}

/// Keeps a [`ViewAdapter`] in sync with a [`RemoteQuery`].
///
/// Cloning yields another handle to the same data source.
pub struct ListDataSource<V, A: ViewAdapter> {
    shared: Rc<Shared<V, A>>,
}

impl<V, A: ViewAdapter> Clone for ListDataSource<V, A> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<A: ViewAdapter + 'static> ListDataSource<RawValue, A> {
    /// Create a data source that stores raw snapshot values.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::Config`] if `config` fails validation.
    pub fn new(config: DataSourceConfig, adapter: A) -> Result<Self, DataSourceError> {
        config.validate()?;
        let mirror = ListMirror::raw(initial_phase(&config));
        Ok(Self::from_parts(config, adapter, mirror))
    }
}

impl<V: 'static, A: ViewAdapter + 'static> ListDataSource<V, A> {
    /// Create a data source that decodes every snapshot with `decoder`.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::Config`] if `config` fails validation.
    pub fn with_model(
        config: DataSourceConfig,
        adapter: A,
        decoder: impl ModelDecoder<V> + 'static,
    ) -> Result<Self, DataSourceError> {
        config.validate()?;
        let mirror = ListMirror::new(decoder, initial_phase(&config));
        Ok(Self::from_parts(config, adapter, mirror))
    }

    fn from_parts(config: DataSourceConfig, mut adapter: A, mirror: ListMirror<V>) -> Self {
        if config.cell_kind.requires_registration() {
            adapter.register_cell(&config.reuse_identifier, &config.cell_kind);
        }

        Self {
            shared: Rc::new(Shared {
                config,
                mirror: RefCell::new(mirror),
                adapter: RefCell::new(adapter),
                outbox: RefCell::new(VecDeque::new()),
                populate: RefCell::new(None),
                on_error: RefCell::new(None),
                on_cancelled: RefCell::new(None),
                session: RefCell::new(None),
                generation: Cell::new(0),
                active: Cell::new(false),
                needs_reset: Cell::new(false),
                pending_load: Cell::new(None),
            }),
        }
    }

    /// Start mirroring `query`.
    ///
    /// Any query attached earlier is detached first and its rows discarded.
    pub fn attach<Q: RemoteQuery + 'static>(&self, query: Q) {
        self.shared.detach();

        let generation = self.shared.generation.get() + 1;
        self.shared.generation.set(generation);
        self.shared.active.set(true);

        let mut query: Box<dyn RemoteQuery> = Box::new(query);
        for kind in EventKind::ALL {
            let weak = Rc::downgrade(&self.shared);
            query.observe(
                kind,
                Box::new(move |snapshot| {
                    if let Some(shared) = weak.upgrade() {
                        shared.deliver(generation, ChildEvent::from_snapshot(kind, snapshot));
                    }
                }),
            );
        }

        let weak = Rc::downgrade(&self.shared);
        query.observe_loaded(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.loaded(generation);
            }
        }));

        let weak = Rc::downgrade(&self.shared);
        query.observe_cancelled(Box::new(move |cancellation| {
            if let Some(shared) = weak.upgrade() {
                shared.cancelled(generation, cancellation);
            }
        }));

        if !self.shared.is_current(generation) {
            // Detached or replaced while handlers were being registered
            query.unobserve();
            return;
        }

        info!(
            query = %query.describe(),
            generation,
            reuse_identifier = %self.shared.config.reuse_identifier,
            "Attached to query"
        );
        *self.shared.session.borrow_mut() = Some(Session { query, generation });
    }

    /// Stop mirroring the attached query.
    ///
    /// Safe to call at any time, including from inside adapter and application
    /// callbacks. Row commands not yet applied to the adapter are discarded.
    pub fn detach(&self) {
        self.shared.detach();
    }

    /// Returns true while a query is attached.
    pub fn is_attached(&self) -> bool {
        self.shared.active.get()
    }

    /// Treat initial population as complete even if the query never says so.
    ///
    /// From inside a model decoder the reload is delivered once the event
    /// being decoded has been applied.
    pub fn mark_loaded(&self) {
        if self.shared.active.get() {
            self.shared.loaded(self.shared.generation.get());
        } else {
            debug!("mark_loaded ignored, no query attached");
        }
    }

    /// Whether row commands are currently collapsed or forwarded.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a model decoder.
    pub fn phase(&self) -> EmitterPhase {
        self.shared.mirror.borrow().phase()
    }

    /// The configuration this data source was built with.
    pub fn config(&self) -> &DataSourceConfig {
        &self.shared.config
    }

    /// Number of rows.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a model decoder.
    pub fn item_count(&self) -> usize {
        self.shared.mirror.borrow().store().len()
    }

    /// Run `f` on the value of the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::IndexOutOfRange`] for a stale index.
    pub fn with_item<R>(&self, index: usize, f: impl FnOnce(&V) -> R) -> Result<R, DataSourceError> {
        let result = {
            let mirror = self
                .shared
                .mirror
                .try_borrow()
                .map_err(|_| DataSourceError::Reentrant)?;
            let entry = mirror.store().at(index)?;
            f(entry.value)
        };
        // `f` may have detached
        self.shared.finish_turn();
        Ok(result)
    }

    /// Value of the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::IndexOutOfRange`] for a stale index.
    pub fn item(&self, index: usize) -> Result<V, DataSourceError>
    where
        V: Clone,
    {
        self.with_item(index, V::clone)
    }

    /// Key of the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::IndexOutOfRange`] for a stale index.
    pub fn key(&self, index: usize) -> Result<String, DataSourceError> {
        let mirror = self
            .shared
            .mirror
            .try_borrow()
            .map_err(|_| DataSourceError::Reentrant)?;
        let entry = mirror.store().at(index)?;
        Ok(entry.key.to_string())
    }

    /// All keys in row order.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a model decoder.
    pub fn keys(&self) -> Vec<String> {
        self.shared
            .mirror
            .borrow()
            .store()
            .keys()
            .map(str::to_string)
            .collect()
    }

    /// Row currently holding `key`.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a model decoder.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.shared.mirror.borrow().store().index_of(key)
    }

    /// Returns true if a row holds `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    /// Register the function that fills a cell from a row value.
    pub fn populate_cells_with(&self, populate: impl Fn(&mut A::Cell, &V) + 'static) {
        *self.shared.populate.borrow_mut() = Some(Rc::new(populate));
    }

    /// Register a callback for events that could not be reconciled.
    pub fn on_reconcile_error(&self, callback: impl FnMut(&ReconcileError) + 'static) {
        *self.shared.on_error.borrow_mut() = Some(Box::new(callback));
    }

    /// Register a callback for backend cancellation of the attached query.
    pub fn on_cancelled(&self, callback: impl FnMut(&QueryCancelled) + 'static) {
        *self.shared.on_cancelled.borrow_mut() = Some(Box::new(callback));
    }

    /// Dequeue a cell for the row at `index` and populate it.
    ///
    /// # Errors
    ///
    /// - [`DataSourceError::IndexOutOfRange`] for a stale index
    /// - [`DataSourceError::AdapterBusy`] when called from inside a row
    ///   mutation callback
    pub fn cell_for(&self, index: usize) -> Result<A::Cell, DataSourceError> {
        let cell = self.populated_cell(index)?;
        // The populate callback may have detached
        self.shared.finish_turn();
        Ok(cell)
    }

    fn populated_cell(&self, index: usize) -> Result<A::Cell, DataSourceError> {
        let mirror = self
            .shared
            .mirror
            .try_borrow()
            .map_err(|_| DataSourceError::Reentrant)?;
        let entry = mirror.store().at(index)?;

        let mut cell = {
            let mut adapter = self
                .shared
                .adapter
                .try_borrow_mut()
                .map_err(|_| DataSourceError::AdapterBusy)?;
            adapter.dequeue_cell(&self.shared.config.reuse_identifier, index)
        };

        let populate = self.shared.populate.borrow().clone();
        if let Some(populate) = populate {
            populate(&mut cell, entry.value);
        }
        Ok(cell)
    }

    /// Inspect the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::AdapterBusy`] while row mutations are being
    /// applied.
    pub fn with_adapter<R>(&self, f: impl FnOnce(&A) -> R) -> Result<R, DataSourceError> {
        let adapter = self
            .shared
            .adapter
            .try_borrow()
            .map_err(|_| DataSourceError::AdapterBusy)?;
        Ok(f(&adapter))
    }
}

impl<V, A: ViewAdapter> fmt::Debug for ListDataSource<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListDataSource")
            .field("config", &self.shared.config)
            .field("attached", &self.shared.active.get())
            .field("generation", &self.shared.generation.get())
            .finish_non_exhaustive()
    }
}

fn initial_phase(config: &DataSourceConfig) -> EmitterPhase {
    if config.defer_until_loaded {
        EmitterPhase::Buffering
    } else {
        EmitterPhase::Live
    }
}
