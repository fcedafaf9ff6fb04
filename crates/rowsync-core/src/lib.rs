//! # rowsync Core - Ordered Mirror of a Realtime Query
//!
//! This crate keeps a local, indexed copy of a remotely ordered result set in
//! step with the backend's child event stream, and derives the row commands a
//! list surface needs to stay consistent with it.
//!
//! ## Components
//!
//! - [`KeyedOrderedStore`]: entries in display order, addressable by key and
//!   by position
//! - [`EventReconciler`]: turns [`ChildEvent`]s into store mutations and
//!   [`RowCommand`]s
//! - [`CommandEmitter`]: collapses initial population into one reload and
//!   batches later commands into [`RowTransaction`]s
//! - [`ListMirror`]: reconciler and emitter driven together, one event per turn
//!
//! ## Data Flow
//!
//! ```text
//! ChildEvent → EventReconciler → KeyedOrderedStore
//!                    ↓
//!               RowCommand → CommandEmitter → RowTransaction → RowSink
//! ```
//!
//! Everything here is single-threaded: events must be applied from the one
//! context that receives them, in the order the backend delivered them.

#![forbid(unsafe_code)]

pub mod command;
pub mod decode;
pub mod emitter;
pub mod error;
pub mod event;
pub mod mirror;
pub mod reconciler;
pub mod store;

pub use command::{RowCommand, RowSink, RowTransaction};
pub use decode::{JsonModel, ModelDecoder, RawDecoder};
pub use emitter::{CommandEmitter, EmitterPhase};
pub use error::{DecodeError, ReconcileError, ReconcileErrorKind, StoreError};
pub use event::{ChildEvent, ChildSnapshot, EventKind, RawValue};
pub use mirror::ListMirror;
pub use reconciler::EventReconciler;
pub use store::{Entry, KeyedOrderedStore};
