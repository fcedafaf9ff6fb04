//! # rowsync Binding - Realtime Query to List View
//!
//! This crate binds a [`RemoteQuery`] to a [`ViewAdapter`] through a
//! [`ListDataSource`]. The data source mirrors the query's ordered result set
//! with `rowsync-core` and applies the derived row commands to the adapter,
//! one transaction per remote event.
//!
//! ## Boundaries
//!
//! - [`RemoteQuery`]: `observe` / `unobserve` on the realtime backend
//! - [`ViewAdapter`]: row mutations, cell registration and dequeuing
//! - populate callback: fills a dequeued cell from a row value
//! - [`ModelDecoder`](rowsync_core::ModelDecoder): optional coercion of raw
//!   snapshots into a model type
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rowsync_binding::{CellKind, DataSourceConfig, ListDataSource};
//! use rowsync_core::JsonModel;
//!
//! let config = DataSourceConfig::new("message").with_cell_kind(CellKind::Nib("MessageCell".into()));
//! let source = ListDataSource::with_model(config, table_view, JsonModel::<Message>::new())?;
//! source.populate_cells_with(|cell, message| cell.set_text(&message.text));
//! source.on_reconcile_error(|err| eprintln!("out of sync: {err}"));
//! source.attach(messages_query);
//! ```

#![forbid(unsafe_code)]

pub mod adapter;
pub mod config;
pub mod data_source;
pub mod error;
pub mod query;

pub use adapter::ViewAdapter;
pub use config::{CellKind, ConfigError, DataSourceConfig};
pub use data_source::ListDataSource;
pub use error::DataSourceError;
pub use query::{CancelHandler, ChildHandler, LoadedHandler, QueryCancelled, RemoteQuery};
