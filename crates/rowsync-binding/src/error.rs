//! Errors returned by the application-facing data source API

use rowsync_core::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by [`ListDataSource`](crate::ListDataSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    /// A positional read used a stale or invalid index.
    #[error("Row {index} out of range for {len} rows")]
    IndexOutOfRange {
        /// Requested row.
        index: usize,
        /// Row count at the time of the read.
        len: usize,
    },

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The view adapter is in the middle of applying row mutations.
    #[error("View adapter is busy applying row mutations")]
    AdapterBusy,

    /// The mirror is in the middle of applying an event.
    #[error("Data source is busy applying an event")]
    Reentrant,

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DataSourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IndexOutOfRange { index, len } => {
                DataSourceError::IndexOutOfRange { index, len }
            }
            other => DataSourceError::Store(other),
        }
    }
}
