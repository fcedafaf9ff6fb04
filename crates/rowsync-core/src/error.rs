//! Error taxonomy for the synchronization core
//!
//! Errors are split by where they originate:
//! - [`StoreError`]: the keyed ordered store rejected a mutation or a read
//! - [`DecodeError`]: a raw snapshot could not be coerced into the model type
//! - [`ReconcileError`]: either of the above, raised while applying a remote event
//!
//! Reconciliation errors never leave the store in a partially mutated state.
//! The event that produced the error is skipped and later events are applied
//! normally.

use thiserror::Error;

/// Errors raised by [`KeyedOrderedStore`](crate::KeyedOrderedStore) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An entry with this key is already present.
    #[error("duplicate key '{key}'")]
    DuplicateKey {
        /// The key that was inserted twice.
        key: String,
    },

    /// No entry with this key exists.
    #[error("key '{key}' not found")]
    KeyNotFound {
        /// The missing key.
        key: String,
    },

    /// The previous-sibling anchor does not name a stored entry.
    #[error("anchor key '{anchor}' not found")]
    AnchorNotFound {
        /// The missing anchor key.
        anchor: String,
    },

    /// A positional read used an index past the end of the sequence.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// The number of entries at the time of the read.
        len: usize,
    },
}

/// A raw snapshot could not be coerced into the configured model type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode value for key '{key}': {message}")]
pub struct DecodeError {
    /// Key of the child whose value failed to decode.
    pub key: String,
    /// Human-readable decoder failure.
    pub message: String,
}

impl DecodeError {
    /// Create a decode error for the given key.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Coarse classification of a [`ReconcileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileErrorKind {
    /// Local state disagrees with the backend (duplicate or missing key).
    Desync,
    /// A value could not be decoded; the event was dropped.
    Decode,
    /// A previous-sibling anchor was missing and could not be recovered.
    Anchor,
    /// A stale index was used by the caller.
    ProgrammerError,
}

/// Non-fatal error raised while applying a single remote event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The store rejected the mutation derived from the event.
    #[error("store rejected event: {0}")]
    Store(#[from] StoreError),

    /// The event's value failed model coercion.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ReconcileError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ReconcileErrorKind {
        match self {
            ReconcileError::Store(StoreError::DuplicateKey { .. })
            | ReconcileError::Store(StoreError::KeyNotFound { .. }) => ReconcileErrorKind::Desync,
            ReconcileError::Store(StoreError::AnchorNotFound { .. }) => ReconcileErrorKind::Anchor,
            ReconcileError::Store(StoreError::IndexOutOfRange { .. }) => {
                ReconcileErrorKind::ProgrammerError
            }
            ReconcileError::Decode(_) => ReconcileErrorKind::Decode,
        }
    }

    /// Key of the child the failed event referred to.
    pub fn key(&self) -> Option<&str> {
        match self {
            ReconcileError::Store(StoreError::DuplicateKey { key })
            | ReconcileError::Store(StoreError::KeyNotFound { key }) => Some(key),
            ReconcileError::Decode(err) => Some(&err.key),
            _ => None,
        }
    }
}
