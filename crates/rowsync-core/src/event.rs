//! Remote child events
//!
//! A realtime query reports changes to its result set as a totally ordered
//! stream of child events. Each event names a child key, carries the child's
//! current snapshot and, for positional events, the key of the sibling that now
//! precedes it.

use serde::{Deserialize, Serialize};

/// Raw child value as delivered by the backend.
pub type RawValue = serde_json::Value;

/// The four kinds of child event a query can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A child entered the result set.
    ChildAdded,
    /// A child's value changed without changing its position.
    ChildChanged,
    /// A child left the result set.
    ChildRemoved,
    /// A child changed position.
    ChildMoved,
}

impl EventKind {
    /// All event kinds, in subscription order.
    pub const ALL: [EventKind; 4] = [
        EventKind::ChildAdded,
        EventKind::ChildChanged,
        EventKind::ChildRemoved,
        EventKind::ChildMoved,
    ];
}

/// Payload delivered to a child event handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSnapshot {
    /// Backend-assigned child key.
    pub key: String,
    /// Current value of the child.
    pub value: RawValue,
    /// Key of the preceding sibling; `None` means first position.
    #[serde(default)]
    pub previous_key: Option<String>,
}

impl ChildSnapshot {
    /// Create a snapshot.
    pub fn new(key: impl Into<String>, value: RawValue, previous_key: Option<&str>) -> Self {
        Self {
            key: key.into(),
            value,
            previous_key: previous_key.map(str::to_string),
        }
    }
}

/// A single remote event, as consumed by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildEvent {
    /// A child was added after `previous_key`.
    Added {
        /// Child key.
        key: String,
        /// Child value.
        value: RawValue,
        /// Preceding sibling; `None` means first.
        previous_key: Option<String>,
    },
    /// A child's value changed in place.
    Changed {
        /// Child key.
        key: String,
        /// New child value.
        value: RawValue,
    },
    /// A child was removed.
    Removed {
        /// Child key.
        key: String,
    },
    /// A child moved to just after `previous_key`.
    Moved {
        /// Child key.
        key: String,
        /// Child value at the time of the move.
        value: RawValue,
        /// New preceding sibling; `None` means first.
        previous_key: Option<String>,
    },
}

impl ChildEvent {
    /// Child-added event.
    pub fn added(key: impl Into<String>, value: RawValue, previous_key: Option<&str>) -> Self {
        ChildEvent::Added {
            key: key.into(),
            value,
            previous_key: previous_key.map(str::to_string),
        }
    }

    /// Child-changed event.
    pub fn changed(key: impl Into<String>, value: RawValue) -> Self {
        ChildEvent::Changed {
            key: key.into(),
            value,
        }
    }

    /// Child-removed event.
    pub fn removed(key: impl Into<String>) -> Self {
        ChildEvent::Removed { key: key.into() }
    }

    /// Child-moved event.
    pub fn moved(key: impl Into<String>, value: RawValue, previous_key: Option<&str>) -> Self {
        ChildEvent::Moved {
            key: key.into(),
            value,
            previous_key: previous_key.map(str::to_string),
        }
    }

    /// Build the event a handler registered for `kind` should apply.
    pub fn from_snapshot(kind: EventKind, snapshot: ChildSnapshot) -> Self {
        let ChildSnapshot {
            key,
            value,
            previous_key,
        } = snapshot;
        match kind {
            EventKind::ChildAdded => ChildEvent::Added {
                key,
                value,
                previous_key,
            },
            EventKind::ChildChanged => ChildEvent::Changed { key, value },
            EventKind::ChildRemoved => ChildEvent::Removed { key },
            EventKind::ChildMoved => ChildEvent::Moved {
                key,
                value,
                previous_key,
            },
        }
    }

    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ChildEvent::Added { .. } => EventKind::ChildAdded,
            ChildEvent::Changed { .. } => EventKind::ChildChanged,
            ChildEvent::Removed { .. } => EventKind::ChildRemoved,
            ChildEvent::Moved { .. } => EventKind::ChildMoved,
        }
    }

    /// The child key this event refers to.
    pub fn key(&self) -> &str {
        match self {
            ChildEvent::Added { key, .. }
            | ChildEvent::Changed { key, .. }
            | ChildEvent::Removed { key }
            | ChildEvent::Moved { key, .. } => key,
        }
    }
}
