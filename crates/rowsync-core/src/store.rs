//! KeyedOrderedStore - the local mirror of a remote ordered collection
//!
//! Entries are kept in display order. Each entry is addressable both by its
//! position and by its backend-assigned key. The key→index lookup is backed by
//! the same [`IndexMap`] that holds the sequence, so positional and keyed views
//! can never drift apart between mutations.
//!
//! # Anchors
//!
//! Inserts and moves position an entry relative to a previous-sibling key:
//! - `None` places the entry first
//! - `Some(anchor)` places it immediately after `anchor`
//! - an anchor that is not stored fails with [`StoreError::AnchorNotFound`]
//!   and leaves the store untouched
//!
//! ```rust,ignore
//! use rowsync_core::KeyedOrderedStore;
//!
//! let mut store = KeyedOrderedStore::new();
//! store.insert("a", 1, None)?;
//! store.insert("b", 2, Some("a"))?;
//! store.insert("c", 3, Some("b"))?;
//! assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
//!
//! store.move_after("a", Some("c"))?;
//! assert_eq!(store.keys().collect::<Vec<_>>(), vec!["b", "c", "a"]);
//! ```

use indexmap::IndexMap;

use crate::error::StoreError;

/// A borrowed view of one stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a, V> {
    /// Backend-assigned key, unique within the store.
    pub key: &'a str,
    /// Stored value (raw snapshot or decoded model).
    pub value: &'a V,
    /// Current position in display order.
    pub index: usize,
}

/// Ordered sequence of keyed entries mirroring the backend's order.
#[derive(Debug, Clone)]
pub struct KeyedOrderedStore<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for KeyedOrderedStore<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> KeyedOrderedStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a new entry after `after`, or first when `after` is `None`.
    ///
    /// Returns the index the entry now occupies. Entries at and after that
    /// index shift by one.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateKey`] if `key` is already stored
    /// - [`StoreError::AnchorNotFound`] if `after` names a missing key
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: V,
        after: Option<&str>,
    ) -> Result<usize, StoreError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(StoreError::DuplicateKey { key });
        }
        let index = self.insertion_point(after)?;
        self.entries.shift_insert(index, key, value);
        Ok(index)
    }

    /// Append a new entry at the end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if `key` is already stored.
    pub fn push(&mut self, key: impl Into<String>, value: V) -> Result<usize, StoreError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(StoreError::DuplicateKey { key });
        }
        let (index, _) = self.entries.insert_full(key, value);
        Ok(index)
    }

    /// Remove the entry for `key`, returning the index it occupied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyNotFound`] if `key` is not stored.
    pub fn remove(&mut self, key: &str) -> Result<usize, StoreError> {
        self.entries
            .shift_remove_full(key)
            .map(|(index, _, _)| index)
            .ok_or_else(|| StoreError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Replace the value for `key` in place, returning its (unchanged) index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyNotFound`] if `key` is not stored.
    pub fn update(&mut self, key: &str, value: V) -> Result<usize, StoreError> {
        match self.entries.get_full_mut(key) {
            Some((index, _, slot)) => {
                *slot = value;
                Ok(index)
            }
            None => Err(StoreError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Reposition `key` after `after` (or first when `after` is `None`).
    ///
    /// The anchor is resolved as if `key` had already been removed, so an
    /// entry can never be anchored to itself. Returns `(old_index, new_index)`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::KeyNotFound`] if `key` is not stored
    /// - [`StoreError::AnchorNotFound`] if `after` names a missing key, or
    ///   names `key` itself
    pub fn move_after(
        &mut self,
        key: &str,
        after: Option<&str>,
    ) -> Result<(usize, usize), StoreError> {
        let from = self.index_of(key).ok_or_else(|| StoreError::KeyNotFound {
            key: key.to_string(),
        })?;

        let to = match after {
            None => 0,
            Some(anchor) if anchor == key => {
                return Err(StoreError::AnchorNotFound {
                    anchor: anchor.to_string(),
                })
            }
            Some(anchor) => {
                let anchor_index =
                    self.index_of(anchor)
                        .ok_or_else(|| StoreError::AnchorNotFound {
                            anchor: anchor.to_string(),
                        })?;
                // Position of the anchor once `key` is taken out of the sequence
                let shifted = if anchor_index > from {
                    anchor_index - 1
                } else {
                    anchor_index
                };
                shifted + 1
            }
        };

        if from != to {
            self.entries.move_index(from, to);
        }
        Ok((from, to))
    }

    /// Reposition `key` to the end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyNotFound`] if `key` is not stored.
    pub fn move_to_end(&mut self, key: &str) -> Result<(usize, usize), StoreError> {
        let from = self.index_of(key).ok_or_else(|| StoreError::KeyNotFound {
            key: key.to_string(),
        })?;
        let to = self.entries.len() - 1;
        if from != to {
            self.entries.move_index(from, to);
        }
        Ok((from, to))
    }

    /// Entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexOutOfRange`] if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<Entry<'_, V>, StoreError> {
        self.entries
            .get_index(index)
            .map(|(key, value)| Entry {
                key: key.as_str(),
                value,
                index,
            })
            .ok_or(StoreError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Current index of `key`, if stored.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    /// Returns true if `key` is stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = Entry<'_, V>> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (key, value))| Entry {
                key: key.as_str(),
                value,
                index,
            })
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn insertion_point(&self, after: Option<&str>) -> Result<usize, StoreError> {
        match after {
            None => Ok(0),
            Some(anchor) => self
                .index_of(anchor)
                .map(|index| index + 1)
                .ok_or_else(|| StoreError::AnchorNotFound {
                    anchor: anchor.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> KeyedOrderedStore<i32> {
        let mut store = KeyedOrderedStore::new();
        store.insert("a", 1, None).unwrap();
        store.insert("b", 2, Some("a")).unwrap();
        store.insert("c", 3, Some("b")).unwrap();
        store
    }

    fn order(store: &KeyedOrderedStore<i32>) -> Vec<&str> {
        store.keys().collect()
    }

    #[test]
    fn test_insert_with_anchors() {
        let store = abc();
        assert_eq!(order(&store), vec!["a", "b", "c"]);
        assert_eq!(store.index_of("c"), Some(2));
    }

    #[test]
    fn test_insert_without_anchor_goes_first() {
        let mut store = abc();
        assert_eq!(store.insert("z", 0, None), Ok(0));
        assert_eq!(order(&store), vec!["z", "a", "b", "c"]);
        assert_eq!(store.index_of("a"), Some(1));
    }

    #[test]
    fn test_insert_in_middle_shifts_later_entries() {
        let mut store = abc();
        assert_eq!(store.insert("x", 9, Some("a")), Ok(1));
        assert_eq!(order(&store), vec!["a", "x", "b", "c"]);
        assert_eq!(store.index_of("b"), Some(2));
        assert_eq!(store.index_of("c"), Some(3));
    }

    #[test]
    fn test_insert_duplicate_key() {
        let mut store = abc();
        assert_eq!(
            store.insert("b", 5, None),
            Err(StoreError::DuplicateKey { key: "b".into() })
        );
        assert_eq!(store.get("b"), Some(&2));
        assert_eq!(order(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_missing_anchor_leaves_store_untouched() {
        let mut store = abc();
        assert_eq!(
            store.insert("d", 4, Some("nope")),
            Err(StoreError::AnchorNotFound {
                anchor: "nope".into()
            })
        );
        assert_eq!(store.len(), 3);
        assert!(!store.contains_key("d"));
    }

    #[test]
    fn test_push_appends() {
        let mut store = abc();
        assert_eq!(store.push("d", 4), Ok(3));
        assert_eq!(order(&store), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_remove_returns_previous_index() {
        let mut store = abc();
        assert_eq!(store.remove("b"), Ok(1));
        assert_eq!(order(&store), vec!["a", "c"]);
        assert_eq!(store.index_of("c"), Some(1));
        assert_eq!(
            store.remove("b"),
            Err(StoreError::KeyNotFound { key: "b".into() })
        );
    }

    #[test]
    fn test_update_in_place() {
        let mut store = abc();
        assert_eq!(store.update("a", 10), Ok(0));
        assert_eq!(store.at(0).unwrap().value, &10);
        assert_eq!(order(&store), vec!["a", "b", "c"]);
        assert!(store.update("q", 1).is_err());
    }

    #[test]
    fn test_move_first_to_last() {
        let mut store = abc();
        assert_eq!(store.move_after("a", Some("c")), Ok((0, 2)));
        assert_eq!(order(&store), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_move_last_to_first() {
        let mut store = abc();
        assert_eq!(store.move_after("c", None), Ok((2, 0)));
        assert_eq!(order(&store), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_move_backwards_after_anchor() {
        let mut store = abc();
        assert_eq!(store.move_after("c", Some("a")), Ok((2, 1)));
        assert_eq!(order(&store), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_move_to_same_position() {
        let mut store = abc();
        assert_eq!(store.move_after("b", Some("a")), Ok((1, 1)));
        assert_eq!(order(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_anchored_to_itself() {
        let mut store = abc();
        assert!(matches!(
            store.move_after("b", Some("b")),
            Err(StoreError::AnchorNotFound { .. })
        ));
        assert_eq!(order(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_missing_key_or_anchor() {
        let mut store = abc();
        assert!(matches!(
            store.move_after("q", None),
            Err(StoreError::KeyNotFound { .. })
        ));
        assert!(matches!(
            store.move_after("a", Some("q")),
            Err(StoreError::AnchorNotFound { .. })
        ));
        assert_eq!(order(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_to_end() {
        let mut store = abc();
        assert_eq!(store.move_to_end("a"), Ok((0, 2)));
        assert_eq!(order(&store), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_at_out_of_range() {
        let store = abc();
        let entry = store.at(1).unwrap();
        assert_eq!((entry.key, entry.index), ("b", 1));
        assert_eq!(
            store.at(3),
            Err(StoreError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_iter_reports_positions() {
        let store = abc();
        let positions: Vec<_> = store.iter().map(|e| (e.key, e.index)).collect();
        assert_eq!(positions, vec![("a", 0), ("b", 1), ("c", 2)]);
    }
}
