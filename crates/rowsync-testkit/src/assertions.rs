//! Structural assertions over mirrored state
//!
//! These panic with a descriptive message instead of returning errors, so they
//! can be called directly from proptest bodies and ordinary tests alike.

use std::collections::HashSet;

use rowsync_core::{KeyedOrderedStore, RowCommand, RowTransaction};

/// Keys of `store` in display order.
pub fn store_order<V>(store: &KeyedOrderedStore<V>) -> Vec<String> {
    store.keys().map(str::to_string).collect()
}

/// Assert that the key index and the display sequence agree.
///
/// Every entry must report its own position, `index_of` must return that
/// same position, and no key may appear twice.
pub fn assert_store_consistent<V>(store: &KeyedOrderedStore<V>) {
    let mut seen = HashSet::new();
    let mut count = 0;
    for (position, entry) in store.iter().enumerate() {
        assert_eq!(
            entry.index, position,
            "entry {} reports index {} at position {}",
            entry.key, entry.index, position
        );
        assert_eq!(
            store.index_of(entry.key),
            Some(position),
            "index_of({}) disagrees with position {}",
            entry.key,
            position
        );
        assert!(seen.insert(entry.key.to_string()), "duplicate key {}", entry.key);
        count += 1;
    }
    assert_eq!(count, store.len(), "iteration count differs from len()");
}

/// Assert that `transaction` is exactly one full reload.
pub fn assert_single_reload(transaction: &RowTransaction) {
    assert_eq!(
        transaction.commands(),
        &[RowCommand::ReloadAll],
        "expected a single full reload"
    );
}
