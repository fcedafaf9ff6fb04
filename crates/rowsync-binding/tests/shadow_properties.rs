//! Shadow Widget Property Tests
//!
//! Feeds arbitrary event streams through a [`ListDataSource`] and checks that
//! a widget applying only the delivered row mutations always shows the data
//! source's rows, in order, without any out-of-range or unbatched mutation.

#![allow(clippy::unwrap_used)]

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use rowsync_binding::{DataSourceConfig, ListDataSource};
use rowsync_core::RawValue;
use rowsync_testkit::{arb_list_ops, init_test_tracing, realize, FakeQuery, RecordingAdapter};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_widget_rows_follow_data_source(ops in arb_list_ops(40), split in 0usize..40) {
        init_test_tracing();
        let script = realize(&ops);
        let query = FakeQuery::new("prop");
        let adapter = RecordingAdapter::new();
        let source: ListDataSource<RawValue, RecordingAdapter> =
            ListDataSource::new(DataSourceConfig::new("row"), adapter.clone()).unwrap();
        let errors = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&errors);
        source.on_reconcile_error(move |_| counter.set(counter.get() + 1));
        source.attach(query.clone());

        let split = split.min(script.events.len());
        let (initial, live) = script.events.split_at(split);

        for event in initial {
            query.emit_event(event);
        }
        prop_assert!(adapter.row_calls().is_empty());
        query.finish_loading();

        for event in live {
            query.emit_event(event);
            let keys = source.keys();
            prop_assert_eq!(adapter.sync_rows(&keys), Some(keys));
        }

        let keys = source.keys();
        prop_assert_eq!(adapter.sync_rows(&keys), Some(keys.clone()));
        prop_assert!(adapter.violations().is_empty(), "{:?}", adapter.violations());
        prop_assert_eq!(errors.get(), script.expected_errors);
        prop_assert_eq!(keys, script.expected_order);
    }
}
