//! rowsync Testing Infrastructure
//!
//! Test doubles for both sides of a [`ListDataSource`](rowsync_binding::ListDataSource),
//! proptest strategies over child event streams, and structural assertions.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! rowsync-testkit = { path = "../rowsync-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,ignore
//! use rowsync_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     init_test_tracing();
//!     let query = FakeQuery::new("rooms/lobby/messages");
//!     let adapter = RecordingAdapter::new();
//!     // ... attach a data source, drive `query`, inspect `adapter`
//! }
//! ```

pub mod adapter;
pub mod assertions;
pub mod query;
pub mod strategies;

// Re-export commonly used items
pub use adapter::{AdapterCall, RecordingAdapter, ShadowRows, TestCell};
pub use assertions::*;
pub use query::FakeQuery;
pub use strategies::{arb_list_op, arb_list_ops, arb_valid_list_ops, realize, EventScript, ListOp};

use tracing_subscriber::EnvFilter;

/// Install a test-writer tracing subscriber once per process.
///
/// Honors `RUST_LOG` and defaults to `warn`. Later calls are no-ops.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
