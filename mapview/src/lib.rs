//! # mapview
//!
//! **Declarative map-view emission and per-field aggregate reads for
//! CouchDB-style views.**
//!
//! A map function that emits one row per field under a shared key prefix,
//!
//! ```text
//! emit([user_id, created_at, "foo"], 1)
//! emit([user_id, created_at, "bar", some_date], 0)
//! ```
//!
//! lets every field be reduced independently: builtin `_stats` for sums,
//! counts and means, or an application-side reduction for anything else.
//! [`emit::emit_array`] writes those rows for a whole document;
//! [`AggregateView`] reads them back.
//!
//! ## Quick Start
//!
//! ```rust
//! use mapview::prelude::*;
//! use mapview::key;
//!
//! # fn main() -> mapview::Result<()> {
//! let mut db = MockViewSource::new();
//! EmitArray::new(key!["u1"])
//!     .field("foo", 3)
//!     .field("spam", vec![1, 1, 2])
//!     .emit_into(db.view_mut("app/by_user"))
//!     .unwrap();
//!
//! let view = AggregateView::builder()
//!     .view("foo", KeyView::new("foo"))
//!     .view("spam_mean", KeyView::new("spam").reducer(StatsReduction::Mean { ndigits: 1 }))
//!     .build();
//!
//! let opts = QueryOptions::new().couch_view("app/by_user").source(&db);
//! let row = view.get_result(&key!["u1"], &opts)?;
//! assert_eq!(row["foo"], Value::from(3));
//! assert_eq!(row["spam_mean"], Value::from(1.3));
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `telemetry`: Per-row `tracing` events from `mapview-core`
//!
//! ## Crate Structure
//!
//! - [`mapview_core`]: values, emission, `_stats` reductions, key ranges (no_std compatible)
//! - [`source`]: the view source boundary
//! - [`view`]: key views and aggregate views
//! - [`mock`]: in-memory view source for tests
//! - [`ndjson`]: NDJSON front end used by the `mapview_emit` binary

#![forbid(unsafe_code)]

pub use mapview_core::{emit, key, range, reduce, value};

pub mod error;
pub mod mock;
pub mod ndjson;
pub mod source;
pub mod view;

pub use error::{Error, Result};
pub use mock::{MockReduce, MockView, MockViewSource};
pub use source::{ViewQuery, ViewSource};
pub use view::{AggregateKeyView, AggregateView, KeyView, QueryOptions, Reducer, ViewValue};

/// Prelude module for convenient imports
///
/// ```rust
/// use mapview::prelude::*;
/// ```
pub mod prelude {
    pub use mapview_core::prelude::*;

    pub use crate::mock::{MockReduce, MockViewSource};
    pub use crate::source::{ViewQuery, ViewSource};
    pub use crate::view::{
        AggregateKeyView, AggregateView, KeyView, QueryOptions, Reducer, ViewValue,
    };
}
