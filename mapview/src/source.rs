//! The boundary to the database hosting the views.
//!
//! Aggregate reads only ever need "the row values for this key range of this
//! view", reduced or not. Anything that can answer that (an HTTP client for a
//! real server, an embedded index, [`crate::MockViewSource`]) implements
//! [`ViewSource`].

use std::sync::Arc;

use mapview_core::range::KeyRange;
use mapview_core::value::Value;

use crate::Result;

/// One range query against a view.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewQuery {
    /// Keys to read
    pub range: KeyRange,
    /// Run the view's reduce function over the range (one row) or return
    /// the mapped rows
    pub reduce: bool,
}

impl ViewQuery {
    /// Map query: every row value in the range, in key order
    pub fn map(range: KeyRange) -> Self {
        Self {
            range,
            reduce: false,
        }
    }

    /// Reduce query: zero or one reduced row for the whole range
    pub fn reduce(range: KeyRange) -> Self {
        Self {
            range,
            reduce: true,
        }
    }
}

/// A database that can answer range queries over named views.
pub trait ViewSource: Send + Sync {
    /// Row values for `query.range` of `view`.
    ///
    /// With `query.reduce` set, returns at most one value: the reduce output
    /// for the whole range, or nothing when the range is empty.
    fn query(&self, view: &str, query: &ViewQuery) -> Result<Vec<Value>>;
}

impl<T: ViewSource + ?Sized> ViewSource for Arc<T> {
    fn query(&self, view: &str, query: &ViewQuery) -> Result<Vec<Value>> {
        (**self).query(view, query)
    }
}

impl<T: ViewSource + ?Sized> ViewSource for &T {
    fn query(&self, view: &str, query: &ViewQuery) -> Result<Vec<Value>> {
        (**self).query(view, query)
    }
}
