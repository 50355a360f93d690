//! Mock view source for testing
//!
//! Holds emitted rows in memory and answers range queries the way a view
//! server would: rows in key collation order, reduced with `_stats`, `_sum`
//! or `_count` on request.

use std::collections::BTreeMap;
use std::convert::Infallible;

use mapview_core::emit::{Emission, Emit, EmitArray};
use mapview_core::reduce::Stats;
use mapview_core::value::{collate_keys, Key, Number, Value};

use crate::source::{ViewQuery, ViewSource};
use crate::{Error, Result};

/// Builtin reduce function of a mock view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockReduce {
    /// `_stats`
    #[default]
    Stats,
    /// `_sum`
    Sum,
    /// `_count`
    Count,
}

/// One view's rows
#[derive(Debug, Clone, Default)]
pub struct MockView {
    rows: Vec<Emission>,
    reduce: MockReduce,
}

impl MockView {
    pub fn new(reduce: MockReduce) -> Self {
        Self {
            rows: Vec::new(),
            reduce,
        }
    }

    pub fn rows(&self) -> &[Emission] {
        &self.rows
    }

    /// Rows in range, stable-sorted by key.
    fn select(&self, query: &ViewQuery) -> Vec<&Emission> {
        let mut rows: Vec<&Emission> = self
            .rows
            .iter()
            .filter(|row| query.range.contains(&row.key))
            .collect();
        rows.sort_by(|a, b| collate_keys(&a.key, &b.key));
        rows
    }

    fn query(&self, query: &ViewQuery) -> Result<Vec<Value>> {
        let rows = self.select(query);
        if !query.reduce {
            return Ok(rows.into_iter().map(|row| row.value.clone()).collect());
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let reduced = match self.reduce {
            MockReduce::Count => Value::from(rows.len() as u64),
            MockReduce::Sum | MockReduce::Stats => {
                let stats = Stats::from_values(rows.iter().map(|row| &row.value))?;
                match (self.reduce, stats) {
                    (_, None) => return Ok(Vec::new()),
                    (MockReduce::Sum, Some(stats)) => {
                        Value::Number(Number::normalized(stats.sum))
                    }
                    (_, Some(stats)) => stats.to_value(),
                }
            }
        };
        Ok(vec![reduced])
    }
}

impl Emit for MockView {
    type Error = Infallible;

    fn emit(&mut self, key: Key, value: Value) -> std::result::Result<(), Infallible> {
        self.rows.push(Emission { key, value });
        Ok(())
    }
}

/// In-memory view source keyed by view name
#[derive(Debug, Clone, Default)]
pub struct MockViewSource {
    views: BTreeMap<String, MockView>,
}

impl MockViewSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a view with a specific reduce function
    pub fn with_view(mut self, name: impl Into<String>, reduce: MockReduce) -> Self {
        self.views.insert(name.into(), MockView::new(reduce));
        self
    }

    /// The named view, created with `_stats` reduce on first use
    pub fn view_mut(&mut self, name: &str) -> &mut MockView {
        self.views.entry(name.to_string()).or_default()
    }

    pub fn view(&self, name: &str) -> Option<&MockView> {
        self.views.get(name)
    }

    /// Run one document's emission into `view`
    pub fn index(&mut self, view: &str, doc: &EmitArray) -> usize {
        match doc.emit_into(self.view_mut(view)) {
            Ok(n) => n,
            Err(never) => match never {},
        }
    }
}

impl ViewSource for MockViewSource {
    fn query(&self, view: &str, query: &ViewQuery) -> Result<Vec<Value>> {
        self.views
            .get(view)
            .ok_or_else(|| Error::UnknownView(view.to_string()))?
            .query(query)
    }
}
