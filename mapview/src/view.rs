//! Per-field aggregate reads over a map view.
//!
//! A [`KeyView`] reads one field back out of a view written with
//! [`mapview_core::emit::emit_array`]: for a base key `k` and field slug `s`
//! it queries `k ++ [s] ++ startkey` to `k ++ [s] ++ endkey ++ [{}]` and
//! reduces the result. An [`AggregateView`] is a named collection of such
//! reads evaluated together for one base key.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use mapview_core::range::{close_high, KeyRange};
use mapview_core::reduce::{unique_count, ReduceRow, StatsReduction, NO_VALUE};
use mapview_core::value::{Key, Number, Value};

use crate::source::{ViewQuery, ViewSource};
use crate::{Error, Result};

/// Transform applied to the caller's start or end key suffix.
pub type KeyFn = Arc<dyn Fn(Key) -> Key + Send + Sync>;

/// Application-side reduction over mapped row values.
pub type MapReduceFn = Arc<dyn Fn(&[Value]) -> Option<Value> + Send + Sync>;

/// Combines the values of several views into one.
pub type CombineFn = Arc<dyn Fn(&[Value]) -> Option<Value> + Send + Sync>;

/// How a [`KeyView`] turns its key range into a value.
#[derive(Clone)]
pub enum Reducer {
    /// Reduce query; the view's reduce output (`_stats`, `_sum`, `_count`)
    /// is read with the given reduction.
    Stats(StatsReduction),
    /// Map query; the row values are reduced in the application.
    Map(MapReduceFn),
}

impl Reducer {
    /// Application-side reduction.
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        Reducer::Map(Arc::new(f))
    }

    /// Number of distinct row values.
    pub fn unique_count() -> Self {
        Reducer::map(|values| Some(Value::from(unique_count(values) as u64)))
    }

    /// Whether the view is queried with `reduce=true`.
    pub fn is_view_reduce(&self) -> bool {
        matches!(self, Reducer::Stats(_))
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Reducer::Stats(StatsReduction::Sum)
    }
}

impl From<StatsReduction> for Reducer {
    fn from(r: StatsReduction) -> Self {
        Reducer::Stats(r)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Stats(r) => f.debug_tuple("Stats").field(r).finish(),
            Reducer::Map(_) => f.write_str("Map(..)"),
        }
    }
}

/// Per-call query parameters.
///
/// `startkey`/`endkey` are suffixes appended after the field slug. The view
/// name and source are fallbacks for key views that do not carry their own.
#[derive(Clone, Copy, Default)]
pub struct QueryOptions<'a> {
    pub startkey: Option<&'a [Value]>,
    pub endkey: Option<&'a [Value]>,
    pub couch_view: Option<&'a str>,
    pub source: Option<&'a dyn ViewSource>,
}

impl<'a> QueryOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start key suffix
    pub fn startkey(mut self, startkey: &'a [Value]) -> Self {
        self.startkey = Some(startkey);
        self
    }

    /// Set the end key suffix
    pub fn endkey(mut self, endkey: &'a [Value]) -> Self {
        self.endkey = Some(endkey);
        self
    }

    /// Set the fallback view name
    pub fn couch_view(mut self, view: &'a str) -> Self {
        self.couch_view = Some(view);
        self
    }

    /// Set the fallback view source
    pub fn source(mut self, source: &'a dyn ViewSource) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Debug for QueryOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("startkey", &self.startkey)
            .field("endkey", &self.endkey)
            .field("couch_view", &self.couch_view)
            .field("source", &self.source.map(|_| ".."))
            .finish()
    }
}

/// Anything that yields one value per base key.
pub trait ViewValue: Send + Sync {
    fn get_value(&self, key: &[Value], opts: &QueryOptions<'_>) -> Result<Value>;
}

/// One field's aggregate read.
#[derive(Clone)]
pub struct KeyView {
    slug: Option<Value>,
    reducer: Reducer,
    startkey_fn: Option<KeyFn>,
    endkey_fn: Option<KeyFn>,
    couch_view: Option<String>,
    source: Option<Arc<dyn ViewSource>>,
    no_value: Value,
}

impl KeyView {
    /// Read the rows emitted for field `slug`.
    ///
    /// An empty or null slug reads directly under the base key, like
    /// [`KeyView::unkeyed`].
    pub fn new(slug: impl Into<Value>) -> Self {
        let slug = match slug.into() {
            Value::Null => None,
            Value::Str(s) if s.is_empty() => None,
            other => Some(other),
        };
        Self {
            slug,
            ..Self::unkeyed()
        }
    }

    /// Read directly under the base key, with no field slug.
    pub fn unkeyed() -> Self {
        Self {
            slug: None,
            reducer: Reducer::default(),
            startkey_fn: None,
            endkey_fn: None,
            couch_view: None,
            source: None,
            no_value: Value::from(NO_VALUE),
        }
    }

    /// Set the reducer
    pub fn reducer(mut self, reducer: impl Into<Reducer>) -> Self {
        self.reducer = reducer.into();
        self
    }

    /// Transform the start key suffix (default: unchanged)
    pub fn startkey_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Key) -> Key + Send + Sync + 'static,
    {
        self.startkey_fn = Some(Arc::new(f));
        self
    }

    /// Transform the end key suffix (default: append `{}`)
    pub fn endkey_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Key) -> Key + Send + Sync + 'static,
    {
        self.endkey_fn = Some(Arc::new(f));
        self
    }

    /// Pin the view name
    pub fn couch_view(mut self, view: impl Into<String>) -> Self {
        self.couch_view = Some(view.into());
        self
    }

    /// Pin the view source
    pub fn source(mut self, source: Arc<dyn ViewSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Value reported when the key range holds nothing to reduce
    pub fn no_value(mut self, no_value: impl Into<Value>) -> Self {
        self.no_value = no_value.into();
        self
    }

    pub fn slug(&self) -> Option<&Value> {
        self.slug.as_ref()
    }

    fn label(&self) -> String {
        match &self.slug {
            Some(Value::Str(s)) => s.clone(),
            Some(other) => format!("{other:?}"),
            None => String::from("<unkeyed>"),
        }
    }

    /// The key range read for base key `key`.
    pub fn range(&self, key: &[Value], opts: &QueryOptions<'_>) -> KeyRange {
        let mut base = key.to_vec();
        base.extend(self.slug.iter().cloned());

        let start = opts.startkey.map(<[Value]>::to_vec).unwrap_or_default();
        let start = match &self.startkey_fn {
            Some(f) => f(start),
            None => start,
        };

        let end = opts.endkey.map(<[Value]>::to_vec).unwrap_or_default();
        let end = match &self.endkey_fn {
            Some(f) => f(end),
            None => close_high(end),
        };

        KeyRange::with_base(&base, start, end)
    }
}

impl fmt::Debug for KeyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyView")
            .field("slug", &self.slug)
            .field("reducer", &self.reducer)
            .field("couch_view", &self.couch_view)
            .field("no_value", &self.no_value)
            .finish_non_exhaustive()
    }
}

impl ViewValue for KeyView {
    fn get_value(&self, key: &[Value], opts: &QueryOptions<'_>) -> Result<Value> {
        let view = self
            .couch_view
            .as_deref()
            .or(opts.couch_view)
            .ok_or_else(|| Error::MissingView(self.label()))?;
        let source: &dyn ViewSource = match (&self.source, opts.source) {
            (Some(own), _) => &**own,
            (None, Some(fallback)) => fallback,
            (None, None) => return Err(Error::MissingSource(self.label())),
        };

        let range = self.range(key, opts);
        tracing::debug!(
            view,
            field = %self.label(),
            start = ?range.start,
            end = ?range.end,
            reduce = self.reducer.is_view_reduce(),
            "key view query"
        );

        let value = match &self.reducer {
            Reducer::Stats(reduction) => {
                let rows = source.query(view, &ViewQuery::reduce(range))?;
                let row = rows.first().map(ReduceRow::from_value);
                reduction.apply(row.as_ref())?
            }
            Reducer::Map(f) => {
                let rows = source.query(view, &ViewQuery::map(range))?;
                f(&rows)
            }
        };

        Ok(value.unwrap_or_else(|| self.no_value.clone()))
    }
}

/// Percentage of the first value over the second.
fn percent(values: &[Value]) -> Option<Value> {
    match values {
        [a, b] => {
            let (a, b) = (a.as_f64()?, b.as_f64()?);
            if b == 0.0 {
                return None;
            }
            Some(Value::Number(Number::normalized(a / b * 100.0)))
        }
        _ => None,
    }
}

/// A value computed from several other views.
#[derive(Clone)]
pub struct AggregateKeyView {
    views: Vec<Arc<dyn ViewValue>>,
    combine: CombineFn,
    no_value: Value,
}

impl AggregateKeyView {
    /// `views[0] / views[1] * 100`.
    pub fn percent(
        numerator: impl ViewValue + 'static,
        denominator: impl ViewValue + 'static,
    ) -> Self {
        Self::with_fn(percent, vec![Arc::new(numerator), Arc::new(denominator)])
    }

    /// Combine `views` with `f`. `f` returning `None` reports the no-value marker.
    pub fn with_fn<F>(f: F, views: Vec<Arc<dyn ViewValue>>) -> Self
    where
        F: Fn(&[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            views,
            combine: Arc::new(f),
            no_value: Value::from(NO_VALUE),
        }
    }

    pub fn no_value(mut self, no_value: impl Into<Value>) -> Self {
        self.no_value = no_value.into();
        self
    }
}

impl fmt::Debug for AggregateKeyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateKeyView")
            .field("views", &self.views.len())
            .field("no_value", &self.no_value)
            .finish_non_exhaustive()
    }
}

impl ViewValue for AggregateKeyView {
    fn get_value(&self, key: &[Value], opts: &QueryOptions<'_>) -> Result<Value> {
        let values = self
            .views
            .iter()
            .map(|v| v.get_value(key, opts))
            .collect::<Result<Vec<_>>>()?;
        Ok((self.combine)(&values).unwrap_or_else(|| self.no_value.clone()))
    }
}

/// A named set of views evaluated together for one base key.
#[derive(Clone, Default)]
pub struct AggregateView {
    views: Vec<(String, Arc<dyn ViewValue>)>,
}

impl AggregateView {
    pub fn builder() -> AggregateViewBuilder {
        AggregateViewBuilder::new()
    }

    /// View names, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ViewValue>> {
        self.views.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Evaluate every view for base key `key`.
    pub fn get_result(
        &self,
        key: &[Value],
        opts: &QueryOptions<'_>,
    ) -> Result<BTreeMap<String, Value>> {
        self.views
            .iter()
            .map(|(name, view)| Ok((name.clone(), view.get_value(key, opts)?)))
            .collect()
    }

    /// One result row per base key.
    pub fn rows(
        &self,
        keys: &[Key],
        opts: &QueryOptions<'_>,
    ) -> Result<Vec<BTreeMap<String, Value>>> {
        keys.iter().map(|key| self.get_result(key, opts)).collect()
    }
}

impl fmt::Debug for AggregateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Builder for [`AggregateView`]
#[derive(Default)]
pub struct AggregateViewBuilder {
    views: Vec<(String, Arc<dyn ViewValue>)>,
}

impl AggregateViewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view under `name`, replacing any view already using it
    pub fn view(self, name: impl Into<String>, view: impl ViewValue + 'static) -> Self {
        self.shared(name, Arc::new(view))
    }

    /// Add an already shared view, so one read can appear under several names
    pub fn shared(mut self, name: impl Into<String>, view: Arc<dyn ViewValue>) -> Self {
        let name = name.into();
        match self.views.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = view,
            None => self.views.push((name, view)),
        }
        self
    }

    pub fn build(self) -> AggregateView {
        AggregateView { views: self.views }
    }
}
