//! Declarative emission of a document's fields into a map view.
//!
//! A map function usually emits one row per interesting field of a document,
//! each under a key like `[user_id, created_at, "field"]`. [`emit_array`]
//! does that for a whole [`FieldMap`] at once:
//!
//! ```
//! use mapview_core::emit::{emit_array, Emissions, ExtraKeys};
//! use mapview_core::key;
//! use mapview_core::value::{FieldMap, Value};
//!
//! let data = FieldMap::new().with("foo", 0).with("bar", 1).with("baz", 1);
//! let mut extra_keys = ExtraKeys::new();
//! extra_keys.insert("baz".into(), Value::Array(key!["c"]));
//!
//! let mut rows = Emissions::new();
//! emit_array(&data, &key!["a", "b"], &extra_keys, &mut rows).unwrap();
//!
//! let keys: Vec<_> = rows.iter().map(|e| e.key.clone()).collect();
//! assert_eq!(
//!     keys,
//!     vec![key!["a", "b", "foo"], key!["a", "b", "bar"], key!["a", "b", "baz", "c"]]
//! );
//! ```

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::Infallible;

use serde::{Deserialize, Deserializer, Serialize};

use crate::value::{FieldMap, FieldValue, Key, Value};

/// Per-field key suffixes. A bare value is treated as a one-element suffix.
pub type ExtraKeys = BTreeMap<String, Value>;

/// The `emit(key, value)` collaborator supplied by the hosting view runtime.
pub trait Emit {
    type Error;

    /// Record one row against `key`.
    fn emit(&mut self, key: Key, value: Value) -> core::result::Result<(), Self::Error>;
}

impl<F> Emit for F
where
    F: FnMut(Key, Value),
{
    type Error = Infallible;

    fn emit(&mut self, key: Key, value: Value) -> core::result::Result<(), Infallible> {
        self(key, value);
        Ok(())
    }
}

/// One row handed to an [`Emit`] sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub key: Key,
    pub value: Value,
}

impl Emission {
    pub fn new(key: Key, value: impl Into<Value>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Sink that keeps every emission in call order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emissions {
    rows: Vec<Emission>,
}

impl Emissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Emission> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[Emission] {
        &self.rows
    }

    pub fn into_inner(self) -> Vec<Emission> {
        self.rows
    }
}

impl Emit for Emissions {
    type Error = Infallible;

    fn emit(&mut self, key: Key, value: Value) -> core::result::Result<(), Infallible> {
        self.rows.push(Emission { key, value });
        Ok(())
    }
}

impl IntoIterator for Emissions {
    type Item = Emission;
    type IntoIter = alloc::vec::IntoIter<Emission>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Emissions {
    type Item = &'a Emission;
    type IntoIter = core::slice::Iter<'a, Emission>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Normalize one suffix entry.
///
/// Arrays are used as-is, `null` means no suffix, anything else (objects
/// included) becomes a single key component.
pub fn normalize_suffix(suffix: &Value) -> Key {
    match suffix {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => alloc::vec![other.clone()],
    }
}

/// Normalize every suffix entry into a key fragment. The input is untouched.
pub fn normalize_extra_keys(extra_keys: &ExtraKeys) -> BTreeMap<&str, Key> {
    extra_keys
        .iter()
        .map(|(name, suffix)| (name.as_str(), normalize_suffix(suffix)))
        .collect()
}

/// Emit one row per (field, value) pair of `data`.
///
/// Each non-null field `k` is emitted under `key ++ [k] ++ extra_keys[k]`:
/// booleans as `1`/`0`, sequences once per element (all elements share the
/// same key), everything else as-is. Suffixes for fields not in `data` are
/// ignored.
///
/// Returns the number of emissions. A sink error stops emission and is
/// returned unchanged; rows already handed to the sink stay there.
pub fn emit_array<E>(
    data: &FieldMap,
    key: &[Value],
    extra_keys: &ExtraKeys,
    sink: &mut E,
) -> core::result::Result<usize, E::Error>
where
    E: Emit + ?Sized,
{
    let suffixes = normalize_extra_keys(extra_keys);
    let mut emitted = 0usize;

    for (name, field) in data.iter() {
        if field.is_null() {
            continue;
        }

        let suffix = suffixes.get(name).map(Vec::as_slice).unwrap_or(&[]);
        let mut this_key = Key::with_capacity(key.len() + 1 + suffix.len());
        this_key.extend_from_slice(key);
        this_key.push(Value::from(name));
        this_key.extend_from_slice(suffix);

        match field {
            FieldValue::Null => {}
            FieldValue::Bool(b) => {
                emit_row(sink, name, this_key, Value::from(i64::from(*b)))?;
                emitted += 1;
            }
            FieldValue::Sequence(items) => {
                for item in items {
                    emit_row(sink, name, this_key.clone(), item.clone())?;
                    emitted += 1;
                }
            }
            FieldValue::Number(n) => {
                emit_row(sink, name, this_key, Value::Number(*n))?;
                emitted += 1;
            }
            FieldValue::Other(v) => {
                emit_row(sink, name, this_key, v.clone())?;
                emitted += 1;
            }
        }
    }

    #[cfg(feature = "telemetry")]
    tracing::debug!(fields = data.len(), emitted, "emit_array complete");

    Ok(emitted)
}

#[inline]
fn emit_row<E>(
    sink: &mut E,
    field: &str,
    key: Key,
    value: Value,
) -> core::result::Result<(), E::Error>
where
    E: Emit + ?Sized,
{
    #[cfg(feature = "telemetry")]
    tracing::trace!(field, key = ?key, value = ?value, "emit");
    #[cfg(not(feature = "telemetry"))]
    let _ = field;
    sink.emit(key, value)
}

/// The options-object form of [`emit_array`]: `{data, key, extra_keys?}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmitArray {
    pub data: FieldMap,
    pub key: Key,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub extra_keys: ExtraKeys,
}

fn null_as_empty<'de, D>(deserializer: D) -> core::result::Result<ExtraKeys, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<ExtraKeys>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl EmitArray {
    /// Create an empty emission request under `key`.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// Add a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.data.insert(name, value);
        self
    }

    /// Set the key suffix for a field
    pub fn extra_key(mut self, name: impl Into<String>, suffix: impl Into<Value>) -> Self {
        self.extra_keys.insert(name.into(), suffix.into());
        self
    }

    /// Run [`emit_array`] into `sink`.
    pub fn emit_into<E>(&self, sink: &mut E) -> core::result::Result<usize, E::Error>
    where
        E: Emit + ?Sized,
    {
        emit_array(&self.data, &self.key, &self.extra_keys, sink)
    }
}
