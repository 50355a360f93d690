//! Key ranges over a view.

use alloc::vec::Vec;
use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::value::{collate_keys, Key, Value};

fn default_inclusive_end() -> bool {
    true
}

/// A `[start, end]` range of view keys in collation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: Key,
    pub end: Key,
    #[serde(default = "default_inclusive_end")]
    pub inclusive_end: bool,
}

impl KeyRange {
    /// Range with an inclusive end.
    pub fn new(start: Key, end: Key) -> Self {
        Self {
            start,
            end,
            inclusive_end: true,
        }
    }

    /// Every key that starts with `prefix`.
    pub fn prefix(prefix: &[Value]) -> Self {
        Self::with_base(prefix, Vec::new(), close_high(Vec::new()))
    }

    /// `base ++ start_suffix` to `base ++ end_suffix`.
    pub fn with_base(base: &[Value], start_suffix: Key, end_suffix: Key) -> Self {
        let join = |suffix: Key| {
            let mut key = Key::with_capacity(base.len() + suffix.len());
            key.extend_from_slice(base);
            key.extend(suffix);
            key
        };
        Self::new(join(start_suffix), join(end_suffix))
    }

    pub fn exclusive_end(mut self) -> Self {
        self.inclusive_end = false;
        self
    }

    pub fn contains(&self, key: &[Value]) -> bool {
        if collate_keys(key, &self.start) == Ordering::Less {
            return false;
        }
        match collate_keys(key, &self.end) {
            Ordering::Less => true,
            Ordering::Equal => self.inclusive_end,
            Ordering::Greater => false,
        }
    }
}

/// Append the `{}` sentinel so the key closes every key it prefixes.
pub fn close_high(mut key: Key) -> Key {
    key.push(Value::high());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key;

    #[test]
    fn prefix_range_covers_longer_keys() {
        let range = KeyRange::prefix(&key!["u1", "foo"]);
        assert!(range.contains(&key!["u1", "foo"]));
        assert!(range.contains(&key!["u1", "foo", 2024, "x"]));
        assert!(!range.contains(&key!["u1", "fop"]));
        assert!(!range.contains(&key!["u1"]));
        assert!(!range.contains(&key!["u2", "foo"]));
    }

    #[test]
    fn with_base_joins_suffixes() {
        let range = KeyRange::with_base(&key!["u1", "bar"], key![10], key![20]);
        assert_eq!(range.start, key!["u1", "bar", 10]);
        assert_eq!(range.end, key!["u1", "bar", 20]);
        assert!(range.contains(&key!["u1", "bar", 20]));
        assert!(!range.exclusive_end().contains(&key!["u1", "bar", 20]));
    }

    #[test]
    fn end_bound_without_sentinel_excludes_suffixed_keys() {
        let range = KeyRange::with_base(&key!["u1", "bar"], key![], key![20]);
        assert!(!range.contains(&key!["u1", "bar", 20, "extra"]));
        assert!(range.contains(&key!["u1", "bar", 19, "extra"]));
    }

    #[test]
    fn range_from_json_defaults_inclusive() {
        let range: KeyRange = serde_json::from_str(r#"{"start": ["a"], "end": ["a", {}]}"#).unwrap();
        assert!(range.inclusive_end);
        assert_eq!(range.end, close_high(key!["a"]));
    }
}
