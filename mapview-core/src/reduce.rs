//! `_stats` rows and the reductions read off them.
//!
//! A view whose reduce function is the builtin `_stats` returns, for a key
//! range, a single row `{sum, count, min, max, sumsqr}`. Views reduced with
//! `_sum` or `_count` return a bare number instead; [`ReduceRow`] covers both.

use alloc::vec::Vec;
use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::value::{Number, OrderedMap, Value, INTEGRAL_LIMIT};
use crate::{Error, Result};

/// Marker returned by aggregate reads when the key range held no rows.
pub const NO_VALUE: &str = "---";

const STATS_FIELDS: [&str; 5] = ["sum", "count", "min", "max", "sumsqr"];

/// A `_stats` reduce row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub sum: f64,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sumsqr: f64,
}

impl Stats {
    /// Stats of a single observation.
    pub fn single(x: f64) -> Self {
        Self {
            sum: x,
            count: 1,
            min: x,
            max: x,
            sumsqr: x * x,
        }
    }

    /// Fold numeric values into stats. `Ok(None)` when `values` is empty.
    pub fn from_values<'a, I>(values: I) -> Result<Option<Stats>>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut acc: Option<Stats> = None;
        for value in values {
            let x = value.as_f64().ok_or(Error::NonNumeric)?;
            acc = Some(match acc {
                Some(stats) => stats.merge(Stats::single(x)),
                None => Stats::single(x),
            });
        }
        Ok(acc)
    }

    /// Combine two rows (rereduce).
    pub fn merge(self, other: Stats) -> Stats {
        Stats {
            sum: self.sum + other.sum,
            count: self.count + other.count,
            min: if other.min < self.min { other.min } else { self.min },
            max: if other.max > self.max { other.max } else { self.max },
            sumsqr: self.sumsqr + other.sumsqr,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum / self.count as f64)
    }

    /// The row as a view would return it.
    pub fn to_value(&self) -> Value {
        Value::Object(
            OrderedMap::new()
                .with("sum", number(self.sum))
                .with("count", self.count)
                .with("min", number(self.min))
                .with("max", number(self.max))
                .with("sumsqr", number(self.sumsqr)),
        )
    }
}

/// The output of a reduce query for one key range.
#[derive(Debug, Clone, PartialEq)]
pub enum ReduceRow {
    /// `_stats` output
    Stats(Stats),
    /// `_sum` / `_count` output, or anything else a custom reduce returned
    Scalar(Value),
}

impl ReduceRow {
    /// Interpret a reduced row value. Objects carrying all five numeric
    /// `_stats` fields are [`ReduceRow::Stats`]; everything else is a scalar.
    pub fn from_value(value: &Value) -> ReduceRow {
        if let Value::Object(map) = value {
            let mut fields = [0f64; 5];
            let complete = STATS_FIELDS.iter().zip(fields.iter_mut()).all(|(name, slot)| {
                match map.get(*name).and_then(Value::as_f64) {
                    Some(x) => {
                        *slot = x;
                        true
                    }
                    None => false,
                }
            });
            if complete {
                let [sum, count, min, max, sumsqr] = fields;
                return ReduceRow::Stats(Stats {
                    sum,
                    count: count as u64,
                    min,
                    max,
                    sumsqr,
                });
            }
        }
        ReduceRow::Scalar(value.clone())
    }
}

/// A reduction applied to a reduce row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsReduction {
    #[default]
    Sum,
    Count,
    Min,
    Max,
    /// `sum / count` rounded to `ndigits` decimals; an integer when `ndigits == 0`
    Mean { ndigits: u32 },
    SumSqr,
}

impl StatsReduction {
    /// Apply to the reduce output of a key range.
    ///
    /// `Ok(None)` means the range was empty; callers substitute their
    /// no-value marker. `Sum` and `Count` accept a scalar row as-is; the other
    /// reductions need a `_stats` row.
    pub fn apply(&self, row: Option<&ReduceRow>) -> Result<Option<Value>> {
        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let stats = match (self, row) {
            (StatsReduction::Sum | StatsReduction::Count, ReduceRow::Scalar(v)) => {
                return Ok(Some(v.clone()));
            }
            (_, ReduceRow::Scalar(_)) => return Err(Error::NotStats),
            (_, ReduceRow::Stats(stats)) => stats,
        };

        Ok(match *self {
            StatsReduction::Sum => Some(number(stats.sum)),
            StatsReduction::Count => Some(Value::from(stats.count)),
            StatsReduction::Min => Some(number(stats.min)),
            StatsReduction::Max => Some(number(stats.max)),
            StatsReduction::SumSqr => Some(number(stats.sumsqr)),
            StatsReduction::Mean { ndigits } => stats.mean().map(|mean| {
                let rounded = round_to(mean, ndigits);
                if ndigits == 0 {
                    Value::Number(Number::Int(rounded as i64))
                } else {
                    Value::from(rounded)
                }
            }),
        })
    }
}

/// Number of distinct values, compared in view collation order.
pub fn unique_count(values: &[Value]) -> usize {
    let mut sorted: Vec<&Value> = values.iter().collect();
    sorted.sort_by(|a, b| a.collate(b));
    sorted.dedup_by(|a, b| a.collate(b) == Ordering::Equal);
    sorted.len()
}

/// Integral finite floats become `Int`, so `_stats` sums of integers read
/// back as integers.
fn number(x: f64) -> Value {
    Value::Number(Number::normalized(x))
}

/// Round half away from zero to `ndigits` decimals. Values with no digits
/// left to round at that precision are returned unchanged.
fn round_to(x: f64, ndigits: u32) -> f64 {
    let mut factor = 1.0f64;
    for _ in 0..ndigits {
        factor *= 10.0;
        if !factor.is_finite() {
            return x;
        }
    }
    let scaled = x * factor;
    if !scaled.is_finite() || scaled >= INTEGRAL_LIMIT || scaled <= -INTEGRAL_LIMIT {
        return x;
    }
    round_half_away(scaled) / factor
}

fn round_half_away(x: f64) -> f64 {
    if !x.is_finite() || x >= INTEGRAL_LIMIT || x <= -INTEGRAL_LIMIT {
        return x;
    }
    let truncated = (x as i64) as f64;
    let frac = x - truncated;
    if frac >= 0.5 {
        truncated + 1.0
    } else if frac <= -0.5 {
        truncated - 1.0
    } else {
        truncated
    }
}
