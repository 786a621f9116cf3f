//! FILENAME: table-core/src/fns/aggregation.rs
//! Aggregation functions for group rows.
//!
//! An aggregation receives the values of a group's leaf rows and of its
//! direct child rows (which are themselves group rows when grouping is
//! nested). Returning `CellValue::Empty` means "no aggregate": group cells
//! are never silently zero.

use std::fmt;
use std::rc::Rc;
use rustc_hash::FxHashSet;
use value::{compare_values, CellValue, OrderedFloat, ValueKind};
use super::FnRegistry;
use crate::error::FnKind;

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Accumulator for computing numeric aggregates in one pass.
/// Non-numeric values only bump `count`.
#[derive(Debug, Clone, Default)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub product: Option<f64>,
    /// Sum of squared differences from the mean (Welford's algorithm).
    pub m2: f64,
    pub mean: f64,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator::default()
    }

    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let mut acc = AggregateAccumulator::new();
        for value in values {
            acc.add(value);
        }
        acc
    }

    pub fn add(&mut self, value: &CellValue) {
        match value {
            CellValue::Number(n) => self.add_number(*n),
            _ => self.count += 1,
        }
    }

    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.product = Some(self.product.map_or(value, |p| p * value));

        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn numeric<F: FnOnce(&Self) -> f64>(&self, f: F) -> CellValue {
        if self.count_numbers > 0 {
            CellValue::Number(f(self))
        } else {
            CellValue::Empty
        }
    }

    /// Sample variance; needs at least two numbers.
    pub fn variance(&self) -> CellValue {
        if self.count_numbers > 1 {
            CellValue::Number(self.m2 / ((self.count_numbers - 1) as f64))
        } else {
            CellValue::Empty
        }
    }
}

// ============================================================================
// AGGREGATION FUNCTIONS
// ============================================================================

type AggregateFn = dyn Fn(&[CellValue], &[CellValue]) -> CellValue;

/// A named aggregation: `(leaf values, child values) -> aggregate`.
#[derive(Clone)]
pub struct AggregationFn {
    pub name: String,
    aggregate: Rc<AggregateFn>,
}

impl AggregationFn {
    pub fn new(
        name: impl Into<String>,
        aggregate: impl Fn(&[CellValue], &[CellValue]) -> CellValue + 'static,
    ) -> Self {
        AggregationFn {
            name: name.into(),
            aggregate: Rc::new(aggregate),
        }
    }

    pub fn aggregate(&self, leaf_values: &[CellValue], child_values: &[CellValue]) -> CellValue {
        (self.aggregate)(leaf_values, child_values)
    }
}

impl fmt::Debug for AggregationFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationFn").field("name", &self.name).finish()
    }
}

fn sum(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    // Sum of no numbers is still a sum
    CellValue::Number(AggregateAccumulator::from_values(leaves).sum)
}

fn min(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    AggregateAccumulator::from_values(leaves)
        .min
        .map_or(CellValue::Empty, CellValue::Number)
}

fn max(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    AggregateAccumulator::from_values(leaves)
        .max
        .map_or(CellValue::Empty, CellValue::Number)
}

fn mean(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    AggregateAccumulator::from_values(leaves).numeric(|acc| acc.sum / acc.count_numbers as f64)
}

fn product(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    AggregateAccumulator::from_values(leaves)
        .product
        .map_or(CellValue::Empty, CellValue::Number)
}

fn variance(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    AggregateAccumulator::from_values(leaves).variance()
}

fn std_dev(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    match AggregateAccumulator::from_values(leaves).variance() {
        CellValue::Number(v) => CellValue::Number(v.sqrt()),
        other => other,
    }
}

/// Median of the leaf values; undefined unless every value is a number.
fn median(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    if leaves.is_empty() || leaves.iter().any(|v| v.kind() != ValueKind::Number) {
        return CellValue::Empty;
    }
    let mut sorted: Vec<&CellValue> = leaves.iter().collect();
    sorted.sort_by(|a, b| compare_values(a, b));
    let mid = sorted.len() / 2;
    let pick = |i: usize| sorted[i].as_f64().unwrap_or(0.0);
    if sorted.len() % 2 == 0 {
        CellValue::Number((pick(mid - 1) + pick(mid)) / 2.0)
    } else {
        CellValue::Number(pick(mid))
    }
}

fn count(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    CellValue::from(leaves.len())
}

#[derive(Hash, PartialEq, Eq)]
enum UniqueKey<'a> {
    Empty,
    Number(OrderedFloat),
    Text(&'a str),
    Boolean(bool),
}

fn unique_count(leaves: &[CellValue], _: &[CellValue]) -> CellValue {
    let unique: FxHashSet<UniqueKey<'_>> = leaves
        .iter()
        .map(|v| match v {
            CellValue::Empty => UniqueKey::Empty,
            CellValue::Number(n) => UniqueKey::Number(OrderedFloat(*n)),
            CellValue::Text(s) => UniqueKey::Text(s.as_str()),
            CellValue::Boolean(b) => UniqueKey::Boolean(*b),
        })
        .collect();
    CellValue::from(unique.len())
}

pub(crate) fn builtin_aggregation_fns() -> FnRegistry<AggregationFn> {
    let mut registry = FnRegistry::new(FnKind::Aggregation);
    let builtins: [(&str, fn(&[CellValue], &[CellValue]) -> CellValue); 10] = [
        ("sum", sum),
        ("min", min),
        ("max", max),
        ("mean", mean),
        ("median", median),
        ("count", count),
        ("uniqueCount", unique_count),
        ("product", product),
        ("variance", variance),
        ("stdDev", std_dev),
    ];
    for (name, f) in builtins {
        registry.register(name, AggregationFn::new(name, f));
    }
    registry
}

/// Aggregation picked for a column from its first leaf value, if any.
pub fn auto_aggregation_fn_name(sample: &CellValue) -> Option<&'static str> {
    match sample.kind() {
        ValueKind::Number => Some("sum"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::Number(*v)).collect()
    }

    fn run(name: &str, leaves: &[CellValue]) -> CellValue {
        builtin_aggregation_fns()
            .resolve(name, "col")
            .unwrap()
            .aggregate(leaves, &[])
    }

    #[test]
    fn basic_numeric_aggregates() {
        let v = numbers(&[1.0, 3.0, 5.0]);
        assert_eq!(run("sum", &v), CellValue::Number(9.0));
        assert_eq!(run("min", &v), CellValue::Number(1.0));
        assert_eq!(run("max", &v), CellValue::Number(5.0));
        assert_eq!(run("mean", &v), CellValue::Number(3.0));
        assert_eq!(run("median", &v), CellValue::Number(3.0));
        assert_eq!(run("count", &v), CellValue::Number(3.0));
        assert_eq!(run("product", &v), CellValue::Number(15.0));
        assert_eq!(run("variance", &v), CellValue::Number(4.0));
        assert_eq!(run("stdDev", &v), CellValue::Number(2.0));
    }

    #[test]
    fn no_numbers_means_no_aggregate() {
        let text = vec![CellValue::text("a"), CellValue::text("b")];
        assert_eq!(run("min", &text), CellValue::Empty);
        assert_eq!(run("mean", &text), CellValue::Empty);
        assert_eq!(run("median", &text), CellValue::Empty);
        assert_eq!(run("count", &text), CellValue::Number(2.0));
    }

    #[test]
    fn even_median_averages_middle_pair() {
        assert_eq!(run("median", &numbers(&[4.0, 1.0, 3.0, 2.0])), CellValue::Number(2.5));
    }

    #[test]
    fn unique_count_dedupes_across_kinds() {
        let v = vec![
            CellValue::text("a"),
            CellValue::text("a"),
            CellValue::Number(1.0),
            CellValue::Number(1.0),
            CellValue::Empty,
        ];
        assert_eq!(run("uniqueCount", &v), CellValue::Number(3.0));
    }
}
