//! FILENAME: table-core/src/fns/filter.rs
//! Filter predicates and the filter value they are tested against.

use std::fmt;
use std::rc::Rc;
use serde::{Deserialize, Serialize};
use value::{CellValue, ValueKind};
use super::FnRegistry;
use crate::error::FnKind;

/// A user-entered filter value, stored in the column/global filter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single value (search text, exact match).
    Value(CellValue),
    /// An inclusive numeric range; a missing bound is open.
    Range { min: Option<f64>, max: Option<f64> },
    /// A set of accepted values.
    List(Vec<CellValue>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Value(CellValue::Text(value.into()))
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::Range { min, max }
    }

    /// `None`, empty string, or an empty list/range: nothing to filter by.
    pub fn is_falsey(&self) -> bool {
        match self {
            FilterValue::Value(CellValue::Empty) => true,
            FilterValue::Value(CellValue::Text(s)) => s.is_empty(),
            FilterValue::Value(_) => false,
            FilterValue::Range { min, max } => min.is_none() && max.is_none(),
            FilterValue::List(values) => values.is_empty(),
        }
    }

    fn as_search_text(&self) -> Option<String> {
        match self {
            FilterValue::Value(CellValue::Empty) => None,
            FilterValue::Value(v) => Some(v.display_value()),
            _ => None,
        }
    }
}

impl From<CellValue> for FilterValue {
    fn from(value: CellValue) -> Self {
        FilterValue::Value(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::text(value)
    }
}

type TestFn = dyn Fn(&CellValue, &FilterValue) -> bool;
type ResolveFn = dyn Fn(&FilterValue) -> FilterValue;
type AutoRemoveFn = dyn Fn(&FilterValue) -> bool;

/// A named filter predicate with optional value normalization and an
/// auto-remove test used when the filter value is set.
#[derive(Clone)]
pub struct FilterFn {
    pub name: String,
    test: Rc<TestFn>,
    resolve_filter_value: Option<Rc<ResolveFn>>,
    auto_remove: Option<Rc<AutoRemoveFn>>,
}

impl FilterFn {
    pub fn new(
        name: impl Into<String>,
        test: impl Fn(&CellValue, &FilterValue) -> bool + 'static,
    ) -> Self {
        FilterFn {
            name: name.into(),
            test: Rc::new(test),
            resolve_filter_value: None,
            auto_remove: None,
        }
    }

    pub fn with_resolve_filter_value(
        mut self,
        resolve: impl Fn(&FilterValue) -> FilterValue + 'static,
    ) -> Self {
        self.resolve_filter_value = Some(Rc::new(resolve));
        self
    }

    pub fn with_auto_remove(mut self, auto_remove: impl Fn(&FilterValue) -> bool + 'static) -> Self {
        self.auto_remove = Some(Rc::new(auto_remove));
        self
    }

    pub fn test(&self, value: &CellValue, filter_value: &FilterValue) -> bool {
        (self.test)(value, filter_value)
    }

    /// Normalizes the stored filter value once per filtering pass.
    pub fn resolve_filter_value(&self, filter_value: &FilterValue) -> FilterValue {
        match &self.resolve_filter_value {
            Some(resolve) => resolve(filter_value),
            None => filter_value.clone(),
        }
    }

    /// Whether setting this value should remove the filter entirely.
    pub fn should_auto_remove(&self, filter_value: &FilterValue) -> bool {
        self.auto_remove
            .as_ref()
            .map_or(false, |auto_remove| auto_remove(filter_value))
    }
}

impl fmt::Debug for FilterFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterFn").field("name", &self.name).finish()
    }
}

// ============================================================================
// BUILT-IN FILTERS
// ============================================================================

fn includes_string(value: &CellValue, filter_value: &FilterValue) -> bool {
    match filter_value.as_search_text() {
        Some(search) => value
            .display_value()
            .to_lowercase()
            .contains(&search.to_lowercase()),
        None => false,
    }
}

fn includes_string_sensitive(value: &CellValue, filter_value: &FilterValue) -> bool {
    match filter_value.as_search_text() {
        Some(search) => value.display_value().contains(&search),
        None => false,
    }
}

fn equals_string(value: &CellValue, filter_value: &FilterValue) -> bool {
    match filter_value.as_search_text() {
        Some(search) => value.display_value().to_lowercase() == search.to_lowercase(),
        None => false,
    }
}

fn equals(value: &CellValue, filter_value: &FilterValue) -> bool {
    matches!(filter_value, FilterValue::Value(v) if v == value)
}

/// Loose equality: numbers compare numerically across text/number, the rest
/// by display text.
fn weak_equals(value: &CellValue, filter_value: &FilterValue) -> bool {
    let FilterValue::Value(expected) = filter_value else {
        return false;
    };
    match (value.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => value.display_value() == expected.display_value(),
    }
}

fn in_number_range(value: &CellValue, filter_value: &FilterValue) -> bool {
    let FilterValue::Range { min, max } = filter_value else {
        return false;
    };
    let Some(n) = value.as_f64() else {
        return false;
    };
    n >= min.unwrap_or(f64::NEG_INFINITY) && n <= max.unwrap_or(f64::INFINITY)
}

/// Swaps inverted bounds so `min <= max`.
fn resolve_number_range(filter_value: &FilterValue) -> FilterValue {
    match filter_value {
        FilterValue::Range { min: Some(a), max: Some(b) } if a > b => FilterValue::Range {
            min: Some(*b),
            max: Some(*a),
        },
        FilterValue::Value(v) => {
            // A single number filters as an exact range
            let n = v.as_f64();
            FilterValue::Range { min: n, max: n }
        }
        other => other.clone(),
    }
}

fn in_list(value: &CellValue, filter_value: &FilterValue) -> bool {
    match filter_value {
        FilterValue::List(values) => values.iter().any(|v| v == value),
        FilterValue::Value(v) => v == value,
        FilterValue::Range { .. } => false,
    }
}

fn falsey(filter_value: &FilterValue) -> bool {
    filter_value.is_falsey()
}

pub(crate) fn builtin_filter_fns() -> FnRegistry<FilterFn> {
    let mut registry = FnRegistry::new(FnKind::Filter);
    registry
        .register(
            "includesString",
            FilterFn::new("includesString", includes_string).with_auto_remove(falsey),
        )
        .register(
            "includesStringSensitive",
            FilterFn::new("includesStringSensitive", includes_string_sensitive)
                .with_auto_remove(falsey),
        )
        .register(
            "equalsString",
            FilterFn::new("equalsString", equals_string).with_auto_remove(falsey),
        )
        .register("equals", FilterFn::new("equals", equals).with_auto_remove(falsey))
        .register(
            "weakEquals",
            FilterFn::new("weakEquals", weak_equals).with_auto_remove(falsey),
        )
        .register(
            "inNumberRange",
            FilterFn::new("inNumberRange", in_number_range)
                .with_resolve_filter_value(resolve_number_range)
                .with_auto_remove(falsey),
        )
        .register("inList", FilterFn::new("inList", in_list).with_auto_remove(falsey));
    registry
}

/// Filter function name picked for a column from its first row's value.
pub fn auto_filter_fn_name(sample: &CellValue) -> &'static str {
    match sample.kind() {
        ValueKind::Text => "includesString",
        ValueKind::Number => "inNumberRange",
        ValueKind::Boolean => "equals",
        ValueKind::Empty => "weakEquals",
    }
}
