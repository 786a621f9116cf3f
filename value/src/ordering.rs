//! FILENAME: value/src/ordering.rs
//! PURPOSE: Ordering and hashing helpers for cell values.
//! CONTEXT: Grouping needs values as hash keys and sorting needs a total
//! order across mixed kinds, so both live next to `CellValue`.

use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use crate::cell::CellValue;

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash equal
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// Total order across value kinds.
/// Empty sorts first, then numbers, text, booleans. NaN sorts after every
/// other number.
pub fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
        (CellValue::Empty, _) => Ordering::Less,
        (_, CellValue::Empty) => Ordering::Greater,

        (CellValue::Number(na), CellValue::Number(nb)) => compare_f64(*na, *nb),
        (CellValue::Number(_), _) => Ordering::Less,
        (_, CellValue::Number(_)) => Ordering::Greater,

        (CellValue::Text(ta), CellValue::Text(tb)) => ta.cmp(tb),
        (CellValue::Text(_), _) => Ordering::Less,
        (_, CellValue::Text(_)) => Ordering::Greater,

        (CellValue::Boolean(ba), CellValue::Boolean(bb)) => ba.cmp(bb),
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
