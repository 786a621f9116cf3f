//! FILENAME: table-core/src/fns/sort.rs
//! Named comparators for the sorting stage.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use value::{compare_values, CellValue};
use super::FnRegistry;
use crate::error::FnKind;

type CompareFn = dyn Fn(&CellValue, &CellValue) -> Ordering;

/// A named ascending comparator. Direction is applied by the sorting stage.
#[derive(Clone)]
pub struct SortFn {
    pub name: String,
    compare: Rc<CompareFn>,
}

impl SortFn {
    pub fn new(
        name: impl Into<String>,
        compare: impl Fn(&CellValue, &CellValue) -> Ordering + 'static,
    ) -> Self {
        SortFn {
            name: name.into(),
            compare: Rc::new(compare),
        }
    }

    pub fn compare(&self, a: &CellValue, b: &CellValue) -> Ordering {
        (self.compare)(a, b)
    }
}

impl fmt::Debug for SortFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortFn").field("name", &self.name).finish()
    }
}

// ============================================================================
// BUILT-IN COMPARATORS
// ============================================================================

/// Splits text into alternating digit / non-digit runs.
fn split_alphanumeric(s: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                chunks.push(&s[start..i]);
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if start < s.len() {
        chunks.push(&s[start..]);
    }
    chunks
}

/// Natural ordering: digit runs compare numerically, text runs
/// lexicographically, and text sorts before numbers at the same position.
fn compare_alphanumeric(a: &str, b: &str) -> Ordering {
    let a_chunks = split_alphanumeric(a);
    let b_chunks = split_alphanumeric(b);

    for (aa, bb) in a_chunks.iter().zip(b_chunks.iter()) {
        let an = aa.parse::<u128>().ok();
        let bn = bb.parse::<u128>().ok();
        let ordering = match (an, bn) {
            (None, None) => aa.cmp(bb),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(an), Some(bn)) => an.cmp(&bn),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a_chunks.len().cmp(&b_chunks.len())
}

fn sort_text(value: &CellValue) -> String {
    value.display_value()
}

fn alphanumeric(a: &CellValue, b: &CellValue) -> Ordering {
    compare_alphanumeric(&sort_text(a).to_lowercase(), &sort_text(b).to_lowercase())
}

fn alphanumeric_case_sensitive(a: &CellValue, b: &CellValue) -> Ordering {
    compare_alphanumeric(&sort_text(a), &sort_text(b))
}

fn text(a: &CellValue, b: &CellValue) -> Ordering {
    sort_text(a).to_lowercase().cmp(&sort_text(b).to_lowercase())
}

fn text_case_sensitive(a: &CellValue, b: &CellValue) -> Ordering {
    sort_text(a).cmp(&sort_text(b))
}

fn basic(a: &CellValue, b: &CellValue) -> Ordering {
    compare_values(a, b)
}

pub(crate) fn builtin_sort_fns() -> FnRegistry<SortFn> {
    let mut registry = FnRegistry::new(FnKind::Sort);
    registry
        .register("alphanumeric", SortFn::new("alphanumeric", alphanumeric))
        .register(
            "alphanumericCaseSensitive",
            SortFn::new("alphanumericCaseSensitive", alphanumeric_case_sensitive),
        )
        .register("text", SortFn::new("text", text))
        .register("textCaseSensitive", SortFn::new("textCaseSensitive", text_case_sensitive))
        .register("basic", SortFn::new("basic", basic));
    registry
}

/// Comparator name picked for a column from a sample of its values:
/// text containing digit runs sorts alphanumerically, other text as text,
/// everything else with the basic value order.
pub fn auto_sort_fn_name<'a>(samples: impl IntoIterator<Item = &'a CellValue>) -> &'static str {
    let mut is_text = false;
    for sample in samples {
        if let CellValue::Text(s) = sample {
            is_text = true;
            if split_alphanumeric(s).len() > 1 {
                return "alphanumeric";
            }
        }
    }
    if is_text {
        "text"
    } else {
        "basic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_digit_runs() {
        assert_eq!(split_alphanumeric("item10b"), vec!["item", "10", "b"]);
        assert_eq!(split_alphanumeric("42"), vec!["42"]);
        assert!(split_alphanumeric("").is_empty());
    }

    #[test]
    fn alphanumeric_is_natural() {
        let mut values = vec!["item10", "item2", "Item1", "item"];
        values.sort_by(|a, b| alphanumeric(&CellValue::text(*a), &CellValue::text(*b)));
        assert_eq!(values, vec!["item", "Item1", "item2", "item10"]);
    }

    #[test]
    fn text_before_number_at_same_position() {
        assert_eq!(compare_alphanumeric("a", "1"), Ordering::Less);
        assert_eq!(compare_alphanumeric("1", "a"), Ordering::Greater);
    }

    #[test]
    fn auto_picks_by_sample() {
        let plain = [CellValue::text("abc")];
        let mixed = [CellValue::text("abc"), CellValue::text("a1")];
        let numbers = [CellValue::Number(1.0)];
        assert_eq!(auto_sort_fn_name(&plain), "text");
        assert_eq!(auto_sort_fn_name(&mixed), "alphanumeric");
        assert_eq!(auto_sort_fn_name(&numbers), "basic");
    }
}
