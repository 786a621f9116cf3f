//! FILENAME: table-core/src/fns/mod.rs
//! Named processing functions resolved by string key.
//!
//! Column definitions refer to filter, sort and aggregation functions by
//! name. The table resolves those names against `ProcessingFns` once, when
//! the column is constructed, so a typo fails at construction rather than
//! on first render. The special name `"auto"` defers the choice to the
//! first row's value kind.

pub mod aggregation;
pub mod filter;
pub mod sort;

use rustc_hash::FxHashMap;
use crate::error::{FnKind, Result, TableError};

pub use aggregation::{AggregateAccumulator, AggregationFn};
pub use filter::{FilterFn, FilterValue};
pub use sort::SortFn;

/// Name that asks for value-based auto detection.
pub const AUTO: &str = "auto";

/// A name -> function table for one kind of processing function.
#[derive(Clone)]
pub struct FnRegistry<F> {
    kind: FnKind,
    fns: FxHashMap<String, F>,
}

impl<F: Clone> FnRegistry<F> {
    pub fn new(kind: FnKind) -> Self {
        FnRegistry {
            kind,
            fns: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, f: F) -> &mut Self {
        self.fns.insert(name.into(), f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&F> {
        self.fns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    /// Looks up a function, failing with `UnresolvedFunction` for unknown names.
    pub fn resolve(&self, name: &str, column: &str) -> Result<F> {
        self.fns
            .get(name)
            .cloned()
            .ok_or_else(|| TableError::UnresolvedFunction {
                kind: self.kind,
                name: name.to_string(),
                column: column.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fns.keys().map(String::as_str)
    }
}

/// The three function registries a table resolves column settings against.
#[derive(Clone)]
pub struct ProcessingFns {
    pub filter_fns: FnRegistry<FilterFn>,
    pub sort_fns: FnRegistry<SortFn>,
    pub aggregation_fns: FnRegistry<AggregationFn>,
}

impl ProcessingFns {
    /// Registries pre-populated with every built-in function.
    pub fn builtin() -> Self {
        ProcessingFns {
            filter_fns: filter::builtin_filter_fns(),
            sort_fns: sort::builtin_sort_fns(),
            aggregation_fns: aggregation::builtin_aggregation_fns(),
        }
    }

    /// Empty registries (only user-registered functions resolve).
    pub fn empty() -> Self {
        ProcessingFns {
            filter_fns: FnRegistry::new(FnKind::Filter),
            sort_fns: FnRegistry::new(FnKind::Sort),
            aggregation_fns: FnRegistry::new(FnKind::Aggregation),
        }
    }
}

impl Default for ProcessingFns {
    fn default() -> Self {
        ProcessingFns::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let fns = ProcessingFns::builtin();
        let err = fns.sort_fns.resolve("nope", "age").err();
        assert_eq!(
            err,
            Some(TableError::UnresolvedFunction {
                kind: FnKind::Sort,
                name: "nope".to_string(),
                column: "age".to_string(),
            })
        );
    }

    #[test]
    fn builtins_are_registered() {
        let fns = ProcessingFns::builtin();
        assert!(fns.filter_fns.contains("includesString"));
        assert!(fns.sort_fns.contains("alphanumeric"));
        assert!(fns.aggregation_fns.contains("sum"));
        assert!(!ProcessingFns::empty().aggregation_fns.contains("sum"));
    }
}
