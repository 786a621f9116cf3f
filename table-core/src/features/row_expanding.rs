//! FILENAME: table-core/src/features/row_expanding.rs
//! PURPOSE: Row expansion state and queries.
//! CONTEXT: `expanded` is either "every row" or a map of row id to flag.
//! Whether expansion reshapes the paginated rows or only the rendered page
//! is decided by `TableSettings::paginate_expanded_rows`.

use std::collections::BTreeMap;
use std::rc::Rc;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::feature::TableFeature;
use crate::options::{SliceOptions, TableDefaults};
use crate::row::{Row, RowData};
use crate::state::{slice, SliceValue, Updater};
use crate::table::Table;

pub const EXPANDED: &str = "expanded";

/// Serialized as `true` or as a `{ row id: bool }` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ExpandedRepr", into = "ExpandedRepr")]
pub enum ExpandedState {
    All,
    Rows(BTreeMap<String, bool>),
}

impl Default for ExpandedState {
    fn default() -> Self {
        ExpandedState::Rows(BTreeMap::new())
    }
}

impl ExpandedState {
    pub fn rows<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExpandedState::Rows(ids.into_iter().map(|id| (id.into(), true)).collect())
    }

    /// Nothing expanded and no per-row entries.
    pub fn is_empty(&self) -> bool {
        match self {
            ExpandedState::All => false,
            ExpandedState::Rows(rows) => rows.is_empty(),
        }
    }

    pub fn contains(&self, row_id: &str) -> bool {
        match self {
            ExpandedState::All => true,
            ExpandedState::Rows(rows) => rows.get(row_id).copied().unwrap_or(false),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ExpandedRepr {
    Flag(bool),
    Rows(BTreeMap<String, bool>),
}

impl From<ExpandedRepr> for ExpandedState {
    fn from(repr: ExpandedRepr) -> Self {
        match repr {
            ExpandedRepr::Flag(true) => ExpandedState::All,
            ExpandedRepr::Flag(false) => ExpandedState::default(),
            ExpandedRepr::Rows(rows) => ExpandedState::Rows(rows),
        }
    }
}

impl From<ExpandedState> for ExpandedRepr {
    fn from(state: ExpandedState) -> Self {
        match state {
            ExpandedState::All => ExpandedRepr::Flag(true),
            ExpandedState::Rows(rows) => ExpandedRepr::Rows(rows),
        }
    }
}

pub struct RowExpanding;

impl RowExpanding {
    pub const NAME: &'static str = "row_expanding";
}

impl<T: RowData> TableFeature<T> for RowExpanding {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(EXPANDED, slice(ExpandedState::default()))]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(EXPANDED, SliceOptions::enabled(true));
    }
}

impl<T: RowData> Table<T> {
    pub fn expanded_state(&self) -> ExpandedState {
        self.slice_or_default(EXPANDED)
    }

    pub fn set_expanded(&self, updater: impl Into<Updater<ExpandedState>>) {
        self.set_slice(EXPANDED, updater.into());
    }

    pub fn reset_expanded(&self) {
        let initial = self
            .get_initial_state()
            .get::<ExpandedState>(EXPANDED)
            .cloned()
            .unwrap_or_default();
        self.set_expanded(initial);
    }

    /// Expands everything, or collapses everything. `None` flips the
    /// current "all expanded" status.
    pub fn toggle_all_rows_expanded(&self, expanded: Option<bool>) -> Result<()> {
        let expand = match expanded {
            Some(expand) => expand,
            None => !self.is_all_rows_expanded()?,
        };
        self.set_expanded(if expand { ExpandedState::All } else { ExpandedState::default() });
        Ok(())
    }

    pub fn toggle_row_expanded(&self, row_id: &str, expanded: Option<bool>) -> Result<()> {
        let visible_ids: Vec<String> = self.row_model()?.rows_by_id.keys().cloned().collect();
        let id = row_id.to_string();
        self.set_expanded(Updater::transform(move |old: &ExpandedState| {
            let exists = old.contains(&id);
            let expand = expanded.unwrap_or(!exists);
            let mut rows = match old {
                ExpandedState::All => visible_ids.iter().map(|id| (id.clone(), true)).collect(),
                ExpandedState::Rows(rows) => rows.clone(),
            };
            match (exists, expand) {
                (false, true) => {
                    rows.insert(id.clone(), true);
                    ExpandedState::Rows(rows)
                }
                (true, false) => {
                    rows.remove(&id);
                    ExpandedState::Rows(rows)
                }
                _ => old.clone(),
            }
        }));
        Ok(())
    }

    pub fn row_is_expanded(&self, row: &Row<T>) -> bool {
        let predicate = self.opts().get_is_row_expanded.clone();
        match predicate {
            Some(predicate) => predicate(row),
            None => self.expanded_state().contains(&row.id),
        }
    }

    pub fn row_can_expand(&self, row: &Row<T>) -> bool {
        let predicate = self.opts().get_row_can_expand.clone();
        match predicate {
            Some(predicate) => predicate(row),
            None => !self.slice_options(EXPANDED).is_disabled() && row.has_sub_rows(),
        }
    }

    /// Whether every ancestor of the row is expanded.
    pub fn row_is_all_parents_expanded(&self, row: &Row<T>) -> Result<bool> {
        for parent in self.row_parent_rows(row)? {
            if !self.row_is_expanded(&parent) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_all_rows_expanded(&self) -> Result<bool> {
        match self.expanded_state() {
            ExpandedState::All => Ok(true),
            ExpandedState::Rows(rows) if rows.is_empty() => Ok(false),
            ExpandedState::Rows(_) => {
                let model = self.row_model()?;
                Ok(model.flat_rows.iter().all(|row| self.row_is_expanded(row)))
            }
        }
    }

    pub fn is_some_rows_expanded(&self) -> bool {
        match self.expanded_state() {
            ExpandedState::All => true,
            ExpandedState::Rows(rows) => rows.values().any(|expanded| *expanded),
        }
    }

    pub fn can_some_rows_expand(&self) -> Result<bool> {
        let model = self.pre_pagination_row_model()?;
        Ok(model.flat_rows.iter().any(|row| self.row_can_expand(row)))
    }

    /// Depth of the deepest expanded row, counting top-level rows as 1.
    pub fn expanded_depth(&self) -> Result<usize> {
        let model = self.pre_pagination_row_model()?;
        let state = self.expanded_state();
        Ok(model
            .rows_by_id
            .values()
            .filter(|row| state.contains(&row.id))
            .map(|row| row.depth + 1)
            .max()
            .unwrap_or(0))
    }

    /// Depth-first flattening of `rows`, descending into expanded rows only.
    pub(crate) fn expand_rows(&self, rows: &[Rc<Row<T>>]) -> Vec<Rc<Row<T>>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            self.push_expanded(row, &mut out);
        }
        out
    }

    fn push_expanded(&self, row: &Rc<Row<T>>, out: &mut Vec<Rc<Row<T>>>) {
        out.push(Rc::clone(row));
        if row.has_sub_rows() && self.row_is_expanded(row) {
            for child in &row.sub_rows {
                self.push_expanded(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanded_state_json_layout() {
        assert_eq!(serde_json::to_value(ExpandedState::All).unwrap(), serde_json::json!(true));
        let rows = ExpandedState::rows(["0"]);
        assert_eq!(serde_json::to_value(&rows).unwrap(), serde_json::json!({ "0": true }));
        let back: ExpandedState = serde_json::from_value(serde_json::json!(false)).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn contains_respects_flags() {
        let mut rows = BTreeMap::new();
        rows.insert("a".to_string(), false);
        let state = ExpandedState::Rows(rows);
        assert!(!state.contains("a"));
        assert!(!state.is_empty());
        assert!(ExpandedState::All.contains("anything"));
    }
}
