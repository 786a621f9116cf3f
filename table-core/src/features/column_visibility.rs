//! FILENAME: table-core/src/features/column_visibility.rs
//! PURPOSE: Per-column show/hide state and the visible leaf column list.

use std::collections::BTreeMap;
use std::rc::Rc;
use crate::column::Column;
use crate::error::Result;
use crate::feature::TableFeature;
use crate::memo::ByRef;
use crate::options::{SliceOptions, TableDefaults};
use crate::row::{Cell, Row, RowData};
use crate::state::{slice, SliceDep, SliceValue, Updater};
use crate::table::Table;

pub const COLUMN_VISIBILITY: &str = "columnVisibility";

/// Column id to visibility. Absent ids are visible.
pub type VisibilityState = BTreeMap<String, bool>;

pub(crate) struct VisibleDeps<T: RowData> {
    ordered: ByRef<Vec<Rc<Column<T>>>>,
    visibility: SliceDep,
}

impl<T: RowData> PartialEq for VisibleDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered && self.visibility == other.visibility
    }
}

pub struct ColumnVisibility;

impl ColumnVisibility {
    pub const NAME: &'static str = "column_visibility";
}

impl<T: RowData> TableFeature<T> for ColumnVisibility {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(COLUMN_VISIBILITY, slice(VisibilityState::new()))]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(COLUMN_VISIBILITY, SliceOptions::enabled(true));
    }
}

/// A leaf is visible unless hidden explicitly; a group column is visible
/// while any of its children is.
pub(crate) fn is_visible<T: RowData>(column: &Column<T>, state: &VisibilityState) -> bool {
    if column.is_leaf() {
        state.get(&column.id).copied().unwrap_or(true)
    } else {
        column.columns.iter().any(|child| is_visible(child, state))
    }
}

impl<T: RowData> Table<T> {
    pub fn column_visibility_state(&self) -> VisibilityState {
        if !self.has_feature(ColumnVisibility::NAME) {
            return VisibilityState::new();
        }
        self.slice_or_default(COLUMN_VISIBILITY)
    }

    pub fn set_column_visibility(&self, updater: impl Into<Updater<VisibilityState>>) {
        self.set_slice(COLUMN_VISIBILITY, updater.into());
    }

    pub fn reset_column_visibility(&self) {
        let initial = self
            .get_initial_state()
            .get::<VisibilityState>(COLUMN_VISIBILITY)
            .cloned()
            .unwrap_or_default();
        self.set_column_visibility(initial);
    }

    pub fn column_can_hide(&self, column_id: &str) -> Result<bool> {
        let column = self.column(column_id)?;
        Ok(self.has_feature(ColumnVisibility::NAME)
            && column.def.enable_hiding.unwrap_or(true)
            && !self.slice_options(COLUMN_VISIBILITY).is_disabled())
    }

    pub fn is_column_visible(&self, column_id: &str) -> Result<bool> {
        let column = self.column(column_id)?;
        Ok(is_visible(&column, &self.column_visibility_state()))
    }

    /// Sets a column's visibility, or flips it when `value` is `None`.
    /// Columns that cannot hide are left alone.
    pub fn toggle_column_visibility(&self, column_id: &str, value: Option<bool>) -> Result<()> {
        if !self.column_can_hide(column_id)? {
            return Ok(());
        }
        let visible = value.unwrap_or(!self.is_column_visible(column_id)?);
        let id = column_id.to_string();
        self.set_column_visibility(Updater::transform(move |old: &VisibilityState| {
            let mut next = old.clone();
            next.insert(id.clone(), visible);
            next
        }));
        Ok(())
    }

    /// Shows or hides every leaf column. Hiding skips columns that cannot
    /// hide.
    pub fn toggle_all_columns_visible(&self, value: Option<bool>) -> Result<()> {
        let visible = match value {
            Some(value) => value,
            None => !self.is_all_columns_visible()?,
        };
        let mut next = VisibilityState::new();
        for column in self.all_leaf_columns()?.iter() {
            let shown = visible || !self.column_can_hide(&column.id)?;
            next.insert(column.id.clone(), shown);
        }
        self.set_column_visibility(next);
        Ok(())
    }

    pub fn is_all_columns_visible(&self) -> Result<bool> {
        let state = self.column_visibility_state();
        Ok(self.all_leaf_columns()?.iter().all(|c| is_visible(c, &state)))
    }

    pub fn is_some_columns_visible(&self) -> Result<bool> {
        let state = self.column_visibility_state();
        Ok(self.all_leaf_columns()?.iter().any(|c| is_visible(c, &state)))
    }

    /// Ordered leaf columns that are currently shown.
    pub fn visible_leaf_columns(&self) -> Result<Rc<Vec<Rc<Column<T>>>>> {
        let ordered = self.ordered_leaf_columns()?;
        if !self.has_feature(ColumnVisibility::NAME) {
            return Ok(ordered);
        }
        self.caches.visible_columns.get(
            || {
                Ok(VisibleDeps {
                    ordered: ByRef::new(&ordered),
                    visibility: SliceDep(self.slice_value(COLUMN_VISIBILITY)),
                })
            },
            |_| {
                let state = self.column_visibility_state();
                Ok(Rc::new(
                    ordered
                        .iter()
                        .filter(|c| is_visible(c, &state))
                        .cloned()
                        .collect(),
                ))
            },
        )
    }

    /// A row's cells for the visible columns, in display order.
    pub fn row_visible_cells(&self, row: &Row<T>) -> Result<Vec<Rc<Cell>>> {
        let cells = row.all_cells()?;
        let columns = self.visible_leaf_columns()?;
        Ok(columns
            .iter()
            .filter_map(|column| cells.iter().find(|cell| cell.column_id == column.id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::options::TableOptions;
    use serde_json::{json, Value};

    fn table() -> Table<Value> {
        let columns = vec![
            ColumnDef::group(
                "Name",
                vec![ColumnDef::accessor("first"), ColumnDef::accessor("last")],
            ),
            ColumnDef::accessor("age").enable_hiding(false),
        ];
        let data = vec![json!({"first": "Ada", "last": "Lovelace", "age": 36})];
        Table::with_stock_features(TableOptions::new(data, columns)).unwrap()
    }

    fn ids(columns: &[Rc<Column<Value>>]) -> Vec<&str> {
        columns.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn hidden_columns_drop_out() {
        let table = table();
        table.toggle_column_visibility("last", None).unwrap();
        assert!(!table.is_column_visible("last").unwrap());
        assert!(table.is_column_visible("Name").unwrap());
        assert_eq!(ids(&table.visible_leaf_columns().unwrap()), vec!["first", "age"]);

        table.toggle_column_visibility("first", Some(false)).unwrap();
        assert!(!table.is_column_visible("Name").unwrap());
        assert!(table.is_some_columns_visible().unwrap());
        assert!(!table.is_all_columns_visible().unwrap());
    }

    #[test]
    fn unhideable_columns_stay() {
        let table = table();
        table.toggle_column_visibility("age", Some(false)).unwrap();
        assert!(table.is_column_visible("age").unwrap());

        table.toggle_all_columns_visible(Some(false)).unwrap();
        assert_eq!(ids(&table.visible_leaf_columns().unwrap()), vec!["age"]);
        table.toggle_all_columns_visible(None).unwrap();
        assert!(table.is_all_columns_visible().unwrap());
    }

    #[test]
    fn visible_cells_follow_column_order() {
        let table = table();
        table.set_column_order(vec!["age".to_string()]);
        table.toggle_column_visibility("first", Some(false)).unwrap();
        let row = table.get_row("0", false).unwrap();
        let cells = table.row_visible_cells(&row).unwrap();
        let values: Vec<String> = cells.iter().map(|c| c.value.to_string()).collect();
        assert_eq!(values, vec!["36", "Lovelace"]);
    }
}
