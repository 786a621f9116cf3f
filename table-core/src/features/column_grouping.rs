//! FILENAME: table-core/src/features/column_grouping.rs
//! PURPOSE: Row grouping by column values, with per-column aggregation.

use std::rc::Rc;
use crate::column::Column;
use crate::error::Result;
use crate::feature::TableFeature;
use crate::fns::{aggregation::auto_aggregation_fn_name, AggregationFn, ProcessingFns, AUTO};
use crate::options::{SliceOptions, TableDefaults};
use crate::row::{Cell, Row, RowData};
use crate::state::{slice, SliceValue, Updater};
use crate::table::Table;

pub const GROUPING: &str = "grouping";

/// Grouped column ids, outermost group first.
pub type GroupingState = Vec<String>;

/// A column's explicitly named aggregation function.
#[derive(Debug, Clone)]
pub struct ResolvedAggregationFn(pub AggregationFn);

pub struct ColumnGrouping;

impl ColumnGrouping {
    pub const NAME: &'static str = "column_grouping";
}

impl<T: RowData> TableFeature<T> for ColumnGrouping {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(GROUPING, slice(GroupingState::new()))]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(GROUPING, SliceOptions::enabled(true));
    }

    fn construct_column(&self, column: &mut Column<T>, fns: &ProcessingFns) -> Result<()> {
        if let Some(name) = column.def.aggregation_fn.as_deref().filter(|name| *name != AUTO) {
            let aggregation_fn = fns.aggregation_fns.resolve(name, &column.id)?;
            column.extensions.insert(ResolvedAggregationFn(aggregation_fn));
        }
        Ok(())
    }
}

impl<T: RowData> Table<T> {
    pub fn grouping_state(&self) -> GroupingState {
        self.slice_or_default(GROUPING)
    }

    pub fn set_grouping(&self, updater: impl Into<Updater<GroupingState>>) {
        self.set_slice(GROUPING, updater.into());
    }

    pub fn reset_grouping(&self) {
        let initial = self
            .get_initial_state()
            .get::<GroupingState>(GROUPING)
            .cloned()
            .unwrap_or_default();
        self.set_grouping(initial);
    }

    /// Adds the column as the innermost group, or removes it if grouped.
    pub fn toggle_grouping(&self, column_id: &str) {
        let id = column_id.to_string();
        self.set_grouping(Updater::transform(move |old: &GroupingState| {
            if old.contains(&id) {
                old.iter().filter(|g| **g != id).cloned().collect()
            } else {
                let mut next = old.clone();
                next.push(id.clone());
                next
            }
        }));
    }

    pub fn column_can_group(&self, column_id: &str) -> Result<bool> {
        let column = self.column(column_id)?;
        Ok(column.has_accessor()
            && column.def.enable_grouping.unwrap_or(true)
            && !self.slice_options(GROUPING).is_disabled())
    }

    pub fn column_is_grouped(&self, column_id: &str) -> bool {
        self.grouping_state().iter().any(|g| g == column_id)
    }

    pub fn column_grouped_index(&self, column_id: &str) -> Option<usize> {
        self.grouping_state().iter().position(|g| g == column_id)
    }

    /// The aggregation used for a column's group cells. `"auto"` picks one
    /// from the first row's value; no setting means no aggregation.
    pub fn column_aggregation_fn(&self, column_id: &str) -> Result<Option<AggregationFn>> {
        let column = self.column(column_id)?;
        if let Some(ResolvedAggregationFn(aggregation_fn)) = column.extensions.get::<ResolvedAggregationFn>() {
            return Ok(Some(aggregation_fn.clone()));
        }
        if column.def.aggregation_fn.as_deref() != Some(AUTO) {
            return Ok(None);
        }
        let core = self.core_row_model()?;
        let sample = match core.flat_rows.first() {
            Some(row) => row.get_value(column_id)?,
            None => return Ok(None),
        };
        let fns = Rc::clone(&self.opts().processing_fns);
        auto_aggregation_fn_name(&sample)
            .map(|name| fns.aggregation_fns.resolve(name, column_id))
            .transpose()
    }

    /// The cell holding a group row's grouping value.
    pub fn cell_is_grouped(&self, row: &Row<T>, cell: &Cell) -> bool {
        self.column_is_grouped(&cell.column_id)
            && row.grouping_column_id.as_deref() == Some(cell.column_id.as_str())
    }

    /// A grouped column's cell on a row grouped by a different column.
    pub fn cell_is_placeholder(&self, row: &Row<T>, cell: &Cell) -> bool {
        !self.cell_is_grouped(row, cell) && self.column_is_grouped(&cell.column_id)
    }

    /// An aggregate cell of a group row.
    pub fn cell_is_aggregated(&self, row: &Row<T>, cell: &Cell) -> bool {
        !self.cell_is_grouped(row, cell) && !self.cell_is_placeholder(row, cell) && row.has_sub_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::options::TableOptions;
    use serde_json::{json, Value};

    fn table() -> Table<Value> {
        let data = vec![json!({ "g": "a", "v": 1, "w": 2 })];
        let columns = vec![
            ColumnDef::accessor("g"),
            ColumnDef::accessor("v").aggregation_fn("auto"),
            ColumnDef::accessor("w"),
            ColumnDef::accessor("x").enable_grouping(false),
        ];
        Table::with_stock_features(TableOptions::new(data, columns)).unwrap()
    }

    #[test]
    fn toggle_adds_and_removes() {
        let table = table();
        table.toggle_grouping("g");
        table.toggle_grouping("v");
        assert_eq!(table.grouping_state(), vec!["g".to_string(), "v".to_string()]);
        assert_eq!(table.column_grouped_index("v"), Some(1));
        table.toggle_grouping("g");
        assert_eq!(table.grouping_state(), vec!["v".to_string()]);
        assert!(!table.column_is_grouped("g"));
    }

    #[test]
    fn aggregation_resolution() {
        let table = table();
        assert_eq!(table.column_aggregation_fn("v").unwrap().map(|f| f.name), Some("sum".to_string()));
        assert!(table.column_aggregation_fn("w").unwrap().is_none());
        assert!(!table.column_can_group("x").unwrap());
    }
}
