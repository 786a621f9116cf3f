//! FILENAME: table-core/src/features/column_ordering.rs
//! PURPOSE: Explicit leaf column order, and placement of grouped columns.

use std::rc::Rc;
use crate::column::Column;
use crate::error::Result;
use crate::feature::TableFeature;
use crate::features::column_grouping::{ColumnGrouping, GroupingState, GROUPING};
use crate::memo::ByRef;
use crate::options::{GroupedColumnMode, SliceOptions, TableDefaults};
use crate::row::RowData;
use crate::state::{slice, SliceDep, SliceValue, Updater};
use crate::table::Table;

pub const COLUMN_ORDER: &str = "columnOrder";

/// Leaf column ids in display order. Columns not listed follow, in
/// declaration order.
pub type ColumnOrderState = Vec<String>;

pub(crate) struct OrderDeps<T: RowData> {
    leaf_columns: ByRef<Vec<Rc<Column<T>>>>,
    order: SliceDep,
    grouping: SliceDep,
    mode: GroupedColumnMode,
}

impl<T: RowData> PartialEq for OrderDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.leaf_columns == other.leaf_columns
            && self.order == other.order
            && self.grouping == other.grouping
            && self.mode == other.mode
    }
}

pub struct ColumnOrdering;

impl ColumnOrdering {
    pub const NAME: &'static str = "column_ordering";
}

impl<T: RowData> TableFeature<T> for ColumnOrdering {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(COLUMN_ORDER, slice(ColumnOrderState::new()))]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(COLUMN_ORDER, SliceOptions::enabled(true));
    }
}

/// Applies an explicit order, then moves or drops grouped columns.
pub fn order_columns<T: RowData>(
    columns: &[Rc<Column<T>>],
    order: &[String],
    grouping: &[String],
    mode: GroupedColumnMode,
) -> Vec<Rc<Column<T>>> {
    let mut remaining: Vec<Rc<Column<T>>> = columns.to_vec();
    let mut ordered = Vec::with_capacity(columns.len());
    for id in order {
        if remaining.is_empty() {
            break;
        }
        if let Some(pos) = remaining.iter().position(|c| c.id == *id) {
            ordered.push(remaining.remove(pos));
        }
    }
    ordered.extend(remaining);

    if grouping.is_empty() || mode == GroupedColumnMode::None {
        return ordered;
    }
    let (grouped, rest): (Vec<_>, Vec<_>) = ordered.into_iter().partition(|c| grouping.contains(&c.id));
    if mode == GroupedColumnMode::Remove {
        return rest;
    }
    let mut reordered: Vec<Rc<Column<T>>> = grouping
        .iter()
        .filter_map(|id| grouped.iter().find(|c| c.id == *id).cloned())
        .collect();
    reordered.extend(rest);
    reordered
}

impl<T: RowData> Table<T> {
    pub fn column_order_state(&self) -> ColumnOrderState {
        self.slice_or_default(COLUMN_ORDER)
    }

    pub fn set_column_order(&self, updater: impl Into<Updater<ColumnOrderState>>) {
        self.set_slice(COLUMN_ORDER, updater.into());
    }

    pub fn reset_column_order(&self) {
        let initial = self
            .get_initial_state()
            .get::<ColumnOrderState>(COLUMN_ORDER)
            .cloned()
            .unwrap_or_default();
        self.set_column_order(initial);
    }

    /// Leaf columns in display order, before visibility is applied.
    pub fn ordered_leaf_columns(&self) -> Result<Rc<Vec<Rc<Column<T>>>>> {
        let leaf_columns = self.all_leaf_columns()?;
        let ordering = self.has_feature(ColumnOrdering::NAME);
        let grouping = self.has_feature(ColumnGrouping::NAME);
        self.caches.ordered_columns.get(
            || {
                Ok(OrderDeps {
                    leaf_columns: ByRef::new(&leaf_columns),
                    order: SliceDep(if ordering { self.slice_value(COLUMN_ORDER) } else { None }),
                    grouping: SliceDep(if grouping { self.slice_value(GROUPING) } else { None }),
                    mode: self.opts().settings.grouped_column_mode,
                })
            },
            |deps| {
                let order = if ordering { self.column_order_state() } else { Vec::new() };
                let grouped: GroupingState = if grouping { self.grouping_state() } else { Vec::new() };
                Ok(Rc::new(order_columns(&leaf_columns, &order, &grouped, deps.mode)))
            },
        )
    }

    /// Position of a column among the visible leaf columns.
    pub fn column_index(&self, column_id: &str) -> Result<Option<usize>> {
        Ok(self
            .visible_leaf_columns()?
            .iter()
            .position(|c| c.id == column_id))
    }

    pub fn is_first_column(&self, column_id: &str) -> Result<bool> {
        Ok(self.visible_leaf_columns()?.first().map_or(false, |c| c.id == column_id))
    }

    pub fn is_last_column(&self, column_id: &str) -> Result<bool> {
        Ok(self.visible_leaf_columns()?.last().map_or(false, |c| c.id == column_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::options::TableOptions;
    use serde_json::{json, Value};

    fn table() -> Table<Value> {
        let columns = ["a", "b", "c", "d"].into_iter().map(ColumnDef::accessor).collect();
        Table::with_stock_features(TableOptions::new(vec![json!({})], columns)).unwrap()
    }

    fn ids(columns: &[Rc<Column<Value>>]) -> Vec<&str> {
        columns.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn explicit_order_then_remaining() {
        let table = table();
        table.set_column_order(vec!["c".to_string(), "zz".to_string(), "a".to_string()]);
        assert_eq!(ids(&table.ordered_leaf_columns().unwrap()), vec!["c", "a", "b", "d"]);
        assert_eq!(table.column_index("a").unwrap(), Some(1));
        assert!(table.is_first_column("c").unwrap());
        assert!(table.is_last_column("d").unwrap());
    }

    #[test]
    fn grouped_columns_move_front_or_go() {
        let table = table();
        table.set_grouping(vec!["d".to_string(), "b".to_string()]);
        assert_eq!(ids(&table.ordered_leaf_columns().unwrap()), vec!["d", "b", "a", "c"]);

        table.set_options(|mut o| {
            o.settings.grouped_column_mode = GroupedColumnMode::Remove;
            o
        });
        assert_eq!(ids(&table.ordered_leaf_columns().unwrap()), vec!["a", "c"]);

        table.set_options(|mut o| {
            o.settings.grouped_column_mode = GroupedColumnMode::None;
            o
        });
        assert_eq!(ids(&table.ordered_leaf_columns().unwrap()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn ordered_columns_are_memoized() {
        let table = table();
        let first = table.ordered_leaf_columns().unwrap();
        assert!(Rc::ptr_eq(&first, &table.ordered_leaf_columns().unwrap()));
        table.reset_column_order();
        assert_eq!(ids(&table.ordered_leaf_columns().unwrap()), vec!["a", "b", "c", "d"]);
    }
}
