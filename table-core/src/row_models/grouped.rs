//! FILENAME: table-core/src/row_models/grouped.rs
//! Grouped row model.
//!
//! Rows are partitioned by the first grouped column's value, then each
//! partition by the next grouped column, and so on. Rows are bucketed by the
//! display text of their value, so `1` and `"1"` (or empty and `""`) share a
//! group, which takes the first row's value. Group ids are `column:text`,
//! nested as `parent>column:text`. Groups appear in the
//! order their first row appears in the input, so a preceding sort decides
//! group order as well as row order within groups.

use std::rc::Rc;
use rustc_hash::FxHashMap;
use value::CellValue;
use crate::error::Result;
use crate::features::column_grouping::{ColumnGrouping, GROUPING};
use crate::fns::AggregationFn;
use crate::graph::EntityGraph;
use crate::memo::ByRef;
use crate::row::{Row, RowData, RowInit};
use crate::row_model::RowModel;
use crate::state::SliceDep;
use crate::table::Table;

pub(crate) struct GroupedDeps<T: RowData> {
    input: ByRef<RowModel<T>>,
    grouping: SliceDep,
    manual: bool,
}

impl<T: RowData> PartialEq for GroupedDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input && self.grouping == other.grouping && self.manual == other.manual
    }
}

impl<T: RowData> Table<T> {
    pub fn pre_grouped_row_model(&self) -> Result<Rc<RowModel<T>>> {
        self.sorted_row_model()
    }

    pub fn grouped_row_model(&self) -> Result<Rc<RowModel<T>>> {
        let input = self.pre_grouped_row_model()?;
        if !self.has_feature(ColumnGrouping::NAME) {
            return Ok(input);
        }
        self.caches.grouped.get(
            || {
                Ok(GroupedDeps {
                    input: ByRef::new(&input),
                    grouping: SliceDep(self.slice_value(GROUPING)),
                    manual: self.opts().settings.manual_grouping,
                })
            },
            |deps| self.group_row_model(&input, deps.manual),
        )
    }

    fn group_row_model(&self, input: &Rc<RowModel<T>>, manual: bool) -> Result<Rc<RowModel<T>>> {
        if manual || input.rows.is_empty() {
            return Ok(Rc::clone(input));
        }
        let graph = self.entity_graph()?;
        let grouping: Vec<String> = self
            .grouping_state()
            .into_iter()
            .filter(|id| graph.column(id).is_some())
            .collect();
        if grouping.is_empty() {
            return Ok(Rc::clone(input));
        }

        let mut aggregations = Vec::new();
        for column in graph.leaf_columns().iter() {
            if grouping.contains(&column.id) {
                continue;
            }
            if let Some(aggregation_fn) = self.column_aggregation_fn(&column.id)? {
                aggregations.push((column.id.clone(), aggregation_fn));
            }
        }

        let grouper = Grouper {
            graph: &graph,
            grouping: &grouping,
            aggregations: &aggregations,
        };
        let rows = grouper.group(&input.rows, 0, None)?;
        Ok(Rc::new(RowModel::from_rows(rows)))
    }
}

struct Grouper<'a, T: RowData> {
    graph: &'a Rc<EntityGraph<T>>,
    grouping: &'a [String],
    aggregations: &'a [(String, AggregationFn)],
}

impl<T: RowData> Grouper<'_, T> {
    fn group(&self, rows: &[Rc<Row<T>>], depth: usize, parent_id: Option<&str>) -> Result<Vec<Rc<Row<T>>>> {
        let column_id = match self.grouping.get(depth) {
            Some(column_id) => column_id,
            None => return Ok(rows.iter().map(|row| relevel(row, depth, parent_id)).collect()),
        };

        let mut buckets: Vec<(String, CellValue, Vec<Rc<Row<T>>>)> = Vec::new();
        let mut positions: FxHashMap<String, usize> = FxHashMap::default();
        for row in rows {
            let value = row.get_value(column_id)?;
            let key = value.to_string();
            match positions.get(&key) {
                Some(&i) => buckets[i].2.push(Rc::clone(row)),
                None => {
                    positions.insert(key.clone(), buckets.len());
                    buckets.push((key, value, vec![Rc::clone(row)]));
                }
            }
        }

        let mut groups = Vec::with_capacity(buckets.len());
        for (index, (key, value, grouped_rows)) in buckets.into_iter().enumerate() {
            let local_id = format!("{}:{}", column_id, key);
            let id = match parent_id {
                Some(parent) => format!("{}>{}", parent, local_id),
                None => local_id,
            };
            let sub_rows = self.group(&grouped_rows, depth + 1, Some(&id))?;
            let values = self.group_values(&grouped_rows, &sub_rows)?;
            let init = RowInit {
                id,
                original: Rc::clone(&grouped_rows[0].original),
                index,
                depth,
                parent_id: parent_id.map(str::to_string),
                sub_rows,
            };
            let row = Row::new_group(self.graph, init, column_id, value, grouped_rows, values);
            groups.push(self.graph.finish_row(row)?);
        }
        Ok(groups)
    }

    /// Grouped columns take the first row's value; aggregated columns get
    /// their aggregate. Every other column stays empty on the group row.
    fn group_values(
        &self,
        grouped_rows: &[Rc<Row<T>>],
        sub_rows: &[Rc<Row<T>>],
    ) -> Result<FxHashMap<String, CellValue>> {
        let mut values = FxHashMap::default();
        for column_id in self.grouping {
            values.insert(column_id.clone(), grouped_rows[0].get_value(column_id)?);
        }
        for (column_id, aggregation_fn) in self.aggregations {
            let leaf_values = column_values(grouped_rows, column_id)?;
            let child_values = column_values(sub_rows, column_id)?;
            values.insert(column_id.clone(), aggregation_fn.aggregate(&leaf_values, &child_values));
        }
        Ok(values)
    }
}

fn column_values<T: RowData>(rows: &[Rc<Row<T>>], column_id: &str) -> Result<Vec<CellValue>> {
    rows.iter().map(|row| row.get_value(column_id)).collect()
}

/// Copies a grouped leaf (and its tree children) to its depth under the group.
fn relevel<T: RowData>(row: &Rc<Row<T>>, depth: usize, parent_id: Option<&str>) -> Rc<Row<T>> {
    let children = row
        .sub_rows
        .iter()
        .map(|child| relevel(child, depth + 1, Some(&row.id)))
        .collect();
    let mut copy = row.with_sub_rows(children, depth);
    copy.reparent(parent_id.map(str::to_string));
    copy.into_shared()
}
