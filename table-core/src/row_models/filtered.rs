//! FILENAME: table-core/src/row_models/filtered.rs
//! Filtered row model.
//!
//! Every active column filter must pass; when a global filter is set, at
//! least one globally filterable column must pass it. For tree data the
//! default walk is leaf-first: a row survives if it passes or any of its
//! descendants survive. The root-first walk drops a failing row's subtree.

use std::rc::Rc;
use crate::error::Result;
use crate::features::column_filtering::{ColumnFiltering, COLUMN_FILTERS, GLOBAL_FILTER};
use crate::fns::{FilterFn, FilterValue};
use crate::memo::ByRef;
use crate::row::{Row, RowData};
use crate::row_model::RowModel;
use crate::state::SliceDep;
use crate::table::Table;

pub(crate) struct FilteredDeps<T: RowData> {
    input: ByRef<RowModel<T>>,
    column_filters: SliceDep,
    global_filter: SliceDep,
    manual: bool,
    from_leaf_rows: bool,
    max_depth: Option<usize>,
    global_filter_fn: String,
    global_enabled: bool,
}

impl<T: RowData> PartialEq for FilteredDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input
            && self.column_filters == other.column_filters
            && self.global_filter == other.global_filter
            && self.manual == other.manual
            && self.from_leaf_rows == other.from_leaf_rows
            && self.max_depth == other.max_depth
            && self.global_filter_fn == other.global_filter_fn
            && self.global_enabled == other.global_enabled
    }
}

/// One column/filter-value pair, with the value already normalized.
struct ResolvedFilter {
    column_id: String,
    filter_fn: FilterFn,
    value: FilterValue,
}

struct RowFilter {
    column_filters: Vec<ResolvedFilter>,
    global_filters: Vec<ResolvedFilter>,
}

impl RowFilter {
    fn is_empty(&self) -> bool {
        self.column_filters.is_empty() && self.global_filters.is_empty()
    }

    fn passes<T: RowData>(&self, row: &Row<T>) -> Result<bool> {
        for filter in &self.column_filters {
            let value = row.get_value(&filter.column_id)?;
            if !filter.filter_fn.test(&value, &filter.value) {
                return Ok(false);
            }
        }
        if self.global_filters.is_empty() {
            return Ok(true);
        }
        for filter in &self.global_filters {
            let value = row.get_value(&filter.column_id)?;
            if filter.filter_fn.test(&value, &filter.value) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<T: RowData> Table<T> {
    pub fn pre_filtered_row_model(&self) -> Result<Rc<RowModel<T>>> {
        self.core_row_model()
    }

    pub fn filtered_row_model(&self) -> Result<Rc<RowModel<T>>> {
        let input = self.pre_filtered_row_model()?;
        if !self.has_feature(ColumnFiltering::NAME) {
            return Ok(input);
        }
        self.caches.filtered.get(
            || {
                let settings = self.settings();
                Ok(FilteredDeps {
                    input: ByRef::new(&input),
                    column_filters: SliceDep(self.slice_value(COLUMN_FILTERS)),
                    global_filter: SliceDep(self.slice_value(GLOBAL_FILTER)),
                    manual: settings.manual_filtering,
                    from_leaf_rows: settings.filter_from_leaf_rows,
                    max_depth: settings.max_leaf_row_filter_depth,
                    global_filter_fn: settings.global_filter_fn,
                    global_enabled: !self.slice_options(GLOBAL_FILTER).is_disabled(),
                })
            },
            |deps| self.filter_row_model(&input, deps),
        )
    }

    fn filter_row_model(&self, input: &Rc<RowModel<T>>, deps: &FilteredDeps<T>) -> Result<Rc<RowModel<T>>> {
        if deps.manual || input.rows.is_empty() {
            return Ok(Rc::clone(input));
        }
        let filter = self.resolve_row_filter()?;
        if filter.is_empty() {
            return Ok(Rc::clone(input));
        }

        let walk = FilterWalk {
            filter: &filter,
            max_depth: deps.max_depth.unwrap_or(usize::MAX),
        };
        let rows = if deps.from_leaf_rows {
            walk.from_leafs(&input.rows, 0)?
        } else {
            walk.from_root(&input.rows, 0)?
        };
        Ok(Rc::new(RowModel::from_rows(rows)))
    }

    fn resolve_row_filter(&self) -> Result<RowFilter> {
        let graph = self.entity_graph()?;

        let mut column_filters = Vec::new();
        for entry in self.column_filters_state() {
            if graph.column(&entry.id).is_none() {
                continue;
            }
            let filter_fn = self.column_filter_fn(&entry.id)?;
            let value = filter_fn.resolve_filter_value(&entry.value);
            column_filters.push(ResolvedFilter {
                column_id: entry.id,
                filter_fn,
                value,
            });
        }

        let mut global_filters = Vec::new();
        if let Some(global) = self.global_filter_state().filter(|value| !value.is_falsey()) {
            let filter_fn = self.global_filter_fn()?;
            let value = filter_fn.resolve_filter_value(&global);
            for column in graph.leaf_columns().iter() {
                if self.column_can_global_filter(&column.id)? {
                    global_filters.push(ResolvedFilter {
                        column_id: column.id.clone(),
                        filter_fn: filter_fn.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        Ok(RowFilter {
            column_filters,
            global_filters,
        })
    }
}

struct FilterWalk<'a> {
    filter: &'a RowFilter,
    max_depth: usize,
}

impl FilterWalk<'_> {
    /// Keeps a row when it passes or when any descendant is kept.
    fn from_leafs<T: RowData>(&self, rows: &[Rc<Row<T>>], depth: usize) -> Result<Vec<Rc<Row<T>>>> {
        let mut kept = Vec::new();
        for row in rows {
            if row.has_sub_rows() && depth < self.max_depth {
                let children = self.from_leafs(&row.sub_rows, depth + 1)?;
                if !children.is_empty() || self.filter.passes(row)? {
                    kept.push(with_children(row, children));
                }
            } else if self.filter.passes(row)? {
                kept.push(Rc::clone(row));
            }
        }
        Ok(kept)
    }

    /// Keeps a row only when it passes; its children are then filtered.
    fn from_root<T: RowData>(&self, rows: &[Rc<Row<T>>], depth: usize) -> Result<Vec<Rc<Row<T>>>> {
        let mut kept = Vec::new();
        for row in rows {
            if !self.filter.passes(row)? {
                continue;
            }
            if row.has_sub_rows() && depth < self.max_depth {
                let children = self.from_root(&row.sub_rows, depth + 1)?;
                kept.push(with_children(row, children));
            } else {
                kept.push(Rc::clone(row));
            }
        }
        Ok(kept)
    }
}

/// Reuses the row when its children are unchanged, else copies it.
fn with_children<T: RowData>(row: &Rc<Row<T>>, children: Vec<Rc<Row<T>>>) -> Rc<Row<T>> {
    let unchanged = children.len() == row.sub_rows.len()
        && children.iter().zip(&row.sub_rows).all(|(a, b)| Rc::ptr_eq(a, b));
    if unchanged {
        Rc::clone(row)
    } else {
        row.with_sub_rows(children, row.depth).into_shared()
    }
}
