//! FILENAME: table-core/src/row_model.rs
//! PURPOSE: The row model snapshot and the core (base) row model builder.

use std::fmt;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graph::EntityGraph;
use crate::options::{GetRowIdFn, GetSubRowsFn};
use crate::row::{Row, RowData, RowInit};

/// An immutable snapshot produced by one pipeline stage.
pub struct RowModel<T: RowData> {
    /// Top-level rows, in stage order.
    pub rows: Vec<Rc<Row<T>>>,
    /// Every row reachable through `rows` and their sub-rows, depth-first.
    pub flat_rows: Vec<Rc<Row<T>>>,
    pub rows_by_id: FxHashMap<String, Rc<Row<T>>>,
}

impl<T: RowData> RowModel<T> {
    /// Builds the flat list and the id index from a row tree.
    pub fn from_rows(rows: Vec<Rc<Row<T>>>) -> Self {
        let mut flat_rows = Vec::with_capacity(rows.len());
        let mut rows_by_id = FxHashMap::default();
        flatten_into(&rows, &mut flat_rows, &mut rows_by_id);
        RowModel {
            rows,
            flat_rows,
            rows_by_id,
        }
    }

    pub fn empty() -> Self {
        RowModel::from_rows(Vec::new())
    }

    pub fn row(&self, id: &str) -> Option<&Rc<Row<T>>> {
        self.rows_by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ids of the top-level rows, in order.
    pub fn row_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }
}

fn flatten_into<T: RowData>(
    rows: &[Rc<Row<T>>],
    flat_rows: &mut Vec<Rc<Row<T>>>,
    rows_by_id: &mut FxHashMap<String, Rc<Row<T>>>,
) {
    for row in rows {
        if rows_by_id.insert(row.id.clone(), Rc::clone(row)).is_none() {
            flat_rows.push(Rc::clone(row));
        }
        flatten_into(&row.sub_rows, flat_rows, rows_by_id);
    }
}

impl<T: RowData> fmt::Debug for RowModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowModel")
            .field("rows", &self.row_ids())
            .field("flat_rows", &self.flat_rows.len())
            .finish()
    }
}

// ============================================================================
// CORE ROW MODEL
// ============================================================================

/// Wraps every record (and, for tree data, every nested record) as a row.
pub(crate) fn build_core_row_model<T: RowData>(
    graph: &Rc<EntityGraph<T>>,
    data: &[T],
    get_row_id: Option<&GetRowIdFn<T>>,
    get_sub_rows: Option<&GetSubRowsFn<T>>,
) -> Result<RowModel<T>> {
    let mut builder = CoreBuilder {
        graph,
        get_row_id,
        get_sub_rows,
        flat_rows: Vec::with_capacity(data.len()),
        rows_by_id: FxHashMap::default(),
    };
    let records: Vec<Rc<T>> = data.iter().map(|r| Rc::new(r.clone())).collect();
    let rows = builder.access_rows(records, 0, None)?;
    Ok(RowModel {
        rows,
        flat_rows: builder.flat_rows,
        rows_by_id: builder.rows_by_id,
    })
}

struct CoreBuilder<'a, T: RowData> {
    graph: &'a Rc<EntityGraph<T>>,
    get_row_id: Option<&'a GetRowIdFn<T>>,
    get_sub_rows: Option<&'a GetSubRowsFn<T>>,
    flat_rows: Vec<Rc<Row<T>>>,
    rows_by_id: FxHashMap<String, Rc<Row<T>>>,
}

impl<T: RowData> CoreBuilder<'_, T> {
    fn row_id(&self, original: &T, index: usize, parent_id: Option<&str>) -> String {
        match self.get_row_id {
            Some(f) => f(original, index, parent_id),
            None => match parent_id {
                Some(parent) => format!("{}.{}", parent, index),
                None => index.to_string(),
            },
        }
    }

    fn access_rows(
        &mut self,
        records: Vec<Rc<T>>,
        depth: usize,
        parent_id: Option<&str>,
    ) -> Result<Vec<Rc<Row<T>>>> {
        let mut rows = Vec::with_capacity(records.len());
        for (index, original) in records.into_iter().enumerate() {
            let id = self.row_id(&original, index, parent_id);

            // Reserve the parent's position in flat_rows before its children.
            let slot = self.flat_rows.len();
            let children = self
                .get_sub_rows
                .and_then(|f| f(&*original))
                .unwrap_or_default();
            let sub_rows = if children.is_empty() {
                Vec::new()
            } else {
                let nested: Vec<Rc<T>> = children.into_iter().map(Rc::new).collect();
                self.access_rows(nested, depth + 1, Some(&id))?
            };

            let row = self.graph.create_row(RowInit {
                id,
                original,
                index,
                depth,
                parent_id: parent_id.map(str::to_string),
                sub_rows,
            })?;
            self.flat_rows.insert(slot, Rc::clone(&row));
            self.rows_by_id.insert(row.id.clone(), Rc::clone(&row));
            rows.push(row);
        }
        Ok(rows)
    }
}
