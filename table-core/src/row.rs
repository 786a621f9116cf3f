//! FILENAME: table-core/src/row.rs
//! PURPOSE: Row and cell entities.
//! CONTEXT: A `Row` wraps one record together with its position in the row
//! tree. Values are read lazily through the column accessors and cached on
//! the row. Pipeline stages never mutate a row; a stage that needs different
//! sub-rows or depth makes a copy that shares the record and value cache
//! contents.

use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::rc::{Rc, Weak};
use rustc_hash::FxHashMap;
use value::CellValue;
use crate::error::{Result, TableError};
use crate::extensions::Extensions;
use crate::graph::EntityGraph;
use crate::memo::Memo;

// ============================================================================
// ROW DATA
// ============================================================================

/// A record the table can read column values from.
pub trait RowData: Clone + 'static {
    /// Value of a named field, or `None` when the record has no such field.
    fn field(&self, key: &str) -> Option<CellValue>;
}

/// Converts a JSON scalar into a cell value. Arrays and objects render as
/// their JSON text.
pub fn json_to_cell(value: &serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Empty,
        serde_json::Value::Bool(b) => CellValue::Boolean(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Empty, CellValue::Number),
        serde_json::Value::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

impl RowData for serde_json::Value {
    /// Dotted keys walk nested objects: `"name.first"`.
    fn field(&self, key: &str) -> Option<CellValue> {
        if let Some(direct) = self.get(key) {
            return Some(json_to_cell(direct));
        }
        let mut current = self;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(json_to_cell(current))
    }
}

impl RowData for BTreeMap<String, CellValue> {
    fn field(&self, key: &str) -> Option<CellValue> {
        self.get(key).cloned()
    }
}

impl<S: BuildHasher + Clone + 'static> RowData for HashMap<String, CellValue, S> {
    fn field(&self, key: &str) -> Option<CellValue> {
        self.get(key).cloned()
    }
}

// ============================================================================
// ROW
// ============================================================================

pub struct Row<T: RowData> {
    pub id: String,
    /// Position among the parent's children (or among top-level records).
    pub index: usize,
    pub depth: usize,
    pub original: Rc<T>,
    pub parent_id: Option<String>,
    pub sub_rows: Vec<Rc<Row<T>>>,
    /// Set on group rows: the column this row groups by and its value.
    pub grouping_column_id: Option<String>,
    pub grouping_value: Option<CellValue>,
    pub extensions: Extensions,
    group_leaf_rows: Vec<Rc<Row<T>>>,
    parent: OnceCell<Weak<Row<T>>>,
    graph: Rc<EntityGraph<T>>,
    values: RefCell<FxHashMap<String, CellValue>>,
    cells: Memo<(), Rc<Vec<Rc<Cell>>>>,
}

/// Everything needed to create a row.
pub struct RowInit<T: RowData> {
    pub id: String,
    pub original: Rc<T>,
    pub index: usize,
    pub depth: usize,
    pub parent_id: Option<String>,
    pub sub_rows: Vec<Rc<Row<T>>>,
}

impl<T: RowData> Row<T> {
    pub(crate) fn new(graph: &Rc<EntityGraph<T>>, init: RowInit<T>) -> Self {
        Row {
            id: init.id,
            index: init.index,
            depth: init.depth,
            original: init.original,
            parent_id: init.parent_id,
            sub_rows: init.sub_rows,
            grouping_column_id: None,
            grouping_value: None,
            extensions: Extensions::new(),
            group_leaf_rows: Vec::new(),
            parent: OnceCell::new(),
            graph: Rc::clone(graph),
            values: RefCell::new(FxHashMap::default()),
            cells: Memo::new("row.all_cells"),
        }
    }

    /// A group row. Its values are the grouping value plus precomputed
    /// aggregates; any other column reads as empty.
    pub(crate) fn new_group(
        graph: &Rc<EntityGraph<T>>,
        init: RowInit<T>,
        grouping_column_id: &str,
        grouping_value: CellValue,
        leaf_rows: Vec<Rc<Row<T>>>,
        values: FxHashMap<String, CellValue>,
    ) -> Self {
        let mut row = Row::new(graph, init);
        row.grouping_column_id = Some(grouping_column_id.to_string());
        row.grouping_value = Some(grouping_value);
        row.group_leaf_rows = leaf_rows;
        row.values = RefCell::new(values);
        row
    }

    /// A copy of this row with different children and depth. The record,
    /// cached values and extensions carry over; the parent link is set when
    /// the copy's parent is shared.
    pub(crate) fn with_sub_rows(&self, sub_rows: Vec<Rc<Row<T>>>, depth: usize) -> Row<T> {
        Row {
            id: self.id.clone(),
            index: self.index,
            depth,
            original: Rc::clone(&self.original),
            parent_id: self.parent_id.clone(),
            sub_rows,
            grouping_column_id: self.grouping_column_id.clone(),
            grouping_value: self.grouping_value.clone(),
            extensions: self.extensions.clone(),
            group_leaf_rows: self.group_leaf_rows.clone(),
            parent: OnceCell::new(),
            graph: Rc::clone(&self.graph),
            values: RefCell::new(self.values.borrow().clone()),
            cells: Memo::new("row.all_cells"),
        }
    }

    /// Moves the row under another parent. The parent link is set again when
    /// the new parent is shared.
    pub(crate) fn reparent(&mut self, parent_id: Option<String>) {
        self.parent_id = parent_id;
        self.parent = OnceCell::new();
    }

    /// Shares the row and points every child's parent link at it, unless
    /// the child is already linked.
    pub(crate) fn into_shared(self) -> Rc<Self> {
        let row = Rc::new(self);
        for child in &row.sub_rows {
            let _ = child.parent.set(Rc::downgrade(&row));
        }
        row
    }

    pub(crate) fn graph(&self) -> &Rc<EntityGraph<T>> {
        &self.graph
    }

    pub fn is_grouped(&self) -> bool {
        self.grouping_column_id.is_some()
    }

    pub fn has_sub_rows(&self) -> bool {
        !self.sub_rows.is_empty()
    }

    /// The row this one was created under, while that row is alive.
    ///
    /// A row reused unchanged by a later stage keeps the link to the parent
    /// it was first shared under, which may be an earlier stage's copy with
    /// different sub-rows. Use [`Table::row_parent_rows`] for the ancestors
    /// in the current row model.
    ///
    /// [`Table::row_parent_rows`]: crate::Table::row_parent_rows
    pub fn parent_row(&self) -> Option<Rc<Row<T>>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    /// Value for a column, read through its accessor on first use.
    pub fn get_value(&self, column_id: &str) -> Result<CellValue> {
        if let Some(value) = self.values.borrow().get(column_id) {
            return Ok(value.clone());
        }
        let column = self
            .graph
            .column(column_id)
            .ok_or_else(|| TableError::ColumnNotFound(column_id.to_string()))?;
        if self.is_grouped() {
            return Ok(CellValue::Empty);
        }
        let value = column
            .read_value(&self.original, self.index)
            .map_err(|e| TableError::Accessor {
                column: column_id.to_string(),
                row: self.id.clone(),
                message: e.message,
            })?;
        self.values
            .borrow_mut()
            .insert(column_id.to_string(), value.clone());
        Ok(value)
    }

    /// Leaf records under this row: a group row's grouped rows, otherwise
    /// every descendant depth-first.
    pub fn leaf_rows(&self) -> Vec<Rc<Row<T>>> {
        if self.is_grouped() {
            return self.group_leaf_rows.clone();
        }
        let mut out = Vec::new();
        collect_descendants(&self.sub_rows, &mut out);
        out
    }

    /// One cell per leaf column, in declaration order. Built once per row.
    pub fn all_cells(&self) -> Result<Rc<Vec<Rc<Cell>>>> {
        self.cells
            .get(|| Ok(()), |_| self.graph.build_cells(self).map(Rc::new))
    }

    pub fn cell(&self, column_id: &str) -> Result<Rc<Cell>> {
        self.all_cells()?
            .iter()
            .find(|cell| cell.column_id == column_id)
            .cloned()
            .ok_or_else(|| TableError::ColumnNotFound(column_id.to_string()))
    }
}

fn collect_descendants<T: RowData>(rows: &[Rc<Row<T>>], out: &mut Vec<Rc<Row<T>>>) {
    for row in rows {
        out.push(Rc::clone(row));
        collect_descendants(&row.sub_rows, out);
    }
}

impl<T: RowData> fmt::Debug for Row<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("depth", &self.depth)
            .field("parent_id", &self.parent_id)
            .field("sub_rows", &self.sub_rows.len())
            .field("grouping_column_id", &self.grouping_column_id)
            .finish()
    }
}

// ============================================================================
// CELL
// ============================================================================

/// One row/column intersection.
#[derive(Debug, Clone)]
pub struct Cell {
    pub id: String,
    pub row_id: String,
    pub column_id: String,
    pub value: CellValue,
    pub extensions: Extensions,
}

impl Cell {
    pub fn new(row_id: &str, column_id: &str, value: CellValue) -> Self {
        Cell {
            id: format!("{}_{}", row_id, column_id),
            row_id: row_id.to_string(),
            column_id: column_id.to_string(),
            value,
            extensions: Extensions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_field_lookup() {
        let record = json!({ "name": { "first": "Ada" }, "age": 36, "tags": ["x"], "gone": null });
        assert_eq!(record.field("name.first"), Some(CellValue::from("Ada")));
        assert_eq!(record.field("age"), Some(CellValue::Number(36.0)));
        assert_eq!(record.field("tags"), Some(CellValue::from("[\"x\"]")));
        assert_eq!(record.field("gone"), Some(CellValue::Empty));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn map_rows() {
        let mut record = BTreeMap::new();
        record.insert("v".to_string(), CellValue::Number(2.0));
        assert_eq!(record.field("v"), Some(CellValue::Number(2.0)));
        assert_eq!(record.field("w"), None);
    }

    #[test]
    fn cell_id_joins_row_and_column() {
        let cell = Cell::new("3", "age", CellValue::Number(1.0));
        assert_eq!(cell.id, "3_age");
    }
}
