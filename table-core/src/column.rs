//! FILENAME: table-core/src/column.rs
//! PURPOSE: Column definitions (user input) and resolved column entities.
//! CONTEXT: A `ColumnDef` is what the application writes: how to read a
//! value from a record plus per-column feature switches. The table turns
//! each definition into a `Column` with a stable id, depth and parent link;
//! feature construct hooks then attach their precomputed data (resolved
//! processing functions) to the column's extensions.

use std::fmt;
use std::rc::Rc;
use serde::{Deserialize, Serialize};
use value::CellValue;
use crate::error::AccessorError;
use crate::extensions::Extensions;
use crate::row::RowData;

pub type AccessorFn<T> = Rc<dyn Fn(&T, usize) -> Result<CellValue, AccessorError>>;

/// How a column reads its value from a record.
pub enum Accessor<T> {
    /// Field lookup through `RowData::field`. Dotted keys reach nested fields.
    Key(String),
    /// Arbitrary extraction from `(record, index)`. May fail on malformed input.
    Fn(AccessorFn<T>),
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Key(key) => Accessor::Key(key.clone()),
            Accessor::Fn(f) => Accessor::Fn(Rc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Accessor::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// Placement of empty values when sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortUndefined {
    /// Always before defined values, whatever the direction.
    First,
    /// Always after defined values, whatever the direction.
    Last,
    /// Treated as smaller than any value; flips with direction.
    Lower,
    /// Treated as larger than any value; flips with direction.
    #[default]
    Higher,
    /// No special handling; the sort function sees empty values.
    Ignore,
}

// ============================================================================
// COLUMN DEFINITION
// ============================================================================

pub struct ColumnDef<T> {
    pub id: Option<String>,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub accessor: Option<Accessor<T>>,
    /// Child definitions; a definition with children is a group column.
    pub columns: Vec<ColumnDef<T>>,

    // -- sorting --
    /// Sort function name; `None` means "auto".
    pub sort_fn: Option<String>,
    pub sort_desc_first: Option<bool>,
    pub sort_undefined: SortUndefined,
    pub invert_sorting: bool,
    pub enable_sorting: Option<bool>,
    pub enable_multi_sort: Option<bool>,

    // -- filtering --
    /// Filter function name; `None` means "auto".
    pub filter_fn: Option<String>,
    pub enable_column_filter: Option<bool>,
    pub enable_global_filter: Option<bool>,

    // -- grouping --
    /// Aggregation function name; `None` leaves group cells empty.
    pub aggregation_fn: Option<String>,
    pub enable_grouping: Option<bool>,

    // -- visibility --
    pub enable_hiding: Option<bool>,

    /// Free-form application data.
    pub meta: serde_json::Value,
}

impl<T> ColumnDef<T> {
    fn empty() -> Self {
        ColumnDef {
            id: None,
            header: None,
            footer: None,
            accessor: None,
            columns: Vec::new(),
            sort_fn: None,
            sort_desc_first: None,
            sort_undefined: SortUndefined::default(),
            invert_sorting: false,
            enable_sorting: None,
            enable_multi_sort: None,
            filter_fn: None,
            enable_column_filter: None,
            enable_global_filter: None,
            aggregation_fn: None,
            enable_grouping: None,
            enable_hiding: None,
            meta: serde_json::Value::Null,
        }
    }

    /// A column reading `key` from each record. The key doubles as the id.
    pub fn accessor(key: impl Into<String>) -> Self {
        ColumnDef {
            accessor: Some(Accessor::Key(key.into())),
            ..ColumnDef::empty()
        }
    }

    /// A column computing its value with `f`. Needs an explicit id.
    pub fn accessor_fn(
        id: impl Into<String>,
        f: impl Fn(&T, usize) -> Result<CellValue, AccessorError> + 'static,
    ) -> Self {
        ColumnDef {
            id: Some(id.into()),
            accessor: Some(Accessor::Fn(Rc::new(f))),
            ..ColumnDef::empty()
        }
    }

    /// A column with no value of its own (row actions, expanders).
    pub fn display(id: impl Into<String>) -> Self {
        ColumnDef {
            id: Some(id.into()),
            ..ColumnDef::empty()
        }
    }

    /// A header spanning child columns.
    pub fn group(header: impl Into<String>, columns: Vec<ColumnDef<T>>) -> Self {
        ColumnDef {
            header: Some(header.into()),
            columns,
            ..ColumnDef::empty()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn sort_fn(mut self, name: impl Into<String>) -> Self {
        self.sort_fn = Some(name.into());
        self
    }

    pub fn sort_desc_first(mut self, desc_first: bool) -> Self {
        self.sort_desc_first = Some(desc_first);
        self
    }

    pub fn sort_undefined(mut self, placement: SortUndefined) -> Self {
        self.sort_undefined = placement;
        self
    }

    pub fn invert_sorting(mut self, invert: bool) -> Self {
        self.invert_sorting = invert;
        self
    }

    pub fn enable_sorting(mut self, enable: bool) -> Self {
        self.enable_sorting = Some(enable);
        self
    }

    pub fn enable_multi_sort(mut self, enable: bool) -> Self {
        self.enable_multi_sort = Some(enable);
        self
    }

    pub fn filter_fn(mut self, name: impl Into<String>) -> Self {
        self.filter_fn = Some(name.into());
        self
    }

    pub fn enable_column_filter(mut self, enable: bool) -> Self {
        self.enable_column_filter = Some(enable);
        self
    }

    pub fn enable_global_filter(mut self, enable: bool) -> Self {
        self.enable_global_filter = Some(enable);
        self
    }

    pub fn aggregation_fn(mut self, name: impl Into<String>) -> Self {
        self.aggregation_fn = Some(name.into());
        self
    }

    pub fn enable_grouping(mut self, enable: bool) -> Self {
        self.enable_grouping = Some(enable);
        self
    }

    pub fn enable_hiding(mut self, enable: bool) -> Self {
        self.enable_hiding = Some(enable);
        self
    }

    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    /// The id this definition resolves to, if one can be derived.
    /// Dots in accessor keys become underscores.
    pub fn resolved_id(&self) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(id.clone());
        }
        if let Some(Accessor::Key(key)) = &self.accessor {
            return Some(key.replace('.', "_"));
        }
        self.header.clone()
    }
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        ColumnDef {
            id: self.id.clone(),
            header: self.header.clone(),
            footer: self.footer.clone(),
            accessor: self.accessor.clone(),
            columns: self.columns.clone(),
            sort_fn: self.sort_fn.clone(),
            sort_desc_first: self.sort_desc_first,
            sort_undefined: self.sort_undefined,
            invert_sorting: self.invert_sorting,
            enable_sorting: self.enable_sorting,
            enable_multi_sort: self.enable_multi_sort,
            filter_fn: self.filter_fn.clone(),
            enable_column_filter: self.enable_column_filter,
            enable_global_filter: self.enable_global_filter,
            aggregation_fn: self.aggregation_fn.clone(),
            enable_grouping: self.enable_grouping,
            enable_hiding: self.enable_hiding,
            meta: self.meta.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.resolved_id())
            .field("accessor", &self.accessor)
            .field("columns", &self.columns.len())
            .finish()
    }
}

// ============================================================================
// COLUMN
// ============================================================================

/// A resolved column. Shared by every row, cell and header that refers to it.
pub struct Column<T> {
    pub id: String,
    pub depth: usize,
    pub parent_id: Option<String>,
    pub def: ColumnDef<T>,
    pub columns: Vec<Rc<Column<T>>>,
    pub extensions: Extensions,
}

impl<T: RowData> Column<T> {
    pub fn is_leaf(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has_accessor(&self) -> bool {
        self.def.accessor.is_some()
    }

    pub fn header_text(&self) -> &str {
        self.def.header.as_deref().unwrap_or(&self.id)
    }

    /// Reads this column's value from a record. Columns without an accessor
    /// read as empty.
    pub fn read_value(&self, original: &T, index: usize) -> Result<CellValue, AccessorError> {
        match &self.def.accessor {
            Some(Accessor::Key(key)) => Ok(original.field(key).unwrap_or(CellValue::Empty)),
            Some(Accessor::Fn(f)) => f(original, index),
            None => Ok(CellValue::Empty),
        }
    }

    /// Leaf columns under this one, depth-first. A leaf returns itself.
    pub fn leaf_columns(self: &Rc<Self>) -> Vec<Rc<Column<T>>> {
        if self.is_leaf() {
            return vec![Rc::clone(self)];
        }
        self.columns.iter().flat_map(|c| c.leaf_columns()).collect()
    }

    /// This column and every descendant, depth-first.
    pub fn flat_columns(self: &Rc<Self>) -> Vec<Rc<Column<T>>> {
        let mut out = vec![Rc::clone(self)];
        for child in &self.columns {
            out.extend(child.flat_columns());
        }
        out
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("parent_id", &self.parent_id)
            .field("columns", &self.columns.iter().map(|c| &c.id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn id_derivation() {
        assert_eq!(ColumnDef::<Value>::accessor("name.first").resolved_id().as_deref(), Some("name_first"));
        assert_eq!(ColumnDef::<Value>::accessor("age").id("years").resolved_id().as_deref(), Some("years"));
        assert_eq!(ColumnDef::<Value>::group("Info", vec![]).resolved_id().as_deref(), Some("Info"));
    }

    #[test]
    fn key_accessor_reads_nested_fields() {
        let column = Column {
            id: "name_first".to_string(),
            depth: 0,
            parent_id: None,
            def: ColumnDef::<Value>::accessor("name.first"),
            columns: vec![],
            extensions: Extensions::new(),
        };
        let record = json!({ "name": { "first": "Ada" } });
        assert_eq!(column.read_value(&record, 0).unwrap(), CellValue::from("Ada"));
        assert_eq!(column.read_value(&json!({}), 0).unwrap(), CellValue::Empty);
    }

    #[test]
    fn accessor_fn_errors_surface() {
        let def = ColumnDef::<Value>::accessor_fn("total", |row, _| {
            row.get("qty")
                .and_then(Value::as_f64)
                .map(CellValue::Number)
                .ok_or_else(|| AccessorError::new("qty missing"))
        });
        let column = Column {
            id: "total".to_string(),
            depth: 0,
            parent_id: None,
            def,
            columns: vec![],
            extensions: Extensions::new(),
        };
        assert!(column.read_value(&json!({ "qty": 3 }), 0).is_ok());
        assert_eq!(column.read_value(&json!({}), 0).unwrap_err().message, "qty missing");
    }
}
