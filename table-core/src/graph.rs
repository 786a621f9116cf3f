//! FILENAME: table-core/src/graph.rs
//! PURPOSE: Builds the column tree and creates rows and cells.
//! CONTEXT: The graph is a pure structural transform of the column
//! definitions. The table rebuilds it only when the definitions or the
//! processing function registries change identity. Rows and cells are
//! created through the graph so every entity passes through the registered
//! feature construct hooks exactly once.

use std::fmt;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::column::{Column, ColumnDef};
use crate::error::{Result, TableError};
use crate::extensions::Extensions;
use crate::feature::TableFeature;
use crate::fns::ProcessingFns;
use crate::row::{Cell, Row, RowData, RowInit};

pub type FeatureList<T> = Rc<[Rc<dyn TableFeature<T>>]>;

pub struct EntityGraph<T: RowData> {
    columns: Vec<Rc<Column<T>>>,
    flat_columns: Vec<Rc<Column<T>>>,
    leaf_columns: Rc<Vec<Rc<Column<T>>>>,
    by_id: FxHashMap<String, Rc<Column<T>>>,
    features: FeatureList<T>,
}

impl<T: RowData> EntityGraph<T> {
    pub fn build(defs: &[ColumnDef<T>], features: &FeatureList<T>, fns: &ProcessingFns) -> Result<Self> {
        let mut by_id = FxHashMap::default();
        let mut columns = Vec::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            let path = format!("columns[{}]", i);
            columns.push(build_column(def, 0, None, &path, features, fns, &mut by_id)?);
        }

        let flat_columns = columns.iter().flat_map(|c| c.flat_columns()).collect();
        let leaf_columns = columns.iter().flat_map(|c| c.leaf_columns()).collect();

        Ok(EntityGraph {
            columns,
            flat_columns,
            leaf_columns: Rc::new(leaf_columns),
            by_id,
            features: Rc::clone(features),
        })
    }

    /// Top-level columns.
    pub fn columns(&self) -> &[Rc<Column<T>>] {
        &self.columns
    }

    /// Every column, depth-first.
    pub fn flat_columns(&self) -> &[Rc<Column<T>>] {
        &self.flat_columns
    }

    /// Leaf columns in declaration order.
    pub fn leaf_columns(&self) -> &Rc<Vec<Rc<Column<T>>>> {
        &self.leaf_columns
    }

    pub fn column(&self, id: &str) -> Option<&Rc<Column<T>>> {
        self.by_id.get(id)
    }

    /// Creates a row and runs the row construct hooks on it.
    pub fn create_row(self: &Rc<Self>, init: RowInit<T>) -> Result<Rc<Row<T>>> {
        self.finish_row(Row::new(self, init))
    }

    /// Runs the row construct hooks on an already assembled row.
    pub(crate) fn finish_row(&self, mut row: Row<T>) -> Result<Rc<Row<T>>> {
        for feature in self.features.iter() {
            feature.construct_row(&mut row)?;
        }
        Ok(row.into_shared())
    }

    pub(crate) fn build_cells(&self, row: &Row<T>) -> Result<Vec<Rc<Cell>>> {
        let mut cells = Vec::with_capacity(self.leaf_columns.len());
        for column in self.leaf_columns.iter() {
            let mut cell = Cell::new(&row.id, &column.id, row.get_value(&column.id)?);
            for feature in self.features.iter() {
                feature.construct_cell(&mut cell, row, column)?;
            }
            cells.push(Rc::new(cell));
        }
        Ok(cells)
    }
}

fn build_column<T: RowData>(
    def: &ColumnDef<T>,
    depth: usize,
    parent_id: Option<&str>,
    path: &str,
    features: &FeatureList<T>,
    fns: &ProcessingFns,
    by_id: &mut FxHashMap<String, Rc<Column<T>>>,
) -> Result<Rc<Column<T>>> {
    let id = def
        .resolved_id()
        .ok_or_else(|| TableError::MissingColumnId(path.to_string()))?;

    let mut children = Vec::with_capacity(def.columns.len());
    for (i, child) in def.columns.iter().enumerate() {
        let child_path = format!("{}.columns[{}]", path, i);
        children.push(build_column(child, depth + 1, Some(&id), &child_path, features, fns, by_id)?);
    }

    let mut column = Column {
        id: id.clone(),
        depth,
        parent_id: parent_id.map(str::to_string),
        def: def.clone(),
        columns: children,
        extensions: Extensions::new(),
    };
    for feature in features.iter() {
        feature.construct_column(&mut column, fns)?;
    }

    if by_id.contains_key(&id) {
        return Err(TableError::DuplicateColumnId(id));
    }
    let column = Rc::new(column);
    by_id.insert(id, Rc::clone(&column));
    Ok(column)
}

impl<T: RowData> fmt::Debug for EntityGraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityGraph")
            .field("columns", &self.columns)
            .field("leaf_columns", &self.leaf_columns.iter().map(|c| &c.id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn no_features() -> FeatureList<Value> {
        Rc::from(Vec::<Rc<dyn TableFeature<Value>>>::new())
    }

    #[test]
    fn builds_tree_and_leaves() {
        let defs = vec![
            ColumnDef::group(
                "Name",
                vec![ColumnDef::accessor("first"), ColumnDef::accessor("last")],
            ),
            ColumnDef::accessor("age"),
        ];
        let graph = EntityGraph::build(&defs, &no_features(), &ProcessingFns::builtin()).unwrap();
        let leaf_ids: Vec<_> = graph.leaf_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(leaf_ids, vec!["first", "last", "age"]);
        let flat_ids: Vec<_> = graph.flat_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(flat_ids, vec!["Name", "first", "last", "age"]);
        let first = graph.column("first").unwrap();
        assert_eq!(first.depth, 1);
        assert_eq!(first.parent_id.as_deref(), Some("Name"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let defs = vec![ColumnDef::<Value>::accessor("a"), ColumnDef::accessor("a")];
        let err = EntityGraph::build(&defs, &no_features(), &ProcessingFns::builtin()).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumnId("a".to_string()));
    }

    #[test]
    fn display_group_without_header_needs_id() {
        let mut def = ColumnDef::<Value>::group("x", vec![ColumnDef::accessor("a")]);
        def.header = None;
        let err = EntityGraph::build(&[def], &no_features(), &ProcessingFns::builtin()).unwrap_err();
        assert_eq!(err, TableError::MissingColumnId("columns[0]".to_string()));
    }

    #[test]
    fn rows_read_values_lazily_and_link_parents() {
        let defs = vec![ColumnDef::<Value>::accessor("v")];
        let graph = Rc::new(EntityGraph::build(&defs, &no_features(), &ProcessingFns::builtin()).unwrap());
        let child = graph
            .create_row(RowInit {
                id: "0.0".to_string(),
                original: Rc::new(json!({ "v": 2 })),
                index: 0,
                depth: 1,
                parent_id: Some("0".to_string()),
                sub_rows: vec![],
            })
            .unwrap();
        let parent = graph
            .create_row(RowInit {
                id: "0".to_string(),
                original: Rc::new(json!({ "v": 1 })),
                index: 0,
                depth: 0,
                parent_id: None,
                sub_rows: vec![Rc::clone(&child)],
            })
            .unwrap();
        assert_eq!(child.parent_row().unwrap().id, "0");
        assert_eq!(parent.get_value("v").unwrap(), value::CellValue::Number(1.0));
        let cells = parent.all_cells().unwrap();
        assert_eq!(cells[0].id, "0_v");
        assert!(Rc::ptr_eq(&cells, &parent.all_cells().unwrap()));
        assert!(matches!(parent.get_value("nope"), Err(TableError::ColumnNotFound(_))));
    }
}
