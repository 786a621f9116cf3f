//! FILENAME: table-core/src/header.rs
//! PURPOSE: Header rows for nested column definitions.
//! CONTEXT: The bottom row holds one header per visible leaf column. Each row
//! above groups the row below under its parent columns; a header whose
//! column has no parent at that level becomes a placeholder that carries
//! the column upward so every row spans the full width.

use std::rc::Rc;
use crate::column::Column;
use crate::error::Result;
use crate::features::column_visibility::{is_visible, VisibilityState};
use crate::graph::EntityGraph;
use crate::memo::ByRef;
use crate::row::RowData;
use crate::table::Table;

/// One header cell.
pub struct Header<T: RowData> {
    pub id: String,
    pub column: Rc<Column<T>>,
    /// Row of the header group this header belongs to, top row 0.
    pub depth: usize,
    /// Position within its header group.
    pub index: usize,
    pub is_placeholder: bool,
    /// Ordinal among placeholders for the same column in this group.
    pub placeholder_id: Option<String>,
    /// Number of leaf columns spanned.
    pub col_span: usize,
    /// Indices into the next header group's `headers`.
    pub sub_headers: Vec<usize>,
}

impl<T: RowData> Clone for Header<T> {
    fn clone(&self) -> Self {
        Header {
            id: self.id.clone(),
            column: Rc::clone(&self.column),
            depth: self.depth,
            index: self.index,
            is_placeholder: self.is_placeholder,
            placeholder_id: self.placeholder_id.clone(),
            col_span: self.col_span,
            sub_headers: self.sub_headers.clone(),
        }
    }
}

impl<T: RowData> std::fmt::Debug for Header<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Header")
            .field("id", &self.id)
            .field("column", &self.column.id)
            .field("is_placeholder", &self.is_placeholder)
            .field("col_span", &self.col_span)
            .finish()
    }
}

#[derive(Debug)]
pub struct HeaderGroup<T: RowData> {
    pub id: String,
    pub depth: usize,
    pub headers: Vec<Header<T>>,
}

impl<T: RowData> Clone for HeaderGroup<T> {
    fn clone(&self) -> Self {
        HeaderGroup {
            id: self.id.clone(),
            depth: self.depth,
            headers: self.headers.clone(),
        }
    }
}

pub(crate) struct HeaderDeps<T: RowData> {
    graph: ByRef<EntityGraph<T>>,
    leaf_columns: ByRef<Vec<Rc<Column<T>>>>,
}

impl<T: RowData> PartialEq for HeaderDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph && self.leaf_columns == other.leaf_columns
    }
}

fn max_depth<T: RowData>(columns: &[Rc<Column<T>>], depth: usize, state: &VisibilityState) -> usize {
    columns
        .iter()
        .filter(|c| is_visible(c, state))
        .filter(|c| !c.is_leaf())
        .map(|c| max_depth(&c.columns, depth + 1, state))
        .fold(depth, usize::max)
}

/// Builds header rows top-down over `leaf_columns`, which are the visible
/// leaves in display order.
pub fn build_header_groups<T: RowData>(
    graph: &EntityGraph<T>,
    leaf_columns: &[Rc<Column<T>>],
    state: &VisibilityState,
) -> Vec<HeaderGroup<T>> {
    if leaf_columns.is_empty() {
        return Vec::new();
    }
    let rows = max_depth(graph.columns(), 1, state);

    let mut current: Vec<Header<T>> = leaf_columns
        .iter()
        .enumerate()
        .map(|(index, column)| Header {
            id: column.id.clone(),
            column: Rc::clone(column),
            depth: rows - 1,
            index,
            is_placeholder: false,
            placeholder_id: None,
            col_span: 1,
            sub_headers: Vec::new(),
        })
        .collect();

    let mut groups = Vec::with_capacity(rows);
    for depth in (0..rows - 1).rev() {
        let mut parents: Vec<Header<T>> = Vec::new();
        for (child_index, child) in current.iter().enumerate() {
            let parent = child
                .column
                .parent_id
                .as_deref()
                .filter(|_| child.column.depth == depth + 1)
                .and_then(|id| graph.column(id));
            let (column, is_placeholder) = match parent {
                Some(parent) => (Rc::clone(parent), false),
                None => (Rc::clone(&child.column), true),
            };

            if let Some(last) = parents.last_mut() {
                if Rc::ptr_eq(&last.column, &column) {
                    last.sub_headers.push(child_index);
                    last.col_span += child.col_span;
                    continue;
                }
            }
            let placeholder_id = is_placeholder.then(|| {
                parents
                    .iter()
                    .filter(|h| Rc::ptr_eq(&h.column, &column))
                    .count()
                    .to_string()
            });
            parents.push(Header {
                id: format!("{}_{}_{}", depth, column.id, child.id),
                column,
                depth,
                index: parents.len(),
                is_placeholder,
                placeholder_id,
                col_span: child.col_span,
                sub_headers: vec![child_index],
            });
        }
        groups.push(HeaderGroup {
            id: (depth + 1).to_string(),
            depth: depth + 1,
            headers: current,
        });
        current = parents;
    }
    groups.push(HeaderGroup {
        id: "0".to_string(),
        depth: 0,
        headers: current,
    });
    groups.reverse();
    groups
}

impl<T: RowData> Table<T> {
    /// Header rows, top first.
    pub fn header_groups(&self) -> Result<Rc<Vec<HeaderGroup<T>>>> {
        let graph = self.entity_graph()?;
        let leaf_columns = self.visible_leaf_columns()?;
        self.caches.header_groups.get(
            || {
                Ok(HeaderDeps {
                    graph: ByRef::new(&graph),
                    leaf_columns: ByRef::new(&leaf_columns),
                })
            },
            |_| {
                let state = self.column_visibility_state();
                Ok(Rc::new(build_header_groups(&graph, &leaf_columns, &state)))
            },
        )
    }

    /// Footer rows: the header rows bottom first.
    pub fn footer_groups(&self) -> Result<Vec<HeaderGroup<T>>> {
        Ok(self.header_groups()?.iter().rev().cloned().collect())
    }

    /// The bottom header row.
    pub fn leaf_headers(&self) -> Result<Vec<Header<T>>> {
        Ok(self
            .header_groups()?
            .last()
            .map(|group| group.headers.clone())
            .unwrap_or_default())
    }
}
