//! FILENAME: table-core/src/lib.rs
//! Headless table engine.
//!
//! A `Table` turns records and column definitions into row models, columns,
//! cells and header groups. Behavior comes from pluggable features that
//! register state slices and hooks; the built-in set covers filtering,
//! sorting, grouping, expanding, pagination, column order and visibility.
//!
//! Layers:
//! - `options` / `state`: what the caller configures and what the table holds
//! - `graph` / `row` / `column`: the entity objects
//! - `row_models`: the derived pipeline, memoized per stage
//! - `features`: state slices and per-feature API

pub mod column;
pub mod error;
pub mod extensions;
pub mod feature;
pub mod features;
pub mod fns;
pub mod graph;
pub mod header;
pub mod memo;
pub mod options;
pub mod row;
pub mod row_model;
pub mod row_models;
pub mod state;
pub mod table;

pub use column::{Accessor, AccessorFn, Column, ColumnDef, SortUndefined};
pub use error::{AccessorError, FnKind, Result, TableError};
pub use extensions::Extensions;
pub use feature::{FeatureRegistry, TableFeature};
pub use features::column_filtering::{ColumnFilter, ColumnFiltersState, GlobalFilterState};
pub use features::column_grouping::GroupingState;
pub use features::column_ordering::ColumnOrderState;
pub use features::column_visibility::VisibilityState;
pub use features::row_expanding::ExpandedState;
pub use features::row_pagination::PaginationState;
pub use features::row_sorting::{ColumnSort, SortDirection, SortingState};
pub use features::stock_features;
pub use fns::{AggregationFn, FilterFn, FilterValue, FnRegistry, ProcessingFns, SortFn};
pub use graph::EntityGraph;
pub use header::{Header, HeaderGroup};
pub use memo::{memo, ByRef, Memo, MemoOptions};
pub use options::{GroupedColumnMode, SliceOptions, TableDefaults, TableOptions, TableSettings};
pub use row::{Cell, Row, RowData, RowInit};
pub use row_model::RowModel;
pub use state::{slice, SliceValue, StateSlice, TableState, Updater};
pub use table::Table;
pub use value::CellValue;
