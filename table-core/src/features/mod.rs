//! FILENAME: table-core/src/features/mod.rs
//! PURPOSE: Built-in table features.
//! CONTEXT: Each module holds one feature: its state slice, its hooks and
//! its `Table` API. Row model stages live in `row_models`.

pub mod column_filtering;
pub mod column_grouping;
pub mod column_ordering;
pub mod column_visibility;
pub mod row_expanding;
pub mod row_pagination;
pub mod row_sorting;

use std::rc::Rc;
use crate::feature::TableFeature;
use crate::row::RowData;

pub use column_filtering::ColumnFiltering;
pub use column_grouping::ColumnGrouping;
pub use column_ordering::ColumnOrdering;
pub use column_visibility::ColumnVisibility;
pub use row_expanding::RowExpanding;
pub use row_pagination::RowPagination;
pub use row_sorting::RowSorting;

/// Every built-in feature, in hook order.
pub fn stock_features<T: RowData>() -> Vec<Rc<dyn TableFeature<T>>> {
    vec![
        Rc::new(ColumnOrdering),
        Rc::new(ColumnVisibility),
        Rc::new(ColumnFiltering),
        Rc::new(ColumnGrouping),
        Rc::new(RowSorting),
        Rc::new(RowExpanding),
        Rc::new(RowPagination),
    ]
}
