//! FILENAME: table-core/src/row_models/expanded.rs
//! Expanded row model.
//!
//! Expansion is only materialized here when expanded rows take part in
//! pagination. Otherwise this stage passes its input through and the
//! paginated stage expands the page window instead. `flat_rows` and
//! `rows_by_id` are carried over unchanged either way.

use std::rc::Rc;
use crate::error::Result;
use crate::features::row_expanding::{RowExpanding, EXPANDED};
use crate::memo::ByRef;
use crate::row::RowData;
use crate::row_model::RowModel;
use crate::state::SliceDep;
use crate::table::Table;

pub(crate) struct ExpandedDeps<T: RowData> {
    input: ByRef<RowModel<T>>,
    expanded: SliceDep,
    paginate_expanded_rows: bool,
    manual: bool,
    row_predicate: Option<*const ()>,
}

impl<T: RowData> PartialEq for ExpandedDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input
            && self.expanded == other.expanded
            && self.paginate_expanded_rows == other.paginate_expanded_rows
            && self.manual == other.manual
            && self.row_predicate == other.row_predicate
    }
}

impl<T: RowData> Table<T> {
    pub fn pre_expanded_row_model(&self) -> Result<Rc<RowModel<T>>> {
        self.grouped_row_model()
    }

    pub fn expanded_row_model(&self) -> Result<Rc<RowModel<T>>> {
        let input = self.pre_expanded_row_model()?;
        if !self.has_feature(RowExpanding::NAME) {
            return Ok(input);
        }
        self.caches.expanded.get(
            || {
                let options = self.opts();
                Ok(ExpandedDeps {
                    input: ByRef::new(&input),
                    expanded: SliceDep(self.slice_value(EXPANDED)),
                    paginate_expanded_rows: options.settings.paginate_expanded_rows,
                    manual: options.settings.manual_expanding,
                    row_predicate: crate::table::fn_identity(&options.get_is_row_expanded),
                })
            },
            |deps| {
                let nothing_expanded = self.expanded_state().is_empty();
                if deps.manual || input.rows.is_empty() || nothing_expanded || !deps.paginate_expanded_rows {
                    return Ok(Rc::clone(&input));
                }
                Ok(Rc::new(RowModel {
                    rows: self.expand_rows(&input.rows),
                    flat_rows: input.flat_rows.clone(),
                    rows_by_id: input.rows_by_id.clone(),
                }))
            },
        )
    }
}
