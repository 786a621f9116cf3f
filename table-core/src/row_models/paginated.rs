//! FILENAME: table-core/src/row_models/paginated.rs
//! Paginated row model: the current page window of the expanded rows.

use std::rc::Rc;
use crate::error::Result;
use crate::features::row_expanding::{RowExpanding, EXPANDED};
use crate::features::row_pagination::{RowPagination, PAGINATION};
use crate::memo::ByRef;
use crate::row::RowData;
use crate::row_model::RowModel;
use crate::state::SliceDep;
use crate::table::Table;

pub(crate) struct PaginatedDeps<T: RowData> {
    input: ByRef<RowModel<T>>,
    pagination: SliceDep,
    /// Only consulted when expansion is applied to the page window.
    expanded: SliceDep,
    paginate_expanded_rows: bool,
    manual: bool,
}

impl<T: RowData> PartialEq for PaginatedDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input
            && self.pagination == other.pagination
            && self.expanded == other.expanded
            && self.paginate_expanded_rows == other.paginate_expanded_rows
            && self.manual == other.manual
    }
}

impl<T: RowData> Table<T> {
    pub fn pre_pagination_row_model(&self) -> Result<Rc<RowModel<T>>> {
        self.expanded_row_model()
    }

    pub fn paginated_row_model(&self) -> Result<Rc<RowModel<T>>> {
        let input = self.pre_pagination_row_model()?;
        if !self.has_feature(RowPagination::NAME) {
            return Ok(input);
        }
        self.caches.paginated.get(
            || {
                let settings = self.settings();
                let expands_page = !settings.paginate_expanded_rows && self.has_feature(RowExpanding::NAME);
                Ok(PaginatedDeps {
                    input: ByRef::new(&input),
                    pagination: SliceDep(self.slice_value(PAGINATION)),
                    expanded: SliceDep(if expands_page { self.slice_value(EXPANDED) } else { None }),
                    paginate_expanded_rows: settings.paginate_expanded_rows,
                    manual: settings.manual_pagination,
                })
            },
            |deps| self.paginate_row_model(&input, deps),
        )
    }

    fn paginate_row_model(&self, input: &Rc<RowModel<T>>, deps: &PaginatedDeps<T>) -> Result<Rc<RowModel<T>>> {
        if deps.manual || input.rows.is_empty() {
            return Ok(Rc::clone(input));
        }

        let pagination = self.pagination_state();
        let page_size = pagination.page_size.max(1);
        let page_count = input.rows.len().div_ceil(page_size);
        // Stale indexes (the data shrank) show the last page.
        let page_index = pagination.page_index.min(page_count.saturating_sub(1));
        let start = page_index * page_size;
        let end = (start + page_size).min(input.rows.len());

        let expand_page = !deps.paginate_expanded_rows
            && self.has_feature(RowExpanding::NAME)
            && !self.expanded_state().is_empty();
        if start == 0 && end == input.rows.len() && !expand_page {
            return Ok(Rc::clone(input));
        }

        let window = &input.rows[start..end];
        let rows = if expand_page {
            self.expand_rows(window)
        } else {
            window.to_vec()
        };
        let page = RowModel::from_rows(rows);
        Ok(Rc::new(RowModel {
            rows: page.rows,
            flat_rows: page.flat_rows,
            rows_by_id: input.rows_by_id.clone(),
        }))
    }
}
