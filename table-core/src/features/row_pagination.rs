//! FILENAME: table-core/src/features/row_pagination.rs
//! PURPOSE: Page window state and navigation.
//! CONTEXT: Page counts come from the rows before pagination unless the
//! application supplies `row_count`/`page_count` (server-side paging).
//! An index past the last page is never an error: setters clamp it and the
//! paginated row model clamps whatever state it finds.

use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::feature::TableFeature;
use crate::options::{SliceOptions, TableDefaults};
use crate::row::RowData;
use crate::state::{slice, SliceValue, Updater};
use crate::table::Table;

pub const PAGINATION: &str = "pagination";

pub const DEFAULT_PAGE_INDEX: usize = 0;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        PaginationState {
            page_index: DEFAULT_PAGE_INDEX,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationState {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        PaginationState { page_index, page_size }
    }

    /// Index of the first row on the current page.
    pub fn page_start(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }
}

pub struct RowPagination;

impl RowPagination {
    pub const NAME: &'static str = "row_pagination";
}

impl<T: RowData> TableFeature<T> for RowPagination {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(PAGINATION, slice(PaginationState::default()))]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(PAGINATION, SliceOptions::enabled(true));
    }
}

impl<T: RowData> Table<T> {
    pub fn pagination_state(&self) -> PaginationState {
        self.slice_or_default(PAGINATION)
    }

    pub fn set_pagination(&self, updater: impl Into<Updater<PaginationState>>) {
        self.set_slice(PAGINATION, updater.into());
    }

    fn initial_pagination(&self) -> PaginationState {
        self.get_initial_state()
            .get::<PaginationState>(PAGINATION)
            .copied()
            .unwrap_or_default()
    }

    pub fn reset_pagination(&self) {
        self.set_pagination(self.initial_pagination());
    }

    /// Total rows across all pages.
    pub fn row_count(&self) -> Result<usize> {
        if let Some(row_count) = self.opts().settings.row_count {
            return Ok(row_count);
        }
        Ok(self.pre_pagination_row_model()?.rows.len())
    }

    pub fn page_count(&self) -> Result<usize> {
        if let Some(page_count) = self.opts().settings.page_count {
            return Ok(page_count);
        }
        let page_size = self.pagination_state().page_size.max(1);
        Ok(self.row_count()?.div_ceil(page_size))
    }

    /// Moves to a page, clamped to the existing pages.
    pub fn set_page_index(&self, page_index: usize) -> Result<()> {
        let last = self.page_count()?.saturating_sub(1);
        let page_index = page_index.min(last);
        self.set_pagination(Updater::transform(move |old: &PaginationState| PaginationState {
            page_index,
            ..*old
        }));
        Ok(())
    }

    pub fn reset_page_index(&self) -> Result<()> {
        self.set_page_index(self.initial_pagination().page_index)
    }

    /// Changes the page size, keeping the current top row on screen.
    pub fn set_page_size(&self, page_size: usize) {
        let page_size = page_size.max(1);
        self.set_pagination(Updater::transform(move |old: &PaginationState| PaginationState {
            page_index: old.page_start() / page_size,
            page_size,
        }));
    }

    pub fn reset_page_size(&self) {
        self.set_page_size(self.initial_pagination().page_size);
    }

    pub fn page_options(&self) -> Result<Vec<usize>> {
        Ok((0..self.page_count()?).collect())
    }

    pub fn can_previous_page(&self) -> bool {
        self.pagination_state().page_index > 0
    }

    pub fn can_next_page(&self) -> Result<bool> {
        let page_count = self.page_count()?;
        Ok(page_count > 0 && self.pagination_state().page_index < page_count - 1)
    }

    pub fn previous_page(&self) -> Result<()> {
        self.set_page_index(self.pagination_state().page_index.saturating_sub(1))
    }

    pub fn next_page(&self) -> Result<()> {
        self.set_page_index(self.pagination_state().page_index.saturating_add(1))
    }

    pub fn first_page(&self) -> Result<()> {
        self.set_page_index(0)
    }

    pub fn last_page(&self) -> Result<()> {
        let last = self.page_count()?.saturating_sub(1);
        self.set_page_index(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::options::TableOptions;
    use serde_json::{json, Value};

    fn table(rows: usize) -> Table<Value> {
        let data = (0..rows).map(|i| json!({ "n": i })).collect();
        Table::with_stock_features(TableOptions::new(data, vec![ColumnDef::accessor("n")])).unwrap()
    }

    #[test]
    fn page_count_rounds_up() {
        let table = table(25);
        assert_eq!(table.page_count().unwrap(), 3);
        assert_eq!(table.page_options().unwrap(), vec![0, 1, 2]);
        assert_eq!(table.row_count().unwrap(), 25);
    }

    #[test]
    fn navigation_is_clamped() {
        let table = table(25);
        assert!(!table.can_previous_page());
        table.last_page().unwrap();
        assert_eq!(table.pagination_state().page_index, 2);
        assert!(!table.can_next_page().unwrap());
        table.next_page().unwrap();
        assert_eq!(table.pagination_state().page_index, 2);
        table.set_page_index(99).unwrap();
        assert_eq!(table.pagination_state().page_index, 2);
        table.first_page().unwrap();
        table.previous_page().unwrap();
        assert_eq!(table.pagination_state().page_index, 0);
    }

    #[test]
    fn next_page_from_out_of_range_index() {
        let table = table(25);
        table.set_pagination(PaginationState::new(usize::MAX, 10));
        table.next_page().unwrap();
        assert_eq!(table.pagination_state().page_index, 2);
    }

    #[test]
    fn page_size_change_keeps_top_row() {
        let table = table(100);
        table.set_pagination(PaginationState::new(3, 10));
        table.set_page_size(25);
        assert_eq!(table.pagination_state(), PaginationState::new(1, 25));
        table.reset_page_size();
        assert_eq!(table.pagination_state(), PaginationState::new(2, 10));
    }

    #[test]
    fn server_side_counts() {
        let table = table(5);
        table.set_options(|mut o| {
            o.settings.row_count = Some(1000);
            o
        });
        assert_eq!(table.page_count().unwrap(), 100);
        table.set_options(|mut o| {
            o.settings.page_count = Some(7);
            o
        });
        assert_eq!(table.page_count().unwrap(), 7);
    }

    #[test]
    fn pagination_json_layout() {
        let json = serde_json::to_value(PaginationState::new(1, 20)).unwrap();
        assert_eq!(json, serde_json::json!({ "pageIndex": 1, "pageSize": 20 }));
    }
}
