//! FILENAME: table-core/src/features/column_filtering.rs
//! PURPOSE: Column filters and the global filter.
//! CONTEXT: `columnFilters` holds one filter value per column; all of them
//! must pass. `globalFilter` holds one value tested against every globally
//! filterable column; any one of them may pass.

use std::rc::Rc;
use serde::{Deserialize, Serialize};
use value::CellValue;
use crate::column::Column;
use crate::error::Result;
use crate::feature::TableFeature;
use crate::fns::{filter::auto_filter_fn_name, FilterFn, FilterValue, ProcessingFns, AUTO};
use crate::options::{SliceOptions, TableDefaults};
use crate::row::RowData;
use crate::state::{slice, SliceValue, Updater};
use crate::table::Table;

pub const COLUMN_FILTERS: &str = "columnFilters";
pub const GLOBAL_FILTER: &str = "globalFilter";

/// Column name reported when the global filter function fails to resolve.
const GLOBAL_COLUMN: &str = "<global>";
/// Filter function used for the global filter when set to "auto".
const GLOBAL_AUTO_FILTER_FN: &str = "includesString";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: String,
    pub value: FilterValue,
}

impl ColumnFilter {
    pub fn new(id: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        ColumnFilter {
            id: id.into(),
            value: value.into(),
        }
    }
}

pub type ColumnFiltersState = Vec<ColumnFilter>;
pub type GlobalFilterState = Option<FilterValue>;

/// A column's explicitly named filter function, resolved at construction.
#[derive(Debug, Clone)]
pub struct ResolvedFilterFn(pub FilterFn);

pub struct ColumnFiltering;

impl ColumnFiltering {
    pub const NAME: &'static str = "column_filtering";
}

impl<T: RowData> TableFeature<T> for ColumnFiltering {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![
            (COLUMN_FILTERS, slice(ColumnFiltersState::new())),
            (GLOBAL_FILTER, slice(GlobalFilterState::None)),
        ]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(COLUMN_FILTERS, SliceOptions::enabled(true));
        defaults.slice(GLOBAL_FILTER, SliceOptions::enabled(true));
    }

    fn construct_table(&self, table: &Table<T>) -> Result<()> {
        table.global_filter_fn().map(|_| ())
    }

    fn construct_column(&self, column: &mut Column<T>, fns: &ProcessingFns) -> Result<()> {
        if let Some(name) = column.def.filter_fn.as_deref().filter(|name| *name != AUTO) {
            let filter_fn = fns.filter_fns.resolve(name, &column.id)?;
            column.extensions.insert(ResolvedFilterFn(filter_fn));
        }
        Ok(())
    }
}

// ============================================================================
// TABLE API
// ============================================================================

impl<T: RowData> Table<T> {
    pub fn column_filters_state(&self) -> ColumnFiltersState {
        self.slice_or_default(COLUMN_FILTERS)
    }

    pub fn global_filter_state(&self) -> GlobalFilterState {
        self.slice_or_default(GLOBAL_FILTER)
    }

    pub fn set_column_filters(&self, updater: impl Into<Updater<ColumnFiltersState>>) {
        self.set_slice(COLUMN_FILTERS, updater.into());
    }

    pub fn reset_column_filters(&self) {
        let initial = self
            .get_initial_state()
            .get::<ColumnFiltersState>(COLUMN_FILTERS)
            .cloned()
            .unwrap_or_default();
        self.set_column_filters(initial);
    }

    pub fn set_global_filter(&self, updater: impl Into<Updater<GlobalFilterState>>) {
        self.set_slice(GLOBAL_FILTER, updater.into());
    }

    pub fn reset_global_filter(&self) {
        let initial = self
            .get_initial_state()
            .get::<GlobalFilterState>(GLOBAL_FILTER)
            .cloned()
            .flatten();
        self.set_global_filter(initial);
    }

    /// First core row's value for a column, used for auto detection.
    fn first_core_value(&self, column_id: &str) -> Result<Option<CellValue>> {
        let core = self.core_row_model()?;
        core.flat_rows
            .first()
            .map(|row| row.get_value(column_id))
            .transpose()
    }

    /// The filter function applied to a column's filter value.
    pub fn column_filter_fn(&self, column_id: &str) -> Result<FilterFn> {
        let column = self.column(column_id)?;
        if let Some(ResolvedFilterFn(filter_fn)) = column.extensions.get::<ResolvedFilterFn>() {
            return Ok(filter_fn.clone());
        }
        let sample = self.first_core_value(column_id)?.unwrap_or(CellValue::Empty);
        let fns = Rc::clone(&self.opts().processing_fns);
        fns.filter_fns.resolve(auto_filter_fn_name(&sample), column_id)
    }

    pub fn global_filter_fn(&self) -> Result<FilterFn> {
        let (name, fns) = {
            let options = self.opts();
            (options.settings.global_filter_fn.clone(), Rc::clone(&options.processing_fns))
        };
        let name = if name == AUTO { GLOBAL_AUTO_FILTER_FN } else { name.as_str() };
        fns.filter_fns.resolve(name, GLOBAL_COLUMN)
    }

    pub fn column_can_filter(&self, column_id: &str) -> Result<bool> {
        let column = self.column(column_id)?;
        Ok(column.has_accessor()
            && column.def.enable_column_filter.unwrap_or(true)
            && !self.slice_options(COLUMN_FILTERS).is_disabled())
    }

    /// Text and number columns take part in the global filter by default.
    pub fn column_can_global_filter(&self, column_id: &str) -> Result<bool> {
        let column = self.column(column_id)?;
        if !column.has_accessor()
            || !column.def.enable_global_filter.unwrap_or(true)
            || self.slice_options(GLOBAL_FILTER).is_disabled()
        {
            return Ok(false);
        }
        Ok(matches!(
            self.first_core_value(column_id)?,
            Some(CellValue::Text(_)) | Some(CellValue::Number(_))
        ))
    }

    pub fn column_filter_index(&self, column_id: &str) -> Option<usize> {
        self.column_filters_state()
            .iter()
            .position(|filter| filter.id == column_id)
    }

    pub fn column_is_filtered(&self, column_id: &str) -> bool {
        self.column_filter_index(column_id).is_some()
    }

    pub fn column_filter_value(&self, column_id: &str) -> Option<FilterValue> {
        self.column_filters_state()
            .into_iter()
            .find(|filter| filter.id == column_id)
            .map(|filter| filter.value)
    }

    /// Sets (or with `None`, removes) one column's filter. Values the
    /// column's filter function considers empty remove the filter.
    pub fn set_column_filter_value(&self, column_id: &str, value: Option<FilterValue>) -> Result<()> {
        let filter_fn = self.column_filter_fn(column_id)?;
        let id = column_id.to_string();
        self.set_column_filters(Updater::transform(move |old: &ColumnFiltersState| {
            let next = match &value {
                Some(v) if !filter_fn.should_auto_remove(v) && !is_blank(v) => ColumnFilter {
                    id: id.clone(),
                    value: v.clone(),
                },
                _ => return old.iter().filter(|f| f.id != id).cloned().collect(),
            };
            if old.iter().any(|f| f.id == id) {
                old.iter()
                    .map(|f| if f.id == id { next.clone() } else { f.clone() })
                    .collect()
            } else {
                let mut filters = old.clone();
                filters.push(next);
                filters
            }
        }));
        Ok(())
    }
}

/// An unset value or empty text never stays in the filter state.
fn is_blank(value: &FilterValue) -> bool {
    match value {
        FilterValue::Value(CellValue::Empty) => true,
        FilterValue::Value(CellValue::Text(text)) => text.is_empty(),
        _ => false,
    }
}
