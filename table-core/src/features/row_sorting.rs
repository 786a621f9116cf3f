//! FILENAME: table-core/src/features/row_sorting.rs
//! PURPOSE: Multi-column sorting: state, column resolution and table API.
//! CONTEXT: The `sorting` slice is an ordered list of sort keys. Toggling a
//! column cycles it through first direction -> other direction -> removed,
//! subject to the removal and multi-sort switches in `TableSettings`.

use std::rc::Rc;
use serde::{Deserialize, Serialize};
use value::CellValue;
use crate::column::Column;
use crate::error::Result;
use crate::feature::TableFeature;
use crate::fns::{sort::auto_sort_fn_name, ProcessingFns, SortFn, AUTO};
use crate::options::{SliceOptions, TableDefaults};
use crate::row::RowData;
use crate::state::{slice, SliceValue, Updater};
use crate::table::Table;

pub const SORTING: &str = "sorting";

/// Rows sampled when a column's sort function or direction is auto-detected.
const AUTO_SAMPLE_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub id: String,
    pub desc: bool,
}

impl ColumnSort {
    pub fn asc(id: impl Into<String>) -> Self {
        ColumnSort { id: id.into(), desc: false }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        ColumnSort { id: id.into(), desc: true }
    }
}

pub type SortingState = Vec<ColumnSort>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_desc(self) -> bool {
        self == SortDirection::Desc
    }

    fn from_desc(desc: bool) -> Self {
        if desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// A column's explicitly named sort function, resolved at construction.
#[derive(Debug, Clone)]
pub struct ResolvedSortFn(pub SortFn);

pub struct RowSorting;

impl RowSorting {
    pub const NAME: &'static str = "row_sorting";
}

impl<T: RowData> TableFeature<T> for RowSorting {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(SORTING, slice(SortingState::new()))]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(SORTING, SliceOptions::enabled(true));
    }

    fn construct_column(&self, column: &mut Column<T>, fns: &ProcessingFns) -> Result<()> {
        if let Some(name) = column.def.sort_fn.as_deref().filter(|name| *name != AUTO) {
            let sort_fn = fns.sort_fns.resolve(name, &column.id)?;
            column.extensions.insert(ResolvedSortFn(sort_fn));
        }
        Ok(())
    }
}

// ============================================================================
// TABLE API
// ============================================================================

impl<T: RowData> Table<T> {
    pub fn sorting_state(&self) -> SortingState {
        self.slice_or_default(SORTING)
    }

    pub fn set_sorting(&self, updater: impl Into<Updater<SortingState>>) {
        self.set_slice(SORTING, updater.into());
    }

    pub fn reset_sorting(&self) {
        let initial = self.get_initial_state().get::<SortingState>(SORTING).cloned().unwrap_or_default();
        self.set_sorting(initial);
    }

    /// Values of a column from the first few filtered rows.
    fn sample_values(&self, column_id: &str) -> Result<Vec<CellValue>> {
        let model = self.filtered_row_model()?;
        model
            .flat_rows
            .iter()
            .take(AUTO_SAMPLE_ROWS)
            .map(|row| row.get_value(column_id))
            .collect()
    }

    /// The sort function the sorted row model uses for a column.
    pub fn column_sort_fn(&self, column_id: &str) -> Result<SortFn> {
        let column = self.column(column_id)?;
        if let Some(ResolvedSortFn(sort_fn)) = column.extensions.get::<ResolvedSortFn>() {
            return Ok(sort_fn.clone());
        }
        let samples = self.sample_values(column_id)?;
        let fns = Rc::clone(&self.opts().processing_fns);
        fns.sort_fns.resolve(auto_sort_fn_name(&samples), column_id)
    }

    pub fn column_can_sort(&self, column_id: &str) -> Result<bool> {
        let column = self.column(column_id)?;
        Ok(column.has_accessor()
            && column.def.enable_sorting.unwrap_or(true)
            && !self.slice_options(SORTING).is_disabled())
    }

    pub fn column_can_multi_sort(&self, column_id: &str) -> Result<bool> {
        let column = self.column(column_id)?;
        let table_default = self.opts().settings.enable_multi_sort;
        Ok(column.has_accessor() && column.def.enable_multi_sort.unwrap_or(table_default))
    }

    /// Direction a column sorts in when first toggled. Text columns start
    /// ascending, everything else descending, unless configured.
    pub fn column_first_sort_dir(&self, column_id: &str) -> Result<SortDirection> {
        let column = self.column(column_id)?;
        let configured = column.def.sort_desc_first.or(self.opts().settings.sort_desc_first);
        if let Some(desc_first) = configured {
            return Ok(SortDirection::from_desc(desc_first));
        }
        let first = self.sample_values(column_id)?.into_iter().next();
        Ok(match first {
            Some(CellValue::Text(_)) => SortDirection::Asc,
            _ => SortDirection::Desc,
        })
    }

    pub fn column_is_sorted(&self, column_id: &str) -> Option<SortDirection> {
        self.sorting_state()
            .iter()
            .find(|sort| sort.id == column_id)
            .map(|sort| SortDirection::from_desc(sort.desc))
    }

    pub fn column_sort_index(&self, column_id: &str) -> Option<usize> {
        self.sorting_state().iter().position(|sort| sort.id == column_id)
    }

    /// Where the next toggle takes the column. `None` means the toggle
    /// removes it from the sort.
    pub fn column_next_sorting_order(&self, column_id: &str, multi: bool) -> Result<Option<SortDirection>> {
        let first = self.column_first_sort_dir(column_id)?;
        let current = match self.column_is_sorted(column_id) {
            Some(current) => current,
            None => return Ok(Some(first)),
        };
        let (removal, multi_remove) = {
            let settings = &self.opts().settings;
            (settings.enable_sorting_removal, settings.enable_multi_remove)
        };
        if current != first && removal && (!multi || multi_remove) {
            return Ok(None);
        }
        Ok(Some(if current.is_desc() {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }))
    }

    /// Toggles a column's sort.
    ///
    /// `desc` forces a direction. With `multi`, the column is added to (or
    /// toggled within) the existing sort instead of replacing it.
    pub fn toggle_sorting(&self, column_id: &str, desc: Option<bool>, multi: bool) -> Result<()> {
        let next_order = self.column_next_sorting_order(column_id, multi)?;
        let can_multi = self.column_can_multi_sort(column_id)?;
        let max_count = self.opts().settings.max_multi_sort_col_count;
        let id = column_id.to_string();

        self.set_sorting(Updater::transform(move |old: &SortingState| {
            let existing = old.iter().position(|sort| sort.id == id);
            let next_desc = desc.unwrap_or(next_order == Some(SortDirection::Desc));

            let mut action = if !old.is_empty() && can_multi && multi {
                if existing.is_some() {
                    SortAction::Toggle
                } else {
                    SortAction::Add
                }
            } else if !old.is_empty() && existing.map_or(false, |i| i != old.len() - 1) {
                SortAction::Replace
            } else if existing.is_some() {
                SortAction::Toggle
            } else {
                SortAction::Replace
            };
            if action == SortAction::Toggle && desc.is_none() && next_order.is_none() {
                action = SortAction::Remove;
            }

            match action {
                SortAction::Add => {
                    let mut next = old.clone();
                    next.push(ColumnSort { id: id.clone(), desc: next_desc });
                    let excess = next.len().saturating_sub(max_count.unwrap_or(usize::MAX));
                    next.drain(..excess);
                    next
                }
                SortAction::Toggle => old
                    .iter()
                    .map(|sort| {
                        if sort.id == id {
                            ColumnSort { id: id.clone(), desc: next_desc }
                        } else {
                            sort.clone()
                        }
                    })
                    .collect(),
                SortAction::Remove => old.iter().filter(|sort| sort.id != id).cloned().collect(),
                SortAction::Replace => vec![ColumnSort { id: id.clone(), desc: next_desc }],
            }
        }));
        Ok(())
    }

    pub fn clear_column_sorting(&self, column_id: &str) {
        let id = column_id.to_string();
        self.set_sorting(Updater::transform(move |old: &SortingState| {
            old.iter().filter(|sort| sort.id != id).cloned().collect()
        }));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortAction {
    Add,
    Toggle,
    Remove,
    Replace,
}
