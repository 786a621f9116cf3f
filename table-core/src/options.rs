//! FILENAME: table-core/src/options.rs
//! Table options - what the owning application configures.
//!
//! Options come in three layers:
//! - `TableSettings`: plain, serializable switches (manual modes, pagination
//!   policy, multi-sort limits). Loadable from JSON; every field has a default.
//! - `SliceOptions`: per state slice, an explicit enable flag and an optional
//!   change-notification override. Features contribute defaults for these;
//!   user-supplied entries win.
//! - `TableOptions<T>`: the runtime record holding data, column definitions,
//!   callbacks and the function registries, plus the two layers above.

use std::fmt;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use crate::column::ColumnDef;
use crate::fns::ProcessingFns;
use crate::row::{Row, RowData};
use crate::state::{SliceValue, TableState, Updater};

// ============================================================================
// SETTINGS
// ============================================================================

/// Where grouped columns go in the ordered leaf column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupedColumnMode {
    /// Leave columns where they are.
    None,
    /// Move grouped columns to the front, in grouping order.
    #[default]
    Reorder,
    /// Drop grouped columns from the leaf list.
    Remove,
}

/// Serializable table switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Log every memoized derivation's recompute time.
    pub debug_all: bool,
    pub debug_table: bool,

    // -- filtering --
    /// Rows arrive pre-filtered; the filtered stage passes through.
    pub manual_filtering: bool,
    /// Keep a parent whose descendants match even if it fails itself.
    /// When false, a failing parent drops its whole subtree.
    pub filter_from_leaf_rows: bool,
    /// Deepest level filters apply to; deeper rows are kept as-is.
    pub max_leaf_row_filter_depth: Option<usize>,
    /// Filter function name for the global filter.
    pub global_filter_fn: String,

    // -- sorting --
    pub manual_sorting: bool,
    pub enable_multi_sort: bool,
    pub enable_multi_remove: bool,
    pub enable_sorting_removal: bool,
    pub max_multi_sort_col_count: Option<usize>,
    /// Table-wide override for whether sorting starts descending.
    pub sort_desc_first: Option<bool>,
    /// Column compared after every sort key, before falling back to row order.
    pub sort_tie_breaker: Option<String>,

    // -- grouping --
    pub manual_grouping: bool,
    pub grouped_column_mode: GroupedColumnMode,

    // -- expanding --
    pub manual_expanding: bool,
    /// Expanded sub-rows take part in pagination. When false, expansion is
    /// applied to the page window only.
    pub paginate_expanded_rows: bool,

    // -- pagination --
    pub manual_pagination: bool,
    /// Known total row count (server-side pagination).
    pub row_count: Option<usize>,
    /// Known total page count (server-side pagination).
    pub page_count: Option<usize>,
}

impl Default for TableSettings {
    fn default() -> Self {
        TableSettings {
            debug_all: false,
            debug_table: false,
            manual_filtering: false,
            filter_from_leaf_rows: true,
            max_leaf_row_filter_depth: None,
            global_filter_fn: crate::fns::AUTO.to_string(),
            manual_sorting: false,
            enable_multi_sort: true,
            enable_multi_remove: true,
            enable_sorting_removal: true,
            max_multi_sort_col_count: None,
            sort_desc_first: None,
            sort_tie_breaker: None,
            manual_grouping: false,
            grouped_column_mode: GroupedColumnMode::Reorder,
            manual_expanding: false,
            paginate_expanded_rows: true,
            manual_pagination: false,
            row_count: None,
            page_count: None,
        }
    }
}

impl TableSettings {
    pub fn debug_enabled(&self) -> bool {
        self.debug_all || self.debug_table
    }
}

// ============================================================================
// SLICE OPTIONS
// ============================================================================

/// Change notification for one slice. Receives the updater instead of the
/// default state updater; the owner decides how to apply it.
pub type OnChangeFn = Rc<dyn Fn(Updater<SliceValue>)>;

/// Table-wide change notification, invoked after a state update is published.
pub type OnStateChangeFn = Rc<dyn Fn(&Updater<TableState>)>;

#[derive(Clone, Default)]
pub struct SliceOptions {
    /// `Some(false)` turns every setter for the slice into a no-op.
    pub enabled: Option<bool>,
    pub on_change: Option<OnChangeFn>,
}

impl SliceOptions {
    pub fn enabled(enabled: bool) -> Self {
        SliceOptions {
            enabled: Some(enabled),
            on_change: None,
        }
    }

    /// Fields set in `overrides` win over fields set here.
    pub fn overlaid(&self, overrides: &SliceOptions) -> SliceOptions {
        SliceOptions {
            enabled: overrides.enabled.or(self.enabled),
            on_change: overrides.on_change.clone().or_else(|| self.on_change.clone()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }
}

impl fmt::Debug for SliceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceOptions")
            .field("enabled", &self.enabled)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Defaults contributed by feature descriptors at construction time.
#[derive(Clone, Default, Debug)]
pub struct TableDefaults {
    pub slices: FxHashMap<String, SliceOptions>,
}

impl TableDefaults {
    /// Registers a default for a slice. An earlier feature's default wins.
    pub fn slice(&mut self, name: &str, options: SliceOptions) {
        self.slices.entry(name.to_string()).or_insert(options);
    }
}

// ============================================================================
// TABLE OPTIONS
// ============================================================================

pub type GetRowIdFn<T> = Rc<dyn Fn(&T, usize, Option<&str>) -> String>;
pub type GetSubRowsFn<T> = Rc<dyn Fn(&T) -> Option<Vec<T>>>;
pub type RowPredicateFn<T> = Rc<dyn Fn(&Row<T>) -> bool>;

pub struct TableOptions<T: RowData> {
    pub data: Rc<Vec<T>>,
    pub columns: Rc<Vec<ColumnDef<T>>>,
    /// Controlled slices; these override the table's internal state.
    pub state: TableState,
    /// Seed values; feature defaults only fill slices missing here.
    pub initial_state: TableState,
    pub on_state_change: Option<OnStateChangeFn>,
    pub slices: FxHashMap<String, SliceOptions>,
    /// Derives a row id from `(original, index, parent id)`.
    pub get_row_id: Option<GetRowIdFn<T>>,
    /// Tree data: child records of a record.
    pub get_sub_rows: Option<GetSubRowsFn<T>>,
    pub get_row_can_expand: Option<RowPredicateFn<T>>,
    pub get_is_row_expanded: Option<RowPredicateFn<T>>,
    pub processing_fns: Rc<ProcessingFns>,
    pub settings: TableSettings,
}

impl<T: RowData> TableOptions<T> {
    pub fn new(data: Vec<T>, columns: Vec<ColumnDef<T>>) -> Self {
        TableOptions {
            data: Rc::new(data),
            columns: Rc::new(columns),
            state: TableState::new(),
            initial_state: TableState::new(),
            on_state_change: None,
            slices: FxHashMap::default(),
            get_row_id: None,
            get_sub_rows: None,
            get_row_can_expand: None,
            get_is_row_expanded: None,
            processing_fns: Rc::new(ProcessingFns::builtin()),
            settings: TableSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TableSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_initial_state(mut self, initial_state: TableState) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn with_state(mut self, state: TableState) -> Self {
        self.state = state;
        self
    }

    pub fn on_state_change(mut self, f: impl Fn(&Updater<TableState>) + 'static) -> Self {
        self.on_state_change = Some(Rc::new(f));
        self
    }

    /// Sets the enable flag for one slice.
    pub fn enable(mut self, slice: &str, enabled: bool) -> Self {
        self.slices.entry(slice.to_string()).or_default().enabled = Some(enabled);
        self
    }

    /// Routes updates of one slice to `f` instead of the internal store.
    pub fn on_slice_change(mut self, slice: &str, f: impl Fn(Updater<SliceValue>) + 'static) -> Self {
        self.slices.entry(slice.to_string()).or_default().on_change = Some(Rc::new(f));
        self
    }

    pub fn get_row_id(mut self, f: impl Fn(&T, usize, Option<&str>) -> String + 'static) -> Self {
        self.get_row_id = Some(Rc::new(f));
        self
    }

    pub fn get_sub_rows(mut self, f: impl Fn(&T) -> Option<Vec<T>> + 'static) -> Self {
        self.get_sub_rows = Some(Rc::new(f));
        self
    }

    pub fn get_row_can_expand(mut self, f: impl Fn(&Row<T>) -> bool + 'static) -> Self {
        self.get_row_can_expand = Some(Rc::new(f));
        self
    }

    pub fn get_is_row_expanded(mut self, f: impl Fn(&Row<T>) -> bool + 'static) -> Self {
        self.get_is_row_expanded = Some(Rc::new(f));
        self
    }

    pub fn with_processing_fns(mut self, fns: ProcessingFns) -> Self {
        self.processing_fns = Rc::new(fns);
        self
    }
}

impl<T: RowData> Clone for TableOptions<T> {
    fn clone(&self) -> Self {
        TableOptions {
            data: Rc::clone(&self.data),
            columns: Rc::clone(&self.columns),
            state: self.state.clone(),
            initial_state: self.initial_state.clone(),
            on_state_change: self.on_state_change.clone(),
            slices: self.slices.clone(),
            get_row_id: self.get_row_id.clone(),
            get_sub_rows: self.get_sub_rows.clone(),
            get_row_can_expand: self.get_row_can_expand.clone(),
            get_is_row_expanded: self.get_is_row_expanded.clone(),
            processing_fns: Rc::clone(&self.processing_fns),
            settings: self.settings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_load_from_partial_json() {
        let settings: TableSettings = serde_json::from_str(
            r#"{ "paginate_expanded_rows": false, "grouped_column_mode": "remove" }"#,
        )
        .unwrap();
        assert!(!settings.paginate_expanded_rows);
        assert_eq!(settings.grouped_column_mode, GroupedColumnMode::Remove);
        assert!(settings.filter_from_leaf_rows);
        assert_eq!(settings.global_filter_fn, "auto");
    }

    #[test]
    fn user_slice_options_override_defaults() {
        let default = SliceOptions::enabled(true);
        let user = SliceOptions::enabled(false);
        assert!(default.overlaid(&user).is_disabled());
        assert!(!default.overlaid(&SliceOptions::default()).is_disabled());
    }

    #[test]
    fn earlier_feature_default_wins() {
        let mut defaults = TableDefaults::default();
        defaults.slice("density", SliceOptions::enabled(true));
        defaults.slice("density", SliceOptions::enabled(false));
        assert_eq!(defaults.slices["density"].enabled, Some(true));
    }
}
