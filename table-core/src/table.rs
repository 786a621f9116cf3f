//! FILENAME: table-core/src/table.rs
//! PURPOSE: The table object - composition root of options, state, features
//! and the row model pipeline.
//! CONTEXT: One `Table` per logical table, owned by its creator. All state
//! changes go through `set_state`. Derived data (column tree, row models,
//! header groups) is read on demand through per-table memo caches; feature
//! modules add their API as further `impl<T> Table<T>` blocks.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use crate::column::{Column, ColumnDef};
use crate::error::{Result, TableError};
use crate::feature::{FeatureRegistry, TableFeature};
use crate::features::{self, column_ordering, column_visibility};
use crate::fns::ProcessingFns;
use crate::graph::EntityGraph;
use crate::header::{self, HeaderGroup};
use crate::memo::{ByRef, Memo};
use crate::options::{SliceOptions, TableDefaults, TableOptions, TableSettings};
use crate::row::{Row, RowData};
use crate::row_model::{build_core_row_model, RowModel};
use crate::row_models::{expanded, filtered, grouped, paginated, sorted};
use crate::state::{downcast_slice, slice, SliceValue, StateSlice, TableState, Updater};

// ============================================================================
// CACHES
// ============================================================================

/// Identity of an optional callback, for memo dependencies.
pub(crate) fn fn_identity<F: ?Sized>(f: &Option<Rc<F>>) -> Option<*const ()> {
    f.as_ref().map(|f| Rc::as_ptr(f) as *const ())
}

type ColumnList<T> = Rc<Vec<Rc<Column<T>>>>;

pub(crate) struct CoreDeps<T: RowData> {
    data: ByRef<Vec<T>>,
    graph: ByRef<EntityGraph<T>>,
    get_row_id: Option<*const ()>,
    get_sub_rows: Option<*const ()>,
}

impl<T: RowData> PartialEq for CoreDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
            && self.graph == other.graph
            && self.get_row_id == other.get_row_id
            && self.get_sub_rows == other.get_sub_rows
    }
}

/// One memo per derivation site, private to this table.
pub(crate) struct TableCaches<T: RowData> {
    pub graph: Memo<(ByRef<Vec<ColumnDef<T>>>, ByRef<ProcessingFns>), Rc<EntityGraph<T>>>,
    pub core: Memo<CoreDeps<T>, Rc<RowModel<T>>>,
    pub filtered: Memo<filtered::FilteredDeps<T>, Rc<RowModel<T>>>,
    pub sorted: Memo<sorted::SortedDeps<T>, Rc<RowModel<T>>>,
    pub grouped: Memo<grouped::GroupedDeps<T>, Rc<RowModel<T>>>,
    pub expanded: Memo<expanded::ExpandedDeps<T>, Rc<RowModel<T>>>,
    pub paginated: Memo<paginated::PaginatedDeps<T>, Rc<RowModel<T>>>,
    pub ordered_columns: Memo<column_ordering::OrderDeps<T>, ColumnList<T>>,
    pub visible_columns: Memo<column_visibility::VisibleDeps<T>, ColumnList<T>>,
    pub header_groups: Memo<header::HeaderDeps<T>, Rc<Vec<HeaderGroup<T>>>>,
}

impl<T: RowData> TableCaches<T> {
    fn new() -> Self {
        TableCaches {
            graph: Memo::new("table.entity_graph"),
            core: Memo::new("table.core_row_model"),
            filtered: Memo::new("table.filtered_row_model"),
            sorted: Memo::new("table.sorted_row_model"),
            grouped: Memo::new("table.grouped_row_model"),
            expanded: Memo::new("table.expanded_row_model"),
            paginated: Memo::new("table.paginated_row_model"),
            ordered_columns: Memo::new("table.ordered_leaf_columns"),
            visible_columns: Memo::new("table.visible_leaf_columns"),
            header_groups: Memo::new("table.header_groups"),
        }
    }

    fn set_debug(&self, debug: bool) {
        self.graph.set_debug(debug);
        self.core.set_debug(debug);
        self.filtered.set_debug(debug);
        self.sorted.set_debug(debug);
        self.grouped.set_debug(debug);
        self.expanded.set_debug(debug);
        self.paginated.set_debug(debug);
        self.ordered_columns.set_debug(debug);
        self.visible_columns.set_debug(debug);
        self.header_groups.set_debug(debug);
    }
}

// ============================================================================
// TABLE
// ============================================================================

pub struct Table<T: RowData> {
    options: RefCell<TableOptions<T>>,
    store: RefCell<TableState>,
    initial_state: TableState,
    generation: Cell<u64>,
    registry: FeatureRegistry<T>,
    defaults: TableDefaults,
    pub(crate) caches: TableCaches<T>,
}

impl<T: RowData> Table<T> {
    /// Assembles a table from options and an ordered feature list.
    ///
    /// Fails on duplicate features, conflicting state slices, column
    /// definitions without an id, and unknown processing function names.
    pub fn new(options: TableOptions<T>, features: Vec<Rc<dyn TableFeature<T>>>) -> Result<Self> {
        let registry = FeatureRegistry::new(features)?;
        let defaults = registry.default_options();
        let initial_state = registry.initial_state(&options.initial_state)?;
        let debug = options.settings.debug_enabled();

        let table = Table {
            options: RefCell::new(options),
            store: RefCell::new(initial_state.clone()),
            initial_state,
            generation: Cell::new(0),
            registry,
            defaults,
            caches: TableCaches::new(),
        };
        table.caches.set_debug(debug);
        if debug {
            log::debug!("table created with features {:?}", table.registry.names());
        }

        table.entity_graph()?;
        for feature in table.registry.features().iter() {
            feature.construct_table(&table)?;
        }
        Ok(table)
    }

    /// A table with every built-in feature.
    pub fn with_stock_features(options: TableOptions<T>) -> Result<Self> {
        Table::new(options, features::stock_features())
    }

    // ------------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------------

    pub fn options(&self) -> TableOptions<T> {
        self.options.borrow().clone()
    }

    /// Short-lived read access. Never hold across a callback into user code.
    pub(crate) fn opts(&self) -> Ref<'_, TableOptions<T>> {
        self.options.borrow()
    }

    pub fn settings(&self) -> TableSettings {
        self.options.borrow().settings.clone()
    }

    pub fn set_options(&self, updater: impl FnOnce(TableOptions<T>) -> TableOptions<T>) {
        let next = updater(self.options());
        let debug = next.settings.debug_enabled();
        *self.options.borrow_mut() = next;
        self.caches.set_debug(debug);
    }

    pub fn set_data(&self, data: Vec<T>) {
        self.set_options(|options| TableOptions {
            data: Rc::new(data),
            ..options
        });
    }

    /// Feature defaults overlaid with the user's options for one slice.
    pub fn slice_options(&self, name: &str) -> SliceOptions {
        let base = self.defaults.slices.get(name).cloned().unwrap_or_default();
        match self.options.borrow().slices.get(name) {
            Some(user) => base.overlaid(user),
            None => base,
        }
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    /// Internal state with controlled slices applied on top.
    pub fn get_state(&self) -> TableState {
        self.store.borrow().merged(&self.options.borrow().state)
    }

    pub fn get_initial_state(&self) -> TableState {
        self.initial_state.clone()
    }

    /// Current value of one slice, controlled value first.
    pub fn slice_value(&self, name: &str) -> Option<SliceValue> {
        if let Some(value) = self.options.borrow().state.get_raw(name) {
            return Some(Rc::clone(value));
        }
        self.store.borrow().get_raw(name).cloned()
    }

    pub fn get_slice<S: Clone + 'static>(&self, name: &str) -> Option<S> {
        self.slice_value(name)
            .and_then(|value| downcast_slice::<S>(&value).cloned())
    }

    /// Typed read falling back to the initial value, then `S::default()`.
    pub fn slice_or_default<S: Clone + Default + 'static>(&self, name: &str) -> S {
        self.get_slice::<S>(name)
            .unwrap_or_else(|| self.slice_fallback::<S>(name))
    }

    fn slice_fallback<S: Clone + Default + 'static>(&self, name: &str) -> S {
        self.initial_state.get::<S>(name).cloned().unwrap_or_default()
    }

    /// Bumped on every published state change.
    pub fn state_generation(&self) -> u64 {
        self.generation.get()
    }

    /// The single state mutation path: resolve, publish, then notify.
    pub fn set_state(&self, updater: Updater<TableState>) {
        let next = updater.resolve(&self.get_state());
        *self.store.borrow_mut() = next;
        self.generation.set(self.generation.get() + 1);

        let on_state_change = self.options.borrow().on_state_change.clone();
        if let Some(on_state_change) = on_state_change {
            on_state_change(&updater);
        }
    }

    /// Dispatches an update for one slice.
    ///
    /// A slice whose `enabled` option is `false` ignores the update. A slice
    /// with an `on_change` override hands the (type-erased) updater to it;
    /// otherwise the update is folded into the table state.
    pub fn set_slice<S>(&self, name: &str, updater: Updater<S>)
    where
        S: StateSlice + Clone + Default,
    {
        let options = self.slice_options(name);
        if options.is_disabled() {
            log::warn!("ignoring update to disabled state slice '{}'", name);
            return;
        }
        log::debug!("state update: {}", name);

        let erased = match updater {
            Updater::Replace(value) => Updater::Replace(slice(value)),
            Updater::Transform(f) => {
                let fallback = self.slice_fallback::<S>(name);
                Updater::Transform(Rc::new(move |old: &SliceValue| {
                    let next = match downcast_slice::<S>(old) {
                        Some(old) => f(old),
                        None => f(&fallback),
                    };
                    slice(next)
                }))
            }
        };

        match options.on_change {
            Some(on_change) => on_change(erased),
            None => self.apply_slice_update(name, erased),
        }
    }

    /// The default state updater for a slice: applies `updater` to the
    /// slice inside the composite state through `set_state`.
    pub fn apply_slice_update(&self, name: &str, updater: Updater<SliceValue>) {
        let name = name.to_string();
        let fallback = self.initial_state.get_raw(&name).cloned();
        self.set_state(Updater::transform(move |old: &TableState| {
            let current = old
                .get_raw(&name)
                .cloned()
                .or_else(|| fallback.clone())
                .unwrap_or_else(|| slice(()));
            old.with_raw(&name, updater.resolve(&current))
        }));
    }

    /// Republishes the initial state.
    pub fn reset(&self) {
        self.set_state(Updater::Replace(self.initial_state.clone()));
    }

    // ------------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------------

    pub fn entity_graph(&self) -> Result<Rc<EntityGraph<T>>> {
        self.caches.graph.get(
            || {
                let options = self.options.borrow();
                Ok((ByRef::new(&options.columns), ByRef::new(&options.processing_fns)))
            },
            |(columns, fns)| EntityGraph::build(columns, self.registry.features(), fns).map(Rc::new),
        )
    }

    pub fn all_columns(&self) -> Result<Vec<Rc<Column<T>>>> {
        Ok(self.entity_graph()?.columns().to_vec())
    }

    pub fn all_flat_columns(&self) -> Result<Vec<Rc<Column<T>>>> {
        Ok(self.entity_graph()?.flat_columns().to_vec())
    }

    /// Leaf columns in declaration order.
    pub fn all_leaf_columns(&self) -> Result<Rc<Vec<Rc<Column<T>>>>> {
        Ok(Rc::clone(self.entity_graph()?.leaf_columns()))
    }

    pub fn column(&self, id: &str) -> Result<Rc<Column<T>>> {
        self.entity_graph()?
            .column(id)
            .cloned()
            .ok_or_else(|| TableError::ColumnNotFound(id.to_string()))
    }

    // ------------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------------

    pub fn core_row_model(&self) -> Result<Rc<RowModel<T>>> {
        let graph = self.entity_graph()?;
        self.caches.core.get(
            || {
                let options = self.options.borrow();
                Ok(CoreDeps {
                    data: ByRef::new(&options.data),
                    graph: ByRef::new(&graph),
                    get_row_id: fn_identity(&options.get_row_id),
                    get_sub_rows: fn_identity(&options.get_sub_rows),
                })
            },
            |deps| {
                let (get_row_id, get_sub_rows) = {
                    let options = self.options.borrow();
                    (options.get_row_id.clone(), options.get_sub_rows.clone())
                };
                build_core_row_model(&deps.graph.0, &deps.data, get_row_id.as_ref(), get_sub_rows.as_ref())
                    .map(Rc::new)
            },
        )
    }

    /// The final row model: the current page.
    pub fn row_model(&self) -> Result<Rc<RowModel<T>>> {
        self.paginated_row_model()
    }

    /// Looks a row up in the current page (or, with `search_all`, in the
    /// model before pagination), falling back to the core model.
    pub fn get_row(&self, id: &str, search_all: bool) -> Result<Rc<Row<T>>> {
        let model = if search_all {
            self.pre_pagination_row_model()?
        } else {
            self.row_model()?
        };
        if let Some(row) = model.row(id) {
            return Ok(Rc::clone(row));
        }
        self.core_row_model()?
            .row(id)
            .cloned()
            .ok_or_else(|| TableError::RowNotFound(id.to_string()))
    }

    /// Ancestors of a row, root first.
    pub fn row_parent_rows(&self, row: &Row<T>) -> Result<Vec<Rc<Row<T>>>> {
        let mut parents = Vec::new();
        let mut parent_id = row.parent_id.clone();
        while let Some(id) = parent_id {
            let parent = self.get_row(&id, true)?;
            parent_id = parent.parent_id.clone();
            parents.push(parent);
        }
        parents.reverse();
        Ok(parents)
    }
}

impl<T: RowData> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("features", &self.registry.names())
            .field("state", &self.get_state())
            .field("generation", &self.generation.get())
            .finish()
    }
}
