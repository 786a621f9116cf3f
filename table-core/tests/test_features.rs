//! FILENAME: table-core/tests/test_features.rs
//! PURPOSE: Composing user-authored features with the built-in ones.

mod common;

use std::rc::Rc;
use common::*;
use serde::Serialize;
use serde_json::{json, Value};
use table_core::features::RowSorting;
use table_core::options::SliceOptions;
use table_core::{
    slice, Cell, Column, ColumnSort, ProcessingFns, Result, Row, RowData,
    SliceValue, Table, TableDefaults, TableError, TableFeature, TableOptions, TableState, Updater,
};

// ============================================================================
// A DENSITY FEATURE
// ============================================================================

const DENSITY: &str = "density";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
enum Density {
    Sm,
    #[default]
    Md,
    Lg,
}

struct DensityFeature;

impl<T: RowData> TableFeature<T> for DensityFeature {
    fn name(&self) -> &'static str {
        "density"
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(DENSITY, slice(Density::Md))]
    }

    fn default_options(&self, defaults: &mut TableDefaults) {
        defaults.slice(DENSITY, SliceOptions::enabled(true));
    }
}

trait DensityExt {
    fn density(&self) -> Density;
    fn set_density(&self, updater: impl Into<Updater<Density>>);
    fn toggle_density(&self);
}

impl<T: RowData> DensityExt for Table<T> {
    fn density(&self) -> Density {
        self.slice_or_default(DENSITY)
    }

    fn set_density(&self, updater: impl Into<Updater<Density>>) {
        self.set_slice(DENSITY, updater.into());
    }

    fn toggle_density(&self) {
        self.set_density(Updater::transform(|old: &Density| match old {
            Density::Sm => Density::Md,
            Density::Md => Density::Lg,
            Density::Lg => Density::Sm,
        }));
    }
}

fn density_table(options: TableOptions<Value>) -> Table<Value> {
    let features: Vec<Rc<dyn TableFeature<Value>>> = vec![Rc::new(DensityFeature), Rc::new(RowSorting)];
    Table::new(options, features).unwrap()
}

#[test]
fn test_custom_slice_lives_beside_sorting() {
    let table = density_table(people_options());
    assert_eq!(table.density(), Density::Md);
    assert_eq!(table.feature_names(), vec!["density", "row_sorting"]);

    table.set_sorting(vec![ColumnSort::asc("name")]);
    table.toggle_density();

    assert_eq!(table.density(), Density::Lg);
    assert_eq!(column_text(&table.sorted_row_model().unwrap(), "name")[0], "Ada");
    assert_eq!(
        table.get_state().to_json(),
        json!({"density": "lg", "sorting": [{"id": "name", "desc": false}]})
    );
}

#[test]
fn test_custom_slice_does_not_disturb_sorting() {
    let with_density = density_table(people_options());
    let stock = people_table();
    for table in [&with_density, &stock] {
        table.toggle_sorting("age", None, false).unwrap();
    }
    assert_eq!(with_density.sorting_state(), stock.sorting_state());
    assert_eq!(
        column_text(&with_density.sorted_row_model().unwrap(), "name"),
        column_text(&stock.sorted_row_model().unwrap(), "name")
    );
}

#[test]
fn test_custom_slice_can_be_disabled() {
    let table = density_table(people_options().enable(DENSITY, false));
    table.toggle_density();
    assert_eq!(table.density(), Density::Md);
}

#[test]
fn test_custom_slice_change_goes_to_collaborator() {
    let seen: Rc<std::cell::RefCell<Vec<Value>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let options = people_options().on_slice_change(DENSITY, move |updater| {
        let next = updater.resolve(&slice(Density::Sm));
        sink.borrow_mut().push(next.to_json().unwrap());
    });
    let table = density_table(options);
    table.toggle_density();

    assert_eq!(table.density(), Density::Md);
    assert_eq!(*seen.borrow(), vec![json!("md")]);
}

// ============================================================================
// REGISTRY RULES
// ============================================================================

struct TextDensity;

impl<T: RowData> TableFeature<T> for TextDensity {
    fn name(&self) -> &'static str {
        "text_density"
    }

    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        vec![(DENSITY, slice("md".to_string()))]
    }
}

#[test]
fn test_conflicting_slice_types_are_rejected() {
    let features: Vec<Rc<dyn TableFeature<Value>>> = vec![Rc::new(DensityFeature), Rc::new(TextDensity)];
    let err = Table::new(people_options(), features).unwrap_err();
    assert_eq!(
        err,
        TableError::DuplicateStateSlice {
            slice: "density".to_string(),
            first: "density".to_string(),
            second: "text_density".to_string(),
        }
    );
}

#[test]
fn test_seeded_slice_with_wrong_type_is_rejected() {
    let seed = TableState::new().set(DENSITY, 3_u8);
    let features: Vec<Rc<dyn TableFeature<Value>>> = vec![Rc::new(DensityFeature)];
    let err = Table::new(people_options().with_initial_state(seed), features).unwrap_err();
    assert!(matches!(err, TableError::DuplicateStateSlice { ref first, .. } if first == "initial_state"));
}

#[test]
fn test_feature_registered_twice_is_rejected() {
    let features: Vec<Rc<dyn TableFeature<Value>>> = vec![Rc::new(RowSorting), Rc::new(RowSorting)];
    let err = Table::new(people_options(), features).unwrap_err();
    assert_eq!(err, TableError::DuplicateFeature("row_sorting".to_string()));
}

// ============================================================================
// CONSTRUCT HOOKS
// ============================================================================

#[derive(Debug, PartialEq)]
struct WidthHint(usize);

#[derive(Debug, PartialEq)]
struct Shouting(String);

struct Annotations;

impl TableFeature<Value> for Annotations {
    fn name(&self) -> &'static str {
        "annotations"
    }

    fn construct_column(&self, column: &mut Column<Value>, _fns: &ProcessingFns) -> Result<()> {
        column.extensions.insert(WidthHint(column.id.len() * 10));
        Ok(())
    }

    fn construct_row(&self, row: &mut Row<Value>) -> Result<()> {
        row.extensions.insert(WidthHint(row.depth));
        Ok(())
    }

    fn construct_cell(&self, cell: &mut Cell, _row: &Row<Value>, _column: &Column<Value>) -> Result<()> {
        cell.extensions.insert(Shouting(cell.value.to_string().to_uppercase()));
        Ok(())
    }
}

#[test]
fn test_hooks_decorate_every_entity() {
    let features: Vec<Rc<dyn TableFeature<Value>>> = vec![Rc::new(Annotations)];
    let table = Table::new(people_options(), features).unwrap();

    let column = table.column("name").unwrap();
    assert_eq!(column.extensions.get::<WidthHint>(), Some(&WidthHint(40)));

    let row = table.get_row("1", false).unwrap();
    assert_eq!(row.extensions.get::<WidthHint>(), Some(&WidthHint(0)));
    let cell = row.cell("name").unwrap();
    assert_eq!(cell.extensions.get::<Shouting>(), Some(&Shouting("GRACE".to_string())));
}

#[test]
fn test_cells_are_built_once_per_row() {
    let table = people_table();
    let row = table.get_row("0", false).unwrap();
    let first = row.all_cells().unwrap();
    assert!(Rc::ptr_eq(&first, &row.all_cells().unwrap()));
    assert_eq!(first.len(), 4);
    assert_eq!(first[0].id, "0_name");
}
