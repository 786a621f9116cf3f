//! FILENAME: table-core/tests/test_sorting.rs
//! PURPOSE: Sorted row model and sort toggling.

mod common;

use std::rc::Rc;
use common::*;
use serde_json::json;
use table_core::{
    ColumnDef, ColumnSort, FnKind, SortDirection, SortUndefined, Table, TableError, TableOptions,
    TableSettings,
};

fn sorted_names(table: &Table<serde_json::Value>) -> Vec<String> {
    column_text(&table.sorted_row_model().unwrap(), "name")
}

// ============================================================================
// SORTED ROW MODEL
// ============================================================================

#[test]
fn test_ascending_sort_is_stable() {
    let table = people_table();
    table.set_sorting(vec![ColumnSort::asc("age")]);
    assert_eq!(
        sorted_names(&table),
        vec!["Ada", "Alan", "Donald", "Edsger", "Grace", "Barbara"]
    );
}

#[test]
fn test_descending_sort_puts_missing_first_by_default() {
    let table = people_table();
    table.set_sorting(vec![ColumnSort::desc("age")]);
    assert_eq!(
        sorted_names(&table),
        vec!["Barbara", "Grace", "Edsger", "Alan", "Donald", "Ada"]
    );
}

#[test]
fn test_missing_values_last_in_both_directions() {
    let columns = vec![
        ColumnDef::accessor("name"),
        ColumnDef::accessor("age").sort_undefined(SortUndefined::Last),
    ];
    let table = Table::with_stock_features(TableOptions::new(people(), columns)).unwrap();
    table.set_sorting(vec![ColumnSort::desc("age")]);
    assert_eq!(sorted_names(&table).last().map(String::as_str), Some("Barbara"));
    table.set_sorting(vec![ColumnSort::asc("age")]);
    assert_eq!(sorted_names(&table).last().map(String::as_str), Some("Barbara"));
}

#[test]
fn test_multi_column_sort() {
    let table = people_table();
    table.set_sorting(vec![ColumnSort::asc("status"), ColumnSort::desc("age")]);
    assert_eq!(
        sorted_names(&table),
        vec!["Barbara", "Grace", "Edsger", "Donald", "Alan", "Ada"]
    );
}

#[test]
fn test_inverted_column() {
    let columns = vec![
        ColumnDef::accessor("name"),
        ColumnDef::accessor("age").invert_sorting(true),
    ];
    let table = Table::with_stock_features(TableOptions::new(people(), columns)).unwrap();
    table.set_sorting(vec![ColumnSort::asc("age")]);
    assert_eq!(sorted_names(&table)[1], "Grace");
}

#[test]
fn test_alphanumeric_text_sort() {
    let data = vec![json!({"item": "item10"}), json!({"item": "item2"}), json!({"item": "Item1"})];
    let table = Table::with_stock_features(TableOptions::new(data, vec![ColumnDef::accessor("item")])).unwrap();
    table.set_sorting(vec![ColumnSort::asc("item")]);
    assert_eq!(column_text(&table.sorted_row_model().unwrap(), "item"), vec!["Item1", "item2", "item10"]);
    assert_eq!(table.column_sort_fn("item").unwrap().name, "alphanumeric");
}

#[test]
fn test_tie_breaker_column() {
    let settings = TableSettings {
        sort_tie_breaker: Some("visits".to_string()),
        ..TableSettings::default()
    };
    let table = Table::with_stock_features(people_options().with_settings(settings)).unwrap();
    table.set_sorting(vec![ColumnSort::asc("status")]);
    assert_eq!(sorted_names(&table)[1..4], ["Edsger", "Donald", "Grace"]);
}

#[test]
fn test_children_are_sorted_too() {
    let table = tree_table();
    table.set_sorting(vec![ColumnSort::desc("size")]);
    let model = table.sorted_row_model().unwrap();
    assert_eq!(column_text(&model, "name"), vec!["root-c", "match-b", "root-a"]);
    let children: Vec<String> = model.rows[2]
        .sub_rows
        .iter()
        .map(|row| row.get_value("name").unwrap().to_string())
        .collect();
    assert_eq!(children, vec!["match-a2", "leaf-a1"]);
    assert_eq!(model.flat_rows.len(), 6);
}

#[test]
fn test_manual_sorting_passes_through() {
    let settings = TableSettings {
        manual_sorting: true,
        ..TableSettings::default()
    };
    let table = Table::with_stock_features(people_options().with_settings(settings)).unwrap();
    table.set_sorting(vec![ColumnSort::asc("name")]);
    let core = table.core_row_model().unwrap();
    assert!(Rc::ptr_eq(&core, &table.sorted_row_model().unwrap()));
}

#[test]
fn test_disabled_column_is_not_sorted() {
    let columns = vec![ColumnDef::accessor("name").enable_sorting(false)];
    let table = Table::with_stock_features(TableOptions::new(people(), columns)).unwrap();
    table.set_sorting(vec![ColumnSort::asc("name")]);
    assert!(!table.column_can_sort("name").unwrap());
    assert_eq!(sorted_names(&table)[0], "Ada");
    assert_eq!(sorted_names(&table)[1], "Grace");
}

#[test]
fn test_unknown_sort_fn_fails_construction() {
    let columns = vec![ColumnDef::accessor("name").sort_fn("natural")];
    let err = Table::with_stock_features(TableOptions::new(people(), columns)).unwrap_err();
    assert!(matches!(
        err,
        TableError::UnresolvedFunction { kind: FnKind::Sort, ref name, .. } if name == "natural"
    ));
}

// ============================================================================
// TOGGLING
// ============================================================================

#[test]
fn test_text_column_toggles_asc_desc_off() {
    let table = people_table();
    assert_eq!(table.column_first_sort_dir("name").unwrap(), SortDirection::Asc);

    table.toggle_sorting("name", None, false).unwrap();
    assert_eq!(table.column_is_sorted("name"), Some(SortDirection::Asc));
    table.toggle_sorting("name", None, false).unwrap();
    assert_eq!(table.column_is_sorted("name"), Some(SortDirection::Desc));
    table.toggle_sorting("name", None, false).unwrap();
    assert_eq!(table.column_is_sorted("name"), None);
}

#[test]
fn test_number_column_starts_descending() {
    let table = people_table();
    table.toggle_sorting("age", None, false).unwrap();
    assert_eq!(table.column_is_sorted("age"), Some(SortDirection::Desc));
    table.toggle_sorting("age", None, false).unwrap();
    assert_eq!(table.column_is_sorted("age"), Some(SortDirection::Asc));
}

#[test]
fn test_toggle_without_removal_cycles() {
    let settings = TableSettings {
        enable_sorting_removal: false,
        ..TableSettings::default()
    };
    let table = Table::with_stock_features(people_options().with_settings(settings)).unwrap();
    for _ in 0..3 {
        table.toggle_sorting("name", None, false).unwrap();
    }
    assert_eq!(table.column_is_sorted("name"), Some(SortDirection::Asc));
}

#[test]
fn test_multi_toggle_appends_and_single_replaces() {
    let table = people_table();
    table.toggle_sorting("name", None, false).unwrap();
    table.toggle_sorting("age", None, true).unwrap();
    assert_eq!(table.sorting_state(), vec![ColumnSort::asc("name"), ColumnSort::desc("age")]);
    assert_eq!(table.column_sort_index("age"), Some(1));

    table.toggle_sorting("status", None, false).unwrap();
    assert_eq!(table.sorting_state(), vec![ColumnSort::asc("status")]);
}

#[test]
fn test_multi_sort_count_limit() {
    let settings = TableSettings {
        max_multi_sort_col_count: Some(2),
        ..TableSettings::default()
    };
    let table = Table::with_stock_features(people_options().with_settings(settings)).unwrap();
    table.toggle_sorting("name", None, false).unwrap();
    table.toggle_sorting("age", None, true).unwrap();
    table.toggle_sorting("status", None, true).unwrap();
    let ids: Vec<String> = table.sorting_state().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["age", "status"]);
}

#[test]
fn test_forced_direction_and_clear() {
    let table = people_table();
    table.toggle_sorting("name", Some(true), false).unwrap();
    assert_eq!(table.column_is_sorted("name"), Some(SortDirection::Desc));
    table.clear_column_sorting("name");
    assert!(table.sorting_state().is_empty());

    table.set_sorting(vec![ColumnSort::asc("age")]);
    table.reset_sorting();
    assert!(table.sorting_state().is_empty());
}
