//! FILENAME: table-core/tests/test_pipeline.rs
//! PURPOSE: Row model pipeline caching, pass-through and ordering.

mod common;

use std::rc::Rc;
use common::*;
use table_core::{ColumnFilter, ColumnSort, PaginationState, Table, TableOptions};

// ============================================================================
// MEMOIZATION
// ============================================================================

#[test]
fn test_repeated_reads_return_same_model() {
    let table = people_table();
    let first = table.row_model().unwrap();
    let second = table.row_model().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_inactive_pipeline_passes_core_through() {
    let table = people_table();
    let core = table.core_row_model().unwrap();
    assert!(Rc::ptr_eq(&core, &table.filtered_row_model().unwrap()));
    assert!(Rc::ptr_eq(&core, &table.sorted_row_model().unwrap()));
    assert!(Rc::ptr_eq(&core, &table.grouped_row_model().unwrap()));
    assert!(Rc::ptr_eq(&core, &table.expanded_row_model().unwrap()));
    assert!(Rc::ptr_eq(&core, &table.paginated_row_model().unwrap()));
}

#[test]
fn test_unrelated_update_keeps_upstream_models() {
    let table = people_table();
    table.set_sorting(vec![ColumnSort::asc("name")]);
    let filtered = table.filtered_row_model().unwrap();
    let sorted = table.sorted_row_model().unwrap();

    table.set_pagination(PaginationState::new(0, 2));
    assert!(Rc::ptr_eq(&filtered, &table.filtered_row_model().unwrap()));
    assert!(Rc::ptr_eq(&sorted, &table.sorted_row_model().unwrap()));
    assert_eq!(table.row_model().unwrap().rows.len(), 2);
}

#[test]
fn test_equal_state_value_does_not_recompute() {
    let table = people_table();
    table.set_sorting(vec![ColumnSort::asc("name")]);
    let sorted = table.sorted_row_model().unwrap();

    table.set_sorting(vec![ColumnSort::asc("name")]);
    assert!(Rc::ptr_eq(&sorted, &table.sorted_row_model().unwrap()));
}

#[test]
fn test_new_data_rebuilds_core() {
    let table = people_table();
    let core = table.core_row_model().unwrap();
    table.set_data(numbered(3));
    let rebuilt = table.core_row_model().unwrap();
    assert!(!Rc::ptr_eq(&core, &rebuilt));
    assert_eq!(rebuilt.rows.len(), 3);
}

// ============================================================================
// STAGE COMPOSITION
// ============================================================================

#[test]
fn test_filter_sort_paginate_compose() {
    let table = people_table();
    table.set_column_filters(vec![ColumnFilter::new("status", "married")]);
    table.set_sorting(vec![ColumnSort::desc("age")]);
    table.set_pagination(PaginationState::new(0, 2));

    let page = table.row_model().unwrap();
    assert_eq!(column_text(&page, "name"), vec!["Grace", "Edsger"]);

    table.next_page().unwrap();
    let page = table.row_model().unwrap();
    assert_eq!(column_text(&page, "name"), vec!["Donald"]);
}

#[test]
fn test_pipeline_without_features_is_core() {
    let table = Table::new(people_options(), Vec::new()).unwrap();
    let core = table.core_row_model().unwrap();
    assert!(Rc::ptr_eq(&core, &table.row_model().unwrap()));
    assert!(table.get_state().is_empty());
}

#[test]
fn test_get_row_searches_beyond_current_page() {
    let table = people_table();
    table.set_pagination(PaginationState::new(0, 2));
    assert_eq!(table.row_model().unwrap().rows.len(), 2);

    let row = table.get_row("5", false).unwrap();
    assert_eq!(row.get_value("name").unwrap().to_string(), "Donald");
    assert!(table.get_row("99", true).is_err());
}

#[test]
fn test_custom_row_ids() {
    let options: TableOptions<serde_json::Value> = people_options().get_row_id(
        |record: &serde_json::Value, _: usize, _: Option<&str>| {
            record["name"].as_str().unwrap_or_default().to_lowercase()
        },
    );
    let table = Table::with_stock_features(options).unwrap();
    let model = table.core_row_model().unwrap();
    assert_eq!(ids(&model)[0], "ada");
    assert!(model.rows_by_id.contains_key("grace"));
}
