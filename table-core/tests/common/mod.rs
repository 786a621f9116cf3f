//! FILENAME: table-core/tests/common/mod.rs
//! Fixtures for table-core integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use table_core::{ColumnDef, RowModel, Table, TableOptions};

/// Six people with a mix of text, numbers and one missing age.
pub fn people() -> Vec<Value> {
    vec![
        json!({"name": "Ada", "age": 36, "status": "single", "visits": 10}),
        json!({"name": "Grace", "age": 85, "status": "married", "visits": 40}),
        json!({"name": "Alan", "age": 41, "status": "single", "visits": 10}),
        json!({"name": "Edsger", "age": 72, "status": "married", "visits": 25}),
        json!({"name": "Barbara", "status": "complicated", "visits": 5}),
        json!({"name": "Donald", "age": 41, "status": "married", "visits": 33}),
    ]
}

pub fn people_columns() -> Vec<ColumnDef<Value>> {
    vec![
        ColumnDef::accessor("name"),
        ColumnDef::accessor("age").aggregation_fn("mean"),
        ColumnDef::accessor("status"),
        ColumnDef::accessor("visits").aggregation_fn("sum"),
    ]
}

pub fn people_options() -> TableOptions<Value> {
    TableOptions::new(people(), people_columns())
}

pub fn people_table() -> Table<Value> {
    Table::with_stock_features(people_options()).expect("people table")
}

/// Two-level tree data: each record may carry `children`.
pub fn tree() -> Vec<Value> {
    vec![
        json!({"name": "root-a", "size": 1, "children": [
            {"name": "leaf-a1", "size": 10},
            {"name": "match-a2", "size": 20},
        ]}),
        json!({"name": "match-b", "size": 2, "children": [
            {"name": "leaf-b1", "size": 30},
        ]}),
        json!({"name": "root-c", "size": 3}),
    ]
}

pub fn tree_options() -> TableOptions<Value> {
    TableOptions::new(
        tree(),
        vec![ColumnDef::accessor("name"), ColumnDef::accessor("size")],
    )
    .get_sub_rows(|record: &Value| {
        record
            .get("children")
            .and_then(Value::as_array)
            .cloned()
    })
}

pub fn tree_table() -> Table<Value> {
    Table::with_stock_features(tree_options()).expect("tree table")
}

/// Top-level row ids in order.
pub fn ids(model: &RowModel<Value>) -> Vec<String> {
    model.rows.iter().map(|row| row.id.clone()).collect()
}

/// Display text of one column for every top-level row.
pub fn column_text(model: &RowModel<Value>, column_id: &str) -> Vec<String> {
    model
        .rows
        .iter()
        .map(|row| row.get_value(column_id).expect("value").to_string())
        .collect()
}

/// `count` synthetic records for larger tests and benches.
pub fn numbered(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"name": format!("row {}", i), "age": (i * 7) % 90, "visits": i % 13}))
        .collect()
}
