//! FILENAME: value/src/lib.rs
//! PURPOSE: Shared value types for the table engine.
//! CONTEXT: Every accessor, filter, sort and aggregation function in
//! `table-core` speaks `CellValue`. Keeping it in its own crate lets
//! applications build row data without pulling in the engine.

pub mod cell;
pub mod ordering;

pub use cell::{CellValue, ValueKind};
pub use ordering::{compare_values, OrderedFloat};
