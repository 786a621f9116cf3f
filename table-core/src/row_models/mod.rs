//! FILENAME: table-core/src/row_models/mod.rs
//! PURPOSE: The derived row model stages.
//! CONTEXT: core -> filtered -> sorted -> grouped -> expanded -> paginated.
//! Each stage reads the previous one and is memoized on it plus its own
//! state slice. A stage whose feature is absent, or whose state is inactive,
//! returns its input unchanged.

pub mod expanded;
pub mod filtered;
pub mod grouped;
pub mod paginated;
pub mod sorted;
