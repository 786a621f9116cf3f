//! FILENAME: table-core/src/feature.rs
//! PURPOSE: The feature contract and the registry that composes features.
//! CONTEXT: A feature is a descriptor with optional contributions: state
//! slices, default slice options, and construct hooks for the table, its
//! columns, rows and cells. The registry is fixed when the table is built.
//! Features never know about each other; the only enforced rule is that two
//! features may not claim the same slice name with different value types.
//!
//! Built-in features expose their API as inherent methods on `Table<T>` in
//! their own modules. A user-authored feature exposes its API through an
//! extension trait implemented for `Table<T>`.

use std::any::{Any, TypeId};
use std::rc::Rc;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::column::Column;
use crate::error::{Result, TableError};
use crate::fns::ProcessingFns;
use crate::graph::FeatureList;
use crate::options::TableDefaults;
use crate::row::{Cell, Row, RowData};
use crate::state::{SliceValue, TableState};
use crate::table::Table;

/// Name used in duplicate-slice errors for slices seeded by the caller.
const SEED: &str = "initial_state";

pub trait TableFeature<T: RowData> {
    /// Unique feature name.
    fn name(&self) -> &'static str;

    /// Slices this feature owns, with their default values.
    fn initial_state(&self) -> Vec<(&'static str, SliceValue)> {
        Vec::new()
    }

    /// Default slice options. User options override these.
    fn default_options(&self, _defaults: &mut TableDefaults) {}

    /// Runs once after the table is assembled.
    fn construct_table(&self, _table: &Table<T>) -> Result<()> {
        Ok(())
    }

    /// Runs once per column when the column tree is built.
    fn construct_column(&self, _column: &mut Column<T>, _fns: &ProcessingFns) -> Result<()> {
        Ok(())
    }

    /// Runs once per row created by the core or grouped row model.
    fn construct_row(&self, _row: &mut Row<T>) -> Result<()> {
        Ok(())
    }

    /// Runs once per cell when a row builds its cells.
    fn construct_cell(&self, _cell: &mut Cell, _row: &Row<T>, _column: &Column<T>) -> Result<()> {
        Ok(())
    }
}

fn slice_type(value: &SliceValue) -> TypeId {
    Any::type_id(value.as_any())
}

pub struct FeatureRegistry<T: RowData> {
    features: FeatureList<T>,
}

impl<T: RowData> FeatureRegistry<T> {
    pub fn new(features: Vec<Rc<dyn TableFeature<T>>>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for feature in &features {
            if !seen.insert(feature.name()) {
                return Err(TableError::DuplicateFeature(feature.name().to_string()));
            }
        }
        Ok(FeatureRegistry {
            features: Rc::from(features),
        })
    }

    pub fn features(&self) -> &FeatureList<T> {
        &self.features
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    /// Folds every feature's slices into `seed`. Seeded values and earlier
    /// features win; a slice claimed with a different value type is an error.
    pub fn initial_state(&self, seed: &TableState) -> Result<TableState> {
        let mut state = seed.clone();
        let mut owners: FxHashMap<&'static str, (&'static str, TypeId)> = FxHashMap::default();

        for feature in self.features.iter() {
            for (name, value) in feature.initial_state() {
                let ty = slice_type(&value);
                if let Some((owner, owner_ty)) = owners.get(name) {
                    if *owner_ty != ty {
                        return Err(TableError::DuplicateStateSlice {
                            slice: name.to_string(),
                            first: owner.to_string(),
                            second: feature.name().to_string(),
                        });
                    }
                    continue;
                }
                owners.insert(name, (feature.name(), ty));

                match seed.get_raw(name) {
                    Some(seeded) if slice_type(seeded) != ty => {
                        return Err(TableError::DuplicateStateSlice {
                            slice: name.to_string(),
                            first: SEED.to_string(),
                            second: feature.name().to_string(),
                        });
                    }
                    Some(_) => {}
                    None => state.insert_raw(name, value),
                }
            }
        }
        Ok(state)
    }

    pub fn default_options(&self) -> TableDefaults {
        let mut defaults = TableDefaults::default();
        for feature in self.features.iter() {
            feature.default_options(&mut defaults);
        }
        defaults
    }
}
