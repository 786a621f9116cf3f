//! FILENAME: table-core/src/state.rs
//! PURPOSE: The composite table state and the functional-update type.
//! CONTEXT: Table state is a flat record from slice name to that feature's
//! value. The set of slices is open: any feature may contribute one, so the
//! record is a map of type-erased, immutable slice values. Replacing state
//! always produces a new `TableState`; slices are never mutated in place.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use serde::Serialize;
use crate::error::{Result, TableError};

// ============================================================================
// STATE SLICES
// ============================================================================

/// A value that can live in the table state.
/// Implemented for every `Debug + PartialEq + Serialize + 'static` type.
pub trait StateSlice: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Value equality against another (possibly differently typed) slice.
    fn slice_eq(&self, other: &dyn StateSlice) -> bool;

    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<S> StateSlice for S
where
    S: Any + fmt::Debug + PartialEq + Serialize,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn slice_eq(&self, other: &dyn StateSlice) -> bool {
        other
            .as_any()
            .downcast_ref::<S>()
            .map_or(false, |other| self == other)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// A shared, immutable slice value.
pub type SliceValue = Rc<dyn StateSlice>;

/// Wraps a concrete slice into a `SliceValue`.
pub fn slice<S: StateSlice>(value: S) -> SliceValue {
    Rc::new(value)
}

/// Downcasts a slice value, if it holds an `S`.
pub fn downcast_slice<S: 'static>(value: &SliceValue) -> Option<&S> {
    value.as_any().downcast_ref::<S>()
}

/// Reference-or-value equality for slice values, used as memo dependencies.
#[derive(Clone, Debug)]
pub struct SliceDep(pub Option<SliceValue>);

impl PartialEq for SliceDep {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b) || a.slice_eq(b.as_ref()),
            _ => false,
        }
    }
}

// ============================================================================
// UPDATERS
// ============================================================================

/// A state change: either a replacement value or a pure function of the
/// previous value. Transforms are `Fn` so a notified collaborator can apply
/// the same updater to its own copy of the state.
pub enum Updater<T> {
    Replace(T),
    Transform(Rc<dyn Fn(&T) -> T>),
}

impl<T: Clone> Updater<T> {
    pub fn transform(f: impl Fn(&T) -> T + 'static) -> Self {
        Updater::Transform(Rc::new(f))
    }

    /// Resolves the updater against the current value.
    pub fn resolve(&self, old: &T) -> T {
        match self {
            Updater::Replace(value) => value.clone(),
            Updater::Transform(f) => f(old),
        }
    }
}

impl<T: Clone> Clone for Updater<T> {
    fn clone(&self) -> Self {
        match self {
            Updater::Replace(value) => Updater::Replace(value.clone()),
            Updater::Transform(f) => Updater::Transform(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Updater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Updater::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Updater::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl<T> From<T> for Updater<T> {
    fn from(value: T) -> Self {
        Updater::Replace(value)
    }
}

/// Applies an updater to an old value.
pub fn functional_update<T: Clone>(updater: &Updater<T>, old: &T) -> T {
    updater.resolve(old)
}

// ============================================================================
// TABLE STATE
// ============================================================================

/// The union of every active feature's state slice.
#[derive(Clone, Default)]
pub struct TableState {
    slices: BTreeMap<String, SliceValue>,
}

impl TableState {
    pub fn new() -> Self {
        TableState::default()
    }

    /// Typed read of a slice. `None` when absent or of another type.
    pub fn get<S: 'static>(&self, name: &str) -> Option<&S> {
        self.slices.get(name).and_then(downcast_slice::<S>)
    }

    pub fn get_raw(&self, name: &str) -> Option<&SliceValue> {
        self.slices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slices.contains_key(name)
    }

    pub fn slice_names(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Returns a copy of this state with one slice replaced.
    pub fn with<S: StateSlice>(&self, name: &str, value: S) -> TableState {
        self.with_raw(name, slice(value))
    }

    pub fn with_raw(&self, name: &str, value: SliceValue) -> TableState {
        let mut next = self.clone();
        next.slices.insert(name.to_string(), value);
        next
    }

    /// Builder-style insert, for assembling initial/controlled state.
    pub fn set<S: StateSlice>(mut self, name: &str, value: S) -> Self {
        self.slices.insert(name.to_string(), slice(value));
        self
    }

    pub(crate) fn insert_raw(&mut self, name: &str, value: SliceValue) {
        self.slices.insert(name.to_string(), value);
    }

    /// Every slice of `overrides` replaces the same-named slice here.
    pub fn merged(&self, overrides: &TableState) -> TableState {
        if overrides.is_empty() {
            return self.clone();
        }
        let mut next = self.clone();
        for (name, value) in &overrides.slices {
            next.slices.insert(name.clone(), Rc::clone(value));
        }
        next
    }

    /// The flat `{ slice: value }` layout suitable for external persistence.
    /// A slice that fails to serialize is logged and written as `null`;
    /// use [`TableState::try_to_json`] to treat that as an error.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .slices
            .iter()
            .map(|(name, value)| {
                let json = value.to_json().unwrap_or_else(|e| {
                    log::warn!("state slice '{}' failed to serialize: {}", name, e);
                    serde_json::Value::Null
                });
                (name.clone(), json)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    pub fn try_to_json(&self) -> Result<serde_json::Value> {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.slices {
            let json = value.to_json().map_err(|e| TableError::StateSerialization {
                slice: name.clone(),
                message: e.to_string(),
            })?;
            map.insert(name.clone(), json);
        }
        Ok(serde_json::Value::Object(map))
    }
}

impl PartialEq for TableState {
    fn eq(&self, other: &Self) -> bool {
        self.slices.len() == other.slices.len()
            && self.slices.iter().all(|(name, value)| {
                other
                    .slices
                    .get(name)
                    .map_or(false, |o| Rc::ptr_eq(value, o) || value.slice_eq(o.as_ref()))
            })
    }
}

impl fmt::Debug for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slices.iter()).finish()
    }
}
