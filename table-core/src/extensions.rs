//! FILENAME: table-core/src/extensions.rs
//! PURPOSE: Typed per-entity storage filled by feature construct hooks.
//! CONTEXT: Columns, rows and cells each carry an `Extensions` map. A
//! feature's `construct_*` hook inserts whatever it precomputes for that
//! entity (a resolved sort function, a per-row flag) keyed by type, so
//! independently written features never share keys.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;
use rustc_hash::FxHashMap;

#[derive(Clone, Default)]
pub struct Extensions {
    map: FxHashMap<TypeId, Rc<dyn Any>>,
}

impl Extensions {
    pub fn new() -> Self {
        Extensions::default()
    }

    /// Inserts a value, replacing any previous value of the same type.
    pub fn insert<X: Any>(&mut self, value: X) {
        self.map.insert(TypeId::of::<X>(), Rc::new(value));
    }

    pub fn get<X: Any>(&self) -> Option<&X> {
        self.map
            .get(&TypeId::of::<X>())
            .and_then(|value| value.downcast_ref::<X>())
    }

    pub fn contains<X: Any>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<X>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions").field("len", &self.map.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct RowHeight(u32);

    #[test]
    fn typed_insert_and_get() {
        let mut ext = Extensions::new();
        assert!(ext.get::<RowHeight>().is_none());
        ext.insert(RowHeight(24));
        ext.insert(RowHeight(32));
        assert_eq!(ext.get::<RowHeight>(), Some(&RowHeight(32)));
        assert_eq!(ext.len(), 1);
    }
}
