//! FILENAME: table-core/src/memo.rs
//! PURPOSE: Dependency-keyed memoization, the reuse primitive behind every
//! computed accessor (row models, ordered/visible columns, header groups,
//! per-row cells).
//! CONTEXT: Each derivation site owns one `Memo`. On every read the site
//! hands over its current dependency values; if they equal the previous
//! ones the cached result is returned without recomputing.
//!
//! Equality is `PartialEq` on the dependency tuple. Plain values compare by
//! value; shared structures wrapped in `ByRef` compare by pointer identity.
//! Nothing here is shared between tables.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use std::time::Instant;

/// An `Rc` compared by identity rather than contents.
pub struct ByRef<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> ByRef<T> {
    pub fn new(value: &Rc<T>) -> Self {
        ByRef(Rc::clone(value))
    }
}

impl<T: ?Sized> Clone for ByRef<T> {
    fn clone(&self) -> Self {
        ByRef(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for ByRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Deref for ByRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> fmt::Debug for ByRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByRef({:p})", Rc::as_ptr(&self.0))
    }
}

/// Options for a standalone memoized function.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoOptions {
    pub name: &'static str,
    /// Log recomputation timings at debug level.
    pub debug: bool,
}

/// A single-slot cache keyed by the last dependency list.
pub struct Memo<D, R> {
    name: &'static str,
    debug: Cell<bool>,
    slot: RefCell<Option<(D, R)>>,
}

impl<D: PartialEq, R: Clone> Memo<D, R> {
    pub fn new(name: &'static str) -> Self {
        Memo {
            name,
            debug: Cell::new(false),
            slot: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.set(debug);
    }

    /// Returns the cached result when `deps_fn` yields dependencies equal to
    /// the previous call's, otherwise runs `compute_fn` and caches the result.
    ///
    /// If either closure fails the slot is left as it was and the error is
    /// returned. `compute_fn` may read other memos; this slot is not borrowed
    /// while it runs.
    pub fn get<E>(
        &self,
        deps_fn: impl FnOnce() -> Result<D, E>,
        compute_fn: impl FnOnce(&D) -> Result<R, E>,
    ) -> Result<R, E> {
        let deps = deps_fn()?;

        if let Some((previous, result)) = self.slot.borrow().as_ref() {
            if *previous == deps {
                log::trace!("{} cache hit", self.name);
                return Ok(result.clone());
            }
        }

        let started = self.debug.get().then(Instant::now);
        let result = compute_fn(&deps)?;
        if let Some(started) = started {
            log::debug!(
                "{} recomputed in {:.2}ms",
                self.name,
                started.elapsed().as_secs_f64() * 1000.0
            );
        }

        *self.slot.borrow_mut() = Some((deps, result.clone()));
        Ok(result)
    }

    /// Drops the cached dependencies and result.
    pub fn reset(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_cached(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

/// Wraps a dependency function and a compute function into one memoized
/// accessor that owns its cache.
pub fn memo<D, R, E>(
    deps_fn: impl Fn() -> Result<D, E>,
    compute_fn: impl Fn(&D) -> Result<R, E>,
    options: MemoOptions,
) -> impl Fn() -> Result<R, E>
where
    D: PartialEq,
    R: Clone,
{
    let cache = Memo::new(options.name);
    cache.set_debug(options.debug);
    move || cache.get(&deps_fn, &compute_fn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_deps_skip_recompute() {
        let calls = Cell::new(0);
        let memo = Memo::<(u32, bool), u32>::new("test");

        let first = memo.get(|| Ok::<_, ()>((1, true)), |(n, _)| {
            calls.set(calls.get() + 1);
            Ok(n * 10)
        });
        let second = memo.get(|| Ok::<_, ()>((1, true)), |_| {
            calls.set(calls.get() + 1);
            Ok(0)
        });

        assert_eq!(first, Ok(10));
        assert_eq!(second, Ok(10));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn changed_deps_recompute() {
        let memo = Memo::<u32, u32>::new("test");
        assert_eq!(memo.get(|| Ok::<_, ()>(1), |n| Ok(n + 1)), Ok(2));
        assert_eq!(memo.get(|| Ok::<_, ()>(5), |n| Ok(n + 1)), Ok(6));
    }

    #[test]
    fn byref_compares_identity_not_contents() {
        let a = Rc::new(vec![1, 2, 3]);
        let b = Rc::new(vec![1, 2, 3]);
        assert!(ByRef::new(&a) == ByRef::new(&a));
        assert!(ByRef::new(&a) != ByRef::new(&b));
    }

    #[test]
    fn failed_deps_leave_cache_untouched() {
        let memo = Memo::<u32, u32>::new("test");
        assert_eq!(memo.get(|| Ok::<_, &str>(1), |n| Ok(*n)), Ok(1));

        let failed = memo.get(|| Err::<u32, _>("boom"), |_| Ok(99));
        assert_eq!(failed, Err("boom"));

        // Still cached against the old deps
        assert_eq!(memo.get(|| Ok::<_, &str>(1), |_| Ok(42)), Ok(1));
    }

    #[test]
    fn failed_compute_is_not_cached() {
        let memo = Memo::<u32, u32>::new("test");
        assert_eq!(memo.get(|| Ok(1), |_| Err("bad")), Err("bad"));
        assert!(!memo.is_cached());
        assert_eq!(memo.get(|| Ok::<_, &str>(1), |n| Ok(n + 1)), Ok(2));
    }

    #[test]
    fn standalone_memo_returns_same_rc() {
        let source = Rc::new(vec![3, 1, 2]);
        let captured = Rc::clone(&source);
        let sorted = memo(
            move || Ok::<_, ()>(ByRef::new(&captured)),
            |deps| {
                let mut v = (*deps.0).clone();
                v.sort();
                Ok(Rc::new(v))
            },
            MemoOptions { name: "sorted", debug: false },
        );

        let a = sorted().unwrap();
        let b = sorted().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(*a, vec![1, 2, 3]);
    }
}
