//! Debug-only reentrancy guard for table operations.
//!
//! `TreeHashMap` calls into user code (`K: Hash`, `K: Ord`, `K: Clone`)
//! while a bucket tree may be mid-rotation or the bucket array mid-rehash.
//! Each public operation enters the guard under its own name; a nested
//! entry from user code panics in debug builds and reports both names.
//! Release builds compile this to nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker of the operation currently in progress.
#[derive(Debug)]
pub(crate) struct OperationGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // The table is single-threaded; keep it !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl OperationGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `operation` as in progress until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, operation: &'static str) -> ActiveOperation<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call to `{operation}` while `{outer}` is in progress");
            }
            self.active.set(Some(operation));
            return ActiveOperation { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = operation;
            return ActiveOperation { _z: PhantomData };
        }
    }

    #[cfg(all(test, debug_assertions))]
    fn active(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for OperationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for OperationGuard {
    /// A cloned table starts with no operation in progress.
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// RAII marker returned by [`OperationGuard::enter`].
pub(crate) struct ActiveOperation<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OperationGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ActiveOperation<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OperationGuard;

    #[test]
    fn sequential_operations_are_ok() {
        let g = OperationGuard::new();
        {
            let _a = g.enter("put");
        }
        let _b = g.enter("get");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn active_name_is_tracked_and_released() {
        let g = OperationGuard::new();
        assert_eq!(g.active(), None);
        {
            let _a = g.enter("remove");
            assert_eq!(g.active(), Some("remove"));
        }
        assert_eq!(g.active(), None);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_names_both_operations() {
        let g = OperationGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = g.enter("put");
            let _inner = g.enter("get");
        }));
        let err = res.expect_err("nested entry must panic in debug builds");
        let msg = err
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert_eq!(msg, "reentrant call to `get` while `put` is in progress");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let g = OperationGuard::new();
        let _outer = g.enter("put");
        let _inner = g.enter("get");
    }
}
