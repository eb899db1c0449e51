//! KeyCursor: a detached, replayable cursor over a table's keys.
//!
//! The cursor owns no borrow of the map. Each call takes `&TreeHashMap`, so
//! the map may change between calls; the cursor then keeps walking whatever
//! the buckets hold at that moment. Keys may be skipped or repeated in that
//! case, and the walk may stop early, but nothing is unsafe.
//!
//! Keys are produced bucket by bucket: when the buffer runs dry, the next
//! occupied bucket's keys are cloned out in tree order.

use crate::error::{MapError, Result};
use crate::tree_hash_map::TreeHashMap;
use std::collections::VecDeque;
use tracing::trace;

/// Lifecycle of a [`KeyCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing emitted since creation or the last `cycle`.
    Fresh,
    InProgress,
    /// Every key of the captured count has been produced.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct KeyCursor<K> {
    next_bucket: usize,
    bucket_bound: usize,
    target: usize,
    emitted: usize,
    pending: VecDeque<K>,
    state: CursorState,
    // Set by `cycle`: re-read len/capacity from the map on the next call.
    resnapshot: bool,
}

impl<K> KeyCursor<K> {
    pub(crate) fn new(len: usize, capacity: usize) -> Self {
        Self {
            next_bucket: 0,
            bucket_bound: capacity,
            target: len,
            emitted: 0,
            pending: VecDeque::new(),
            state: CursorState::Fresh,
            resnapshot: false,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Keys produced since creation or the last `cycle`.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Number of keys this pass will produce at most.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Rewind to `Fresh`. The next pass walks the map's contents as they are
    /// when it starts.
    pub fn cycle(&mut self) {
        self.next_bucket = 0;
        self.emitted = 0;
        self.pending.clear();
        self.state = CursorState::Fresh;
        self.resnapshot = true;
    }
}

impl<K: Clone> KeyCursor<K> {
    /// Whether `next_key` will succeed. Reaching the end moves the cursor to
    /// `Exhausted`.
    pub fn has_next<V, S>(&mut self, map: &TreeHashMap<K, V, S>) -> bool {
        let _g = map.guard().enter("has_next");
        self.fill(map)
    }

    /// Produce the next key.
    ///
    /// Fails with [`MapError::NoSuchElement`] once the cursor is exhausted.
    pub fn next_key<V, S>(&mut self, map: &TreeHashMap<K, V, S>) -> Result<K> {
        let _g = map.guard().enter("next_key");
        let key = if self.fill(map) {
            self.pending.pop_front()
        } else {
            None
        };
        match key {
            Some(key) => {
                self.emitted += 1;
                self.state = CursorState::InProgress;
                Ok(key)
            }
            None => Err(MapError::NoSuchElement {
                operation: "next_key",
                emitted: self.emitted,
            }),
        }
    }

    /// Drain the rest of this pass as an ordinary iterator.
    pub fn remaining<'a, V, S>(
        &'a mut self,
        map: &'a TreeHashMap<K, V, S>,
    ) -> impl Iterator<Item = K> + 'a {
        std::iter::from_fn(move || self.next_key(map).ok())
    }

    /// Ensure a key is buffered unless the pass is over.
    fn fill<V, S>(&mut self, map: &TreeHashMap<K, V, S>) -> bool {
        if self.state == CursorState::Exhausted {
            return false;
        }
        if self.state == CursorState::Fresh && self.resnapshot {
            self.target = map.len();
            self.bucket_bound = map.capacity();
            self.resnapshot = false;
        }
        if self.emitted < self.target {
            if !self.pending.is_empty() {
                return true;
            }
            while self.next_bucket < self.bucket_bound {
                let index = self.next_bucket;
                self.next_bucket += 1;
                if let Some(tree) = map.bucket_at(index) {
                    self.pending.extend(tree.keys().cloned());
                    if !self.pending.is_empty() {
                        return true;
                    }
                }
            }
        }
        trace!(emitted = self.emitted, target = self.target, "key cursor exhausted");
        self.state = CursorState::Exhausted;
        self.pending.clear();
        false
    }
}
