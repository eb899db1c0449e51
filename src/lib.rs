//! tree-hashmap: a single-threaded hash map whose collision buckets are
//! red-black trees, so a bucket holding `b` keys answers in O(log b)
//! instead of O(b).
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep worst-case per-bucket work logarithmic while retaining
//!   O(1) expected routing, in small layers that can each be checked on
//!   their own.
//! - Layers:
//!   - OrderedTree<K, V>: arena-backed red-black tree. Nodes live in a
//!     `SlotMap` and link by generational key; parent links are plain
//!     back-references used only by rotations and fixups.
//!   - Buckets<K, V>: the bucket array. Routes a precomputed hash to
//!     `hash mod capacity`, owns one optional tree per slot, and doubles
//!     plus rehashes when a put finds the table at its load factor.
//!   - TreeHashMap<K, V, S>: public API. Hashes once per call with `S`,
//!     guards every operation against reentrancy, and exposes iteration.
//!   - KeyCursor<K>, TreeHashSet<K, S>: a detached replayable key cursor
//!     and a set façade over `TreeHashMap<K, ()>`.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync`, no locks, no atomics.
//! - Keys need `Hash + Ord`. `Ord` orders a bucket and also decides
//!   equality, so it must agree with `Eq`; equal keys must hash equally.
//! - A bucket slot is either empty or a tree with at least one entry.
//! - `len / capacity <= load_factor` after every operation.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash. Growth reroutes by the stored hash;
//!   `K: Hash` is never invoked after insertion.
//! - Routing uses unsigned remainder, so bucket indices are always in
//!   range.
//! - Growth is one blocking O(n) pass; there is no incremental resize.
//!
//! Reentrancy policy
//! - User code runs inside `K: Hash`, `K: Ord` and (for cursors) `K: Clone`.
//!   Each public operation enters a debug-only guard under its own name;
//!   nested entry panics and names both operations.
//!
//! Cursors
//! - `KeyCursor` holds no borrow of its map; every call takes the map.
//!   Mutating the map between calls is allowed and memory-safe, but the
//!   keys produced after such a change are unspecified.
//! - Calling `next_key` on an exhausted cursor is an error
//!   (`MapError::NoSuchElement`), never a default value.

mod buckets;
pub mod config;
pub mod error;
pub mod key_cursor;
pub mod ordered_tree;
mod ordered_tree_proptest;
mod reentrancy;
pub mod tree_hash_map;
mod tree_hash_map_proptest;
pub mod tree_hash_set;

// Public surface
pub use config::TableConfig;
pub use error::{InsertError, MapError, Result};
pub use key_cursor::{CursorState, KeyCursor};
pub use ordered_tree::OrderedTree;
pub use tree_hash_map::{PutResult, TreeHashMap};
pub use tree_hash_set::TreeHashSet;
