//! TreeHashMap: hash routing over red-black-tree buckets.

use crate::buckets::{Bucket, Buckets, Slot};
use crate::config::TableConfig;
use crate::error::Result;
use crate::key_cursor::KeyCursor;
use crate::ordered_tree;
use crate::reentrancy::OperationGuard;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use hashbrown::hash_map::DefaultHashBuilder;

/// Outcome of [`TreeHashMap::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult<V> {
    /// The key was absent; a new entry was added.
    Inserted,
    /// The key was present; its value was replaced.
    Updated { previous: V },
}

impl<V> PutResult<V> {
    pub fn is_inserted(&self) -> bool {
        matches!(self, PutResult::Inserted)
    }

    /// The replaced value, if this put was an update.
    pub fn previous(self) -> Option<V> {
        match self {
            PutResult::Inserted => None,
            PutResult::Updated { previous } => Some(previous),
        }
    }
}

/// A hash map whose buckets are red-black trees.
///
/// Keys are routed to `hash mod capacity`; within a bucket they are kept in
/// `Ord` order, so a bucket holding `b` colliding keys answers in
/// O(log b). A put that finds the table at its load factor, or whose new
/// entry would push `len / capacity` past it, first doubles the bucket array
/// and rehashes every entry. Growth is a single blocking pass.
///
/// `K: Ord` must agree with `K: Eq`, and `K: Hash` must give equal keys equal
/// hashes.
///
/// Single-threaded: the map is `!Send` and `!Sync`.
#[derive(Clone)]
pub struct TreeHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Buckets<K, V>,
    guard: OperationGuard,
}

impl<K, V> TreeHashMap<K, V> {
    /// Empty map with 16 buckets and load factor 0.75.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(TableConfig::new().with_initial_capacity(capacity))
    }
}

impl<K, V> Default for TreeHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> TreeHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            buckets: Buckets::new(&TableConfig::default()),
            guard: OperationGuard::new(),
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hasher,
            buckets: Buckets::new(&config),
            guard: OperationGuard::new(),
        })
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.len() == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    /// Current `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.buckets.len() as f64 / self.buckets.capacity() as f64
    }

    /// Configured growth threshold.
    pub fn load_factor_limit(&self) -> f64 {
        self.buckets.load_factor_limit()
    }

    /// Number of bucket slots holding a tree.
    pub fn occupied_buckets(&self) -> usize {
        self.buckets.occupied()
    }

    /// Entry count of the fullest bucket.
    pub fn max_bucket_len(&self) -> usize {
        self.buckets.max_bucket_len()
    }

    /// Drop every entry; the bucket count is kept.
    pub fn clear(&mut self) {
        let _g = self.guard.enter("clear");
        self.buckets.clear();
    }

    /// Entries in bucket order, each bucket in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.slots().iter(),
            current: None,
            remaining: self.buckets.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.buckets.len();
        IterMut {
            buckets: self.buckets.slots_mut().iter_mut(),
            current: None,
            remaining,
        }
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl ExactSizeIterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// A detached cursor over the current keys. See [`KeyCursor`].
    pub fn key_cursor(&self) -> KeyCursor<K> {
        KeyCursor::new(self.len(), self.capacity())
    }

    pub(crate) fn bucket_at(&self, index: usize) -> Option<&Bucket<K, V>> {
        self.buckets.bucket_at(index)
    }

    pub(crate) fn guard(&self) -> &OperationGuard {
        &self.guard
    }
}

impl<K, V, S> TreeHashMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Insert or replace. Grows the bucket array first when the table is
    /// at its load factor or a new entry would exceed it.
    pub fn put(&mut self, key: K, value: V) -> PutResult<V> {
        let _g = self.guard.enter("put");
        let hash = self.make_hash(&key);
        self.buckets.put(hash, key, value)
    }

    /// Insert only when `key` is absent. Returns whether it was inserted.
    pub fn put_if_absent(&mut self, key: K, value: V) -> bool {
        let _g = self.guard.enter("put_if_absent");
        let hash = self.make_hash(&key);
        self.buckets.put_if_absent(hash, key, value)
    }

    /// `put` every entry, replacing on conflict.
    pub fn put_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in entries {
            self.put(k, v);
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        let _g = self.guard.enter("get");
        let hash = self.make_hash(key);
        self.buckets.get(hash, key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        let _g = self.guard.enter("get_mut");
        let hash = self.make_hash(key);
        self.buckets.get_mut(hash, key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        let _g = self.guard.enter("contains_key");
        let hash = self.make_hash(key);
        self.buckets.contains(hash, key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, returning the stored key and value. An emptied bucket
    /// slot is released.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        let _g = self.guard.enter("remove");
        let hash = self.make_hash(key);
        self.buckets.remove(hash, key)
    }

    /// Remove each key in turn; returns how many were present. Not atomic.
    pub fn remove_all<'q, Q, I>(&mut self, keys: I) -> usize
    where
        K: Borrow<Q>,
        Q: 'q + ?Sized + Hash + Ord,
        I: IntoIterator<Item = &'q Q>,
    {
        keys.into_iter()
            .filter(|k| self.remove_entry(*k).is_some())
            .count()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for TreeHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for TreeHashMap<K, V, S>
where
    K: Hash + Ord,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for TreeHashMap<K, V, S>
where
    K: Hash + Ord,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for TreeHashMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<K, V, S> FromIterator<(K, V)> for TreeHashMap<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.put_all(iter);
        map
    }
}

/// Iterator over entries of a `TreeHashMap`.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<Bucket<K, V>>>,
    current: Option<ordered_tree::Iter<'a, K, Slot<V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, slot)) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some((k, &slot.value));
            }
            let tree = self.buckets.by_ref().flatten().next()?;
            self.current = Some(tree.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over entries of a `TreeHashMap` with mutable values.
pub struct IterMut<'a, K, V> {
    buckets: core::slice::IterMut<'a, Option<Bucket<K, V>>>,
    current: Option<ordered_tree::IterMut<'a, K, Slot<V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, slot)) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some((k, &mut slot.value));
            }
            let tree = self.buckets.by_ref().flatten().next()?;
            self.current = Some(tree.iter_mut());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator; consumes the map.
pub struct IntoIter<K, V> {
    buckets: std::vec::IntoIter<Option<Bucket<K, V>>>,
    current: Option<ordered_tree::IntoIter<K, Slot<V>>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, slot)) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some((k, slot.value));
            }
            let tree = self.buckets.by_ref().flatten().next()?;
            self.current = Some(tree.into_iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<'a, K, V, S> IntoIterator for &'a TreeHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut TreeHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for TreeHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let remaining = self.buckets.len();
        IntoIter {
            buckets: self.buckets.into_slots().into_iter(),
            current: None,
            remaining,
        }
    }
}
