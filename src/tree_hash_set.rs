//! TreeHashSet: a set façade over `TreeHashMap<K, ()>`.

use crate::config::TableConfig;
use crate::error::Result;
use crate::key_cursor::KeyCursor;
use crate::tree_hash_map::TreeHashMap;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

#[derive(Clone)]
pub struct TreeHashSet<K, S = DefaultHashBuilder> {
    map: TreeHashMap<K, (), S>,
}

impl<K> TreeHashSet<K> {
    pub fn new() -> Self {
        Self {
            map: TreeHashMap::new(),
        }
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Ok(Self {
            map: TreeHashMap::with_config(config)?,
        })
    }
}

impl<K> Default for TreeHashSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> TreeHashSet<K, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            map: TreeHashMap::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.map.load_factor()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.map.keys()
    }

    /// The backing map; drive cursors from [`key_cursor`](Self::key_cursor)
    /// against it.
    pub fn as_map(&self) -> &TreeHashMap<K, (), S> {
        &self.map
    }

    pub fn key_cursor(&self) -> KeyCursor<K> {
        self.map.key_cursor()
    }
}

impl<K, S> TreeHashSet<K, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    /// Returns whether `key` was newly added.
    pub fn insert(&mut self, key: K) -> bool {
        self.map.put_if_absent(key, ())
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.map.contains_key(key)
    }

    /// Returns whether `key` was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.map.remove(key).is_some()
    }

    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Ord,
    {
        self.map.remove_entry(key).map(|(k, ())| k)
    }
}

impl<K: fmt::Debug, S> fmt::Debug for TreeHashSet<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> Extend<K> for TreeHashSet<K, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, S> FromIterator<K> for TreeHashSet<K, S>
where
    K: Hash + Ord,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<K, S> IntoIterator for TreeHashSet<K, S> {
    type Item = K;
    type IntoIter = core::iter::Map<crate::tree_hash_map::IntoIter<K, ()>, fn((K, ())) -> K>;

    fn into_iter(self) -> Self::IntoIter {
        let key_of: fn((K, ())) -> K = |(k, ())| k;
        self.map.into_iter().map(key_of)
    }
}
