//! Buckets: the bucket array behind `TreeHashMap`.
//!
//! Works on precomputed `u64` hashes only; the owning map hashes once per
//! call and every entry keeps its hash, so growth never calls `K: Hash`.
//!
//! A slot is `None` or a tree with at least one entry. Removing the last
//! entry of a bucket drops its tree.

use crate::config::TableConfig;
use crate::ordered_tree::OrderedTree;
use crate::tree_hash_map::PutResult;
use core::borrow::Borrow;
use core::mem;
use tracing::{debug, trace};

/// Value wrapper stored in a bucket tree; remembers the key's hash.
#[derive(Clone, Debug)]
pub(crate) struct Slot<V> {
    pub(crate) hash: u64,
    pub(crate) value: V,
}

pub(crate) type Bucket<K, V> = OrderedTree<K, Slot<V>>;

#[derive(Clone)]
pub(crate) struct Buckets<K, V> {
    slots: Vec<Option<Bucket<K, V>>>,
    len: usize,
    load_factor: f64,
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Option<Bucket<K, V>>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots
}

#[inline]
fn route(hash: u64, capacity: usize) -> usize {
    // Unsigned remainder: always in 0..capacity.
    (hash % capacity as u64) as usize
}

impl<K, V> Buckets<K, V> {
    /// `config` must already be validated.
    pub(crate) fn new(config: &TableConfig) -> Self {
        Self {
            slots: empty_slots(config.initial_capacity),
            len: 0,
            load_factor: config.load_factor,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn load_factor_limit(&self) -> f64 {
        self.load_factor
    }

    pub(crate) fn slots(&self) -> &[Option<Bucket<K, V>>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Bucket<K, V>>] {
        &mut self.slots
    }

    pub(crate) fn into_slots(self) -> Vec<Option<Bucket<K, V>>> {
        self.slots
    }

    pub(crate) fn bucket_at(&self, index: usize) -> Option<&Bucket<K, V>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn bucket(&self, hash: u64) -> Option<&Bucket<K, V>> {
        self.slots[route(hash, self.capacity())].as_ref()
    }

    fn bucket_mut(&mut self, hash: u64) -> Option<&mut Bucket<K, V>> {
        let index = route(hash, self.capacity());
        self.slots[index].as_mut()
    }

    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
    }

    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub(crate) fn max_bucket_len(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(OrderedTree::len)
            .max()
            .unwrap_or(0)
    }
}

impl<K, V> Buckets<K, V>
where
    K: Ord,
{
    pub(crate) fn get<Q>(&self, hash: u64, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.bucket(hash)?
            .get_key_value(key)
            .map(|(k, slot)| (k, &slot.value))
    }

    pub(crate) fn get_mut<Q>(&mut self, hash: u64, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.bucket_mut(hash)?.get_mut(key).map(|slot| &mut slot.value)
    }

    /// Searches the bucket tree, not just the bucket slot.
    pub(crate) fn contains<Q>(&self, hash: u64, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.bucket(hash).is_some_and(|tree| tree.contains(key))
    }

    pub(crate) fn put(&mut self, hash: u64, key: K, value: V) -> PutResult<V> {
        self.grow_if_at_limit();
        let slot = Slot { hash, value };
        let slot = match self.bucket_mut(hash) {
            Some(tree) => match tree.update(&key, slot) {
                Ok(previous) => {
                    return PutResult::Updated {
                        previous: previous.value,
                    }
                }
                Err(slot) => slot,
            },
            None => slot,
        };
        self.insert_new(key, slot);
        PutResult::Inserted
    }

    pub(crate) fn put_if_absent(&mut self, hash: u64, key: K, value: V) -> bool {
        self.grow_if_at_limit();
        if self.contains(hash, &key) {
            return false;
        }
        self.insert_new(key, Slot { hash, value });
        true
    }

    /// Insert a key known to be absent, growing first if needed.
    fn insert_new(&mut self, key: K, slot: Slot<V>) {
        self.reserve_one();
        let index = route(slot.hash, self.capacity());
        let tree = self.slots[index].get_or_insert_with(|| {
            trace!(bucket = index, "bucket tree created");
            OrderedTree::new()
        });
        if tree.insert(key, slot).is_ok() {
            self.len += 1;
        }
    }

    pub(crate) fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let index = route(hash, self.capacity());
        let tree = self.slots[index].as_mut()?;
        let (k, slot) = tree.delete(key)?;
        if tree.is_empty() {
            self.slots[index] = None;
            trace!(bucket = index, "bucket tree reclaimed");
        }
        self.len -= 1;
        Some((k, slot.value))
    }

    /// A put that finds `len / capacity` already at the limit grows first,
    /// whether it ends up inserting or updating.
    fn grow_if_at_limit(&mut self) {
        if self.len as f64 >= self.load_factor * self.capacity() as f64 {
            self.reserve_one();
        }
    }

    /// Grow so that one more entry keeps `len / capacity` within the limit.
    fn reserve_one(&mut self) {
        let needed = self.len + 1;
        let mut capacity = self.capacity();
        while needed as f64 > self.load_factor * capacity as f64 {
            capacity = capacity
                .checked_mul(2)
                .expect("bucket array capacity overflow");
        }
        if capacity != self.capacity() {
            self.rehash(capacity);
        }
    }

    /// Move every entry into a fresh array of `capacity` buckets.
    ///
    /// Blocking and O(n): all entries are rerouted before this returns.
    fn rehash(&mut self, capacity: usize) {
        debug!(
            from = self.capacity(),
            to = capacity,
            len = self.len,
            "growing bucket array"
        );
        let old = mem::replace(&mut self.slots, empty_slots(capacity));
        for tree in old.into_iter().flatten() {
            for (key, slot) in tree {
                let index = route(slot.hash, capacity);
                let res = self.slots[index]
                    .get_or_insert_with(OrderedTree::new)
                    .insert(key, slot);
                debug_assert!(res.is_ok(), "rehash never sees duplicate keys");
            }
        }
    }
}
