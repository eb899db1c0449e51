#![cfg(test)]

// Property tests for TreeHashMap kept inside the crate so they can inspect
// bucket trees directly.

use crate::config::TableConfig;
use crate::tree_hash_map::{PutResult, TreeHashMap};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// Hashes a key to `key % 7`, so many keys collide regardless of capacity.
#[derive(Clone, Default)]
struct Mod7;
#[derive(Default)]
struct Mod7Hasher(u64);
impl BuildHasher for Mod7 {
    type Hasher = Mod7Hasher;
    fn build_hasher(&self) -> Mod7Hasher {
        Mod7Hasher::default()
    }
}
impl Hasher for Mod7Hasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 << 8) | u64::from(*b);
        }
    }
    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }
    fn finish(&self) -> u64 {
        self.0 % 7
    }
}

#[derive(Clone, Debug)]
enum Op {
    Put(u32, i64),
    PutIfAbsent(u32, i64),
    Remove(u32),
    RemoveAll(Vec<u32>),
    Get(u32),
    Clear,
    CursorPass,
}

fn op() -> impl Strategy<Value = Op> {
    let key = 0u32..64;
    prop_oneof![
        10 => (key.clone(), any::<i64>()).prop_map(|(k, v)| Op::Put(k, v)),
        3 => (key.clone(), any::<i64>()).prop_map(|(k, v)| Op::PutIfAbsent(k, v)),
        6 => key.clone().prop_map(Op::Remove),
        1 => proptest::collection::vec(key.clone(), 0..6).prop_map(Op::RemoveAll),
        3 => key.prop_map(Op::Get),
        1 => Just(Op::Clear),
        1 => Just(Op::CursorPass),
    ]
}

fn check_structure<S>(m: &TreeHashMap<u32, i64, S>) {
    let mut total = 0;
    for tree in m.buckets_for_test() {
        // No empty bucket tree is ever kept.
        assert!(!tree.is_empty());
        tree.check_invariants();
        total += tree.len();
    }
    assert_eq!(total, m.len());
    assert!(
        m.len() as f64 <= m.load_factor_limit() * m.capacity() as f64,
        "load factor exceeded: {} / {}",
        m.len(),
        m.capacity()
    );
}

// Property: state-machine equivalence against BTreeMap under heavy collisions.
// Invariants exercised after every step:
// - put reports Inserted/Updated exactly as the model predicts;
// - get/contains_key/remove agree with the model (no bucket-only answers);
// - every bucket tree is non-empty and red-black valid; len matches;
// - len / capacity stays within the configured load factor;
// - a full cursor pass yields exactly the model's key set.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_matches_model(
        capacity in 1usize..8,
        load_factor in prop_oneof![Just(0.5), Just(0.75), Just(1.0)],
        ops in proptest::collection::vec(op(), 1..200),
    ) {
        let config = TableConfig::new()
            .with_initial_capacity(capacity)
            .with_load_factor(load_factor);
        let mut sut: TreeHashMap<u32, i64, Mod7> =
            TreeHashMap::with_config_and_hasher(config, Mod7).unwrap();
        let mut model: BTreeMap<u32, i64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    let expected = match model.insert(k, v) {
                        Some(previous) => PutResult::Updated { previous },
                        None => PutResult::Inserted,
                    };
                    prop_assert_eq!(sut.put(k, v), expected);
                }
                Op::PutIfAbsent(k, v) => {
                    let fresh = !model.contains_key(&k);
                    if fresh {
                        model.insert(k, v);
                    }
                    prop_assert_eq!(sut.put_if_absent(k, v), fresh);
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k), model.remove(&k));
                    prop_assert!(!sut.contains_key(&k));
                }
                Op::RemoveAll(keys) => {
                    let uniq: BTreeSet<u32> = keys.iter().copied().collect();
                    let expected = uniq.iter().filter(|k| model.remove(*k).is_some()).count();
                    prop_assert_eq!(sut.remove_all(&keys), expected);
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                    prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
                Op::CursorPass => {
                    let mut c = sut.key_cursor();
                    let walked: Vec<u32> = c.remaining(&sut).collect();
                    let uniq: BTreeSet<u32> = walked.iter().copied().collect();
                    prop_assert_eq!(walked.len(), model.len(), "no duplicates, nothing missing");
                    prop_assert_eq!(uniq, model.keys().copied().collect::<BTreeSet<_>>());
                    prop_assert!(c.next_key(&sut).is_err());
                }
            }

            check_structure(&sut);
            prop_assert_eq!(sut.len(), model.len());
            let keys: BTreeSet<u32> = sut.keys().copied().collect();
            prop_assert_eq!(keys.len(), sut.len());
        }

        let final_entries: BTreeMap<u32, i64> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(final_entries, model);
    }
}

impl<K, V, S> TreeHashMap<K, V, S> {
    fn buckets_for_test(&self) -> impl Iterator<Item = &crate::buckets::Bucket<K, V>> {
        (0..self.capacity()).filter_map(move |i| self.bucket_at(i))
    }
}
