#![cfg(test)]

// Property tests for OrderedTree kept inside the crate so they can reach
// the invariant checker.

use crate::error::InsertError;
use crate::ordered_tree::OrderedTree;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Update(u16, u32),
    Delete(u16),
    Get(u16),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    // Narrow key space so deletes and updates hit present keys often.
    let key = 0u16..128;
    prop_oneof![
        8 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Update(k, v)),
        6 => key.clone().prop_map(Op::Delete),
        2 => key.prop_map(Op::Get),
        1 => Just(Op::Clear),
    ]
}

// Property: state-machine equivalence against BTreeMap.
// Invariants exercised after every step:
// - root black, no red-red edge, uniform black height, parent links intact;
// - in-order keys strictly increasing and equal to the model's keys;
// - insert rejects present keys, update/delete/get agree with the model.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_tree_matches_model(ops in proptest::collection::vec(op(), 1..300)) {
        let mut sut: OrderedTree<u16, u32> = OrderedTree::new();
        let mut model: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let res = sut.insert(k, v);
                    if model.contains_key(&k) {
                        prop_assert_eq!(res, Err(InsertError::DuplicateKey));
                    } else {
                        prop_assert_eq!(res, Ok(()));
                        model.insert(k, v);
                    }
                }
                Op::Update(k, v) => {
                    let res = sut.update(&k, v);
                    match model.get_mut(&k) {
                        Some(old) => {
                            prop_assert_eq!(res, Ok(*old));
                            *old = v;
                        }
                        None => prop_assert_eq!(res, Err(v)),
                    }
                }
                Op::Delete(k) => {
                    prop_assert_eq!(sut.delete(&k), model.remove_entry(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                    prop_assert_eq!(sut.contains(&k), model.contains_key(&k));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert!(sut.iter().eq(model.iter()));
        }
    }
}

// Property: black height stays logarithmic for any insertion order.
proptest! {
    #[test]
    fn prop_black_height_is_logarithmic(keys in proptest::collection::vec(any::<i64>(), 1..2000)) {
        let tree: OrderedTree<i64, ()> = keys.into_iter().map(|k| (k, ())).collect();
        let bh = tree.check_invariants();
        // n >= 2^(bh - 1) - 1 for a red-black tree whose empty positions count as one.
        let bound = (usize::BITS - tree.len().leading_zeros()) as usize + 1;
        prop_assert!(bh <= bound, "black height {} exceeds {}", bh, bound);
    }
}
