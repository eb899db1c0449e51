// KeyCursor test suite.
//
// Invariants exercised:
// - Exhaustiveness: one pass over N entries yields N distinct keys, the
//   same set `keys()` reports.
// - Loud exhaustion: `next_key` past the end is `NoSuchElement`.
// - Replay: `cycle` rewinds to Fresh and a second pass yields the same
//   multiset when the map did not change.
use std::collections::BTreeSet;
use tree_hashmap::{CursorState, MapError, TreeHashMap, TreeHashSet};

fn sample(n: u32) -> TreeHashMap<u32, String> {
    (0..n).map(|i| (i * 7919 % 10_007, i.to_string())).collect()
}

// Test: stepping past the end.
// Assumes: N entries.
// Verifies: exactly N successful calls, then NoSuchElement carrying the
// emitted count; further calls keep failing.
#[test]
fn next_past_end_is_no_such_element() {
    let m = sample(25);
    let mut c = m.key_cursor();
    for _ in 0..25 {
        c.next_key(&m).expect("key available");
    }
    let err = c.next_key(&m).unwrap_err();
    assert_eq!(
        err,
        MapError::NoSuchElement {
            operation: "next_key",
            emitted: 25
        }
    );
    assert_eq!(c.state(), CursorState::Exhausted);
    assert!(c.next_key(&m).is_err());
    assert!(!c.has_next(&m));
}

// Test: a pass is exhaustive and duplicate-free.
// Verifies: the walked keys equal `keys()` as a set and in order.
#[test]
fn pass_matches_keys() {
    let m = sample(500);
    let mut c = m.key_cursor();
    let mut walked = Vec::new();
    while c.has_next(&m) {
        walked.push(c.next_key(&m).unwrap());
    }
    let set: BTreeSet<u32> = walked.iter().copied().collect();
    assert_eq!(walked.len(), 500);
    assert_eq!(set.len(), 500);
    assert_eq!(set, m.keys().copied().collect::<BTreeSet<_>>());
    assert_eq!(walked, m.keys().copied().collect::<Vec<_>>());
}

// Test: cycle replays the same keys.
// Assumes: no mutation between passes.
// Verifies: state transitions Fresh -> InProgress -> Exhausted -> Fresh and
// identical sequences across passes.
#[test]
fn cycle_replays_same_sequence() {
    let m = sample(40);
    let mut c = m.key_cursor();
    assert_eq!(c.state(), CursorState::Fresh);
    let first: Vec<u32> = c.remaining(&m).collect();
    assert_eq!(c.state(), CursorState::Exhausted);

    c.cycle();
    assert_eq!(c.state(), CursorState::Fresh);
    let _ = c.next_key(&m).unwrap();
    assert_eq!(c.state(), CursorState::InProgress);

    c.cycle();
    let second: Vec<u32> = c.remaining(&m).collect();
    assert_eq!(first, second);
}

// Test: cycling an unfinished pass starts over.
#[test]
fn cycle_mid_pass_restarts() {
    let m = sample(10);
    let mut c = m.key_cursor();
    let head: Vec<u32> = (0..4).map(|_| c.next_key(&m).unwrap()).collect();
    c.cycle();
    let full: Vec<u32> = c.remaining(&m).collect();
    assert_eq!(full.len(), 10);
    assert_eq!(&full[..4], head.as_slice());
}

// Test: the cursor does not hold the map borrowed.
// Assumes: mutation between calls is allowed.
// Verifies: after growth the next cycle sees the new contents exactly.
#[test]
fn map_can_change_between_passes() {
    let mut m = sample(10);
    let mut c = m.key_cursor();
    let _ = c.next_key(&m).unwrap();
    for i in 100..200u32 {
        m.put(i, String::new());
    }
    c.cycle();
    let walked: BTreeSet<u32> = c.remaining(&m).collect();
    assert_eq!(walked.len(), 110);
    assert_eq!(walked, m.keys().copied().collect::<BTreeSet<_>>());
}

// Test: cursors from a set.
#[test]
fn set_cursor() {
    let s: TreeHashSet<&str> = ["x", "y", "z"].into_iter().collect();
    let mut c = s.key_cursor();
    let mut got = Vec::new();
    while c.has_next(s.as_map()) {
        got.push(c.next_key(s.as_map()).unwrap());
    }
    got.sort_unstable();
    assert_eq!(got, ["x", "y", "z"]);
    assert!(c.next_key(s.as_map()).is_err());
}
