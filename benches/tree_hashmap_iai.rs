#[cfg(target_os = "linux")]
mod bench {
    use iai::black_box;
    use tree_hashmap::{OrderedTree, TableConfig, TreeHashMap};

    fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
        std::iter::from_fn(move || {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            Some(s)
        })
    }

    fn key(n: u64) -> String {
        format!("k{:016x}", n)
    }

    // 10k puts from the default capacity; includes every doubling.
    pub fn map_put_10k() {
        let mut m = TreeHashMap::<String, u64>::new();
        for (i, x) in lcg(1).take(10_000).enumerate() {
            m.put(key(x), i as u64);
        }
        black_box(m.len());
    }

    // Same inserts into a table that never grows.
    pub fn map_put_10k_presized() {
        let config = TableConfig::new().with_initial_capacity(16_384);
        let Ok(mut m) = TreeHashMap::<String, u64>::with_config(config) else {
            return;
        };
        for (i, x) in lcg(1).take(10_000).enumerate() {
            m.put(key(x), i as u64);
        }
        black_box(m.len());
    }

    // 10k successful lookups.
    pub fn map_get_hit() {
        let keys: Vec<_> = lcg(7).take(10_000).map(key).collect();
        let mut m = TreeHashMap::new();
        for (i, k) in keys.iter().enumerate() {
            m.put(k.clone(), i as u64);
        }
        for k in &keys {
            black_box(m.get(k.as_str()));
        }
    }

    // 10k lookups for keys that are not present.
    pub fn map_get_miss() {
        let mut m = TreeHashMap::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            m.put(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        for _ in 0..10_000 {
            if let Some(x) = miss.next() {
                black_box(m.contains_key(key(x).as_str()));
            }
        }
    }

    // Insert 5k then remove them all, releasing every bucket.
    pub fn map_put_remove_5k() {
        let keys: Vec<u64> = lcg(21).take(5_000).collect();
        let mut m = TreeHashMap::new();
        for k in &keys {
            m.put(*k, ());
        }
        black_box(m.remove_all(&keys));
    }

    // Two full cursor passes over 5k keys.
    pub fn map_cursor_two_passes() {
        let m: TreeHashMap<u64, ()> = lcg(3).take(5_000).map(|x| (x, ())).collect();
        let mut c = m.key_cursor();
        black_box(c.remaining(&m).count());
        c.cycle();
        black_box(c.remaining(&m).count());
    }

    // A single tree taking 10k ordered inserts then 10k deletes.
    pub fn tree_insert_delete_10k() {
        let mut t = OrderedTree::new();
        for i in 0..10_000u32 {
            let _ = t.insert(i, i);
        }
        for i in 0..10_000u32 {
            black_box(t.delete(&i));
        }
    }
}

#[cfg(target_os = "linux")]
iai::main!(
    bench::map_put_10k,
    bench::map_put_10k_presized,
    bench::map_get_hit,
    bench::map_get_miss,
    bench::map_put_remove_5k,
    bench::map_cursor_two_passes,
    bench::tree_insert_delete_10k
);

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("Skipping: iai benches require Linux/valgrind.");
}
