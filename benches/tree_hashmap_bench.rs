use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::hash::{BuildHasher, Hasher};
use std::time::Duration;
use tree_hashmap::{TableConfig, TreeHashMap};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

// Sends every key to one of 4 hash values: worst case for chained buckets,
// O(log n) per bucket here.
#[derive(Clone, Default)]
struct FewHashes;
#[derive(Default)]
struct FewHashesHasher(u64);
impl BuildHasher for FewHashes {
    type Hasher = FewHashesHasher;
    fn build_hasher(&self) -> FewHashesHasher {
        FewHashesHasher::default()
    }
}
impl Hasher for FewHashesHasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_add(u64::from(*b));
        }
    }
    fn finish(&self) -> u64 {
        self.0 % 4
    }
}

fn bench_put_fresh_100k(c: &mut Criterion) {
    c.bench_function("map::put_fresh_100k", |b| {
        b.iter_batched(
            TreeHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.put(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

// Presized so no growth happens; compare with put_fresh to isolate rehash cost.
fn bench_put_presized_100k(c: &mut Criterion) {
    c.bench_function("map::put_presized_100k", |b| {
        b.iter_batched(
            || {
                TreeHashMap::<String, u64>::with_config(
                    TableConfig::new().with_initial_capacity(262_144),
                )
                .unwrap()
            },
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.put(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

// One blocking rehash of ~96k entries (the 128k -> 256k doubling).
fn bench_single_resize(c: &mut Criterion) {
    c.bench_function("map::single_resize_96k", |b| {
        b.iter_batched(
            || {
                let mut m = TreeHashMap::<u64, u64>::with_config(
                    TableConfig::new().with_initial_capacity(131_072),
                )
                .unwrap();
                for x in lcg(9).take(98_304) {
                    m.put(x, x);
                }
                m
            },
            |mut m| {
                m.put(u64::MAX, 0);
                black_box(m)
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_get_hit_100k(c: &mut Criterion) {
    let mut m = TreeHashMap::new();
    let keys: Vec<String> = lcg(7).take(100_000).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.put(k.clone(), i as u64);
    }
    c.bench_function("map::get_hit_100k", |b| {
        b.iter(|| {
            for k in &keys {
                black_box(m.get(k.as_str()));
            }
        })
    });
}

fn bench_get_collisions_10k(c: &mut Criterion) {
    let mut m = TreeHashMap::with_hasher(FewHashes);
    let keys: Vec<String> = lcg(13).take(10_000).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.put(k.clone(), i as u64);
    }
    c.bench_function("map::get_collisions_10k_in_4_buckets", |b| {
        b.iter(|| {
            for k in &keys {
                black_box(m.get(k.as_str()));
            }
        })
    });
}

fn bench_remove_all_100k(c: &mut Criterion) {
    c.bench_function("map::remove_all_100k", |b| {
        b.iter_batched(
            || {
                let keys: Vec<String> = lcg(5).take(100_000).map(key).collect();
                let mut m = TreeHashMap::new();
                for k in &keys {
                    m.put(k.clone(), 0u8);
                }
                (m, keys)
            },
            |(mut m, keys)| {
                let n = m.remove_all(keys.iter().map(String::as_str));
                black_box((m, n))
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_cursor_pass_100k(c: &mut Criterion) {
    let m: TreeHashMap<u64, ()> = lcg(3).take(100_000).map(|x| (x, ())).collect();
    c.bench_function("map::cursor_pass_100k", |b| {
        let mut cursor = m.key_cursor();
        b.iter(|| {
            cursor.cycle();
            black_box(cursor.remaining(&m).count())
        })
    });
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(5))
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_put_fresh_100k,
        bench_put_presized_100k,
        bench_single_resize,
        bench_get_hit_100k,
        bench_get_collisions_10k,
        bench_remove_all_100k,
        bench_cursor_pass_100k
}
criterion_main!(benches);
