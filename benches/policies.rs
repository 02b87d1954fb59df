use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use crp::entry::Record;
use crp::policy::lfu::{LfuCache, LfuCore};
use crp::policy::lru::{LruCache, LruCore};
use crp::traits::ReplacementPolicy;

const CAPACITY: usize = 1024;

fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("key-{i}")).collect()
}

fn bench_core_put_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("core_put_get");
    let warm = keys(CAPACITY);
    let fresh = keys(CAPACITY * 2).split_off(CAPACITY);
    group.throughput(Throughput::Elements((CAPACITY * 2) as u64));

    group.bench_function("lru", |b| {
        b.iter_batched(
            || {
                let mut cache = LruCore::new(CAPACITY, Record::new).unwrap();
                for (i, key) in warm.iter().enumerate() {
                    cache.put(key, i as u64).unwrap();
                }
                cache
            },
            |mut cache| {
                for (i, key) in fresh.iter().enumerate() {
                    cache.put(black_box(key), i as u64).unwrap();
                    let _ = black_box(cache.get(black_box(&warm[i])));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("lfu", |b| {
        b.iter_batched(
            || {
                let mut cache = LfuCore::new(CAPACITY, Record::new).unwrap();
                for (i, key) in warm.iter().enumerate() {
                    cache.put(key, i as u64).unwrap();
                }
                cache
            },
            |mut cache| {
                for (i, key) in fresh.iter().enumerate() {
                    cache.put(black_box(key), i as u64).unwrap();
                    let _ = black_box(cache.get(black_box(&warm[i])));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_get_hotset(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hotset");
    let hot = keys(CAPACITY);
    group.throughput(Throughput::Elements(CAPACITY as u64));

    let lru = LruCache::new(CAPACITY, Record::new).unwrap();
    let lfu = LfuCache::new(CAPACITY, Record::new).unwrap();
    for (i, key) in hot.iter().enumerate() {
        lru.put(key, i as u64).unwrap();
        lfu.put(key, i as u64).unwrap();
    }

    group.bench_function("lru_locked", |b| {
        b.iter(|| {
            for key in &hot {
                let _ = black_box(lru.get(black_box(key)));
            }
        })
    });
    group.bench_function("lfu_locked", |b| {
        b.iter(|| {
            for key in &hot {
                let _ = black_box(lfu.get(black_box(key)));
            }
        })
    });
    group.finish();
}

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction_churn");
    for capacity in [64usize, 1024, 16_384] {
        let stream = keys(capacity * 4);
        group.throughput(Throughput::Elements(stream.len() as u64));

        group.bench_with_input(BenchmarkId::new("lru", capacity), &stream, |b, stream| {
            b.iter_batched(
                || LruCore::new(capacity, Record::new).unwrap(),
                |mut cache| {
                    for key in stream {
                        cache.put(black_box(key), ()).unwrap();
                    }
                    cache
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("lfu", capacity), &stream, |b, stream| {
            b.iter_batched(
                || LfuCore::new(capacity, Record::new).unwrap(),
                |mut cache| {
                    for key in stream {
                        cache.put(black_box(key), ()).unwrap();
                    }
                    cache
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    let lfu = LfuCache::new(CAPACITY, Record::new).unwrap();
    for (i, key) in keys(CAPACITY).iter().enumerate() {
        lfu.put(key, i as u64).unwrap();
        for _ in 0..(i % 7) {
            lfu.get(key).unwrap();
        }
    }
    group.throughput(Throughput::Elements(CAPACITY as u64));
    group.bench_function("lfu_ordered", |b| b.iter(|| black_box(lfu.snapshot())));
    group.finish();
}

criterion_group!(
    benches,
    bench_core_put_get,
    bench_get_hotset,
    bench_eviction_churn,
    bench_snapshot
);
criterion_main!(benches);
