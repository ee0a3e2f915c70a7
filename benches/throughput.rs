//! Throughput Benchmark for StashKV
//!
//! This benchmark measures the performance of the expiring store
//! under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use stashkv::{ExpiringStore, StoreConfig};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let store = Arc::new(ExpiringStore::new());

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(format!("key:{}", i), "small_value".to_string());
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut i = 0u64;
        let value = "x".repeat(1024); // 1KB value
        b.iter(|| {
            store.set(format!("key:{}", i), value.clone());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let store = Arc::new(ExpiringStore::new());

    // Pre-populate with data
    for i in 0..100_000 {
        store.set(format!("key:{}", i), format!("value:{}", i));
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(store.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(store.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let store = Arc::new(ExpiringStore::new());

    // Pre-populate
    for i in 0..10_000 {
        store.set(format!("key:{}", i), format!("value:{}", i));
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                // 20% writes
                store.set(format!("new:{}", i), "value".to_string());
            } else {
                // 80% reads
                let key = format!("key:{}", i % 10_000);
                black_box(store.get(&key));
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let store = Arc::new(ExpiringStore::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            store.set(key.clone(), i);
                            store.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.len());
        });
    });

    group.finish();
}

/// Benchmark sweeping and enumeration
fn bench_sweep_and_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    group.bench_function("sweep_half_expired", |b| {
        b.iter_with_setup(
            || {
                let store = ExpiringStore::new();
                for i in 0..10_000 {
                    let ttl = if i % 2 == 0 {
                        Duration::ZERO
                    } else {
                        Duration::from_secs(3600)
                    };
                    store.set_with_ttl(format!("key:{}", i), i, ttl);
                }
                store
            },
            |store| black_box(store.sweep()),
        );
    });

    let store = ExpiringStore::new();
    for i in 0..10_000 {
        store.set(format!("key:{}", i), i);
    }

    group.bench_function("keys_all", |b| {
        b.iter(|| black_box(store.keys().count()));
    });

    group.bench_function("values_all", |b| {
        b.iter(|| black_box(store.values().sum::<i32>()));
    });

    group.finish();
}

/// Benchmark persisting outcomes to disk
fn bench_persist(c: &mut Criterion) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let store = ExpiringStore::with_config(
        StoreConfig::default().with_persistence_dir(temp_dir.path()),
    );

    let mut group = c.benchmark_group("persist");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_and_persist", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store
                .set(format!("key:{}", i % 1_000), "value".to_string())
                .persist()
                .unwrap();
            i += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_concurrent,
    bench_sweep_and_scan,
    bench_persist,
);

criterion_main!(benches);
