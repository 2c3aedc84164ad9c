// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_cache::{Cache, MAX_UNITS, Unit};

const NAMES: [&str; 8] = ["u0", "u1", "u2", "u3", "u4", "u5", "u6", "u7"];

fn unit(index: u8) -> Unit {
    Unit::new(index, NAMES[usize::from(index) % NAMES.len()])
}

/// A chain `u0 <- u1 <- ... <- u(n-1)` with every unit valid.
fn chain(n: u8) -> Cache<u64> {
    let mut cache = Cache::new();
    for index in 0..n {
        if index == 0 {
            cache.declare(unit(index), &[]);
        } else {
            cache.declare(unit(index), &[unit(index - 1)]);
        }
        cache.update(unit(index));
    }
    cache
}

/// Every unit depends on every lower unit.
fn dense(n: u8) -> Cache<u64> {
    let mut cache = Cache::new();
    for index in 0..n {
        let deps: Vec<Unit> = (0..index).map(unit).collect();
        cache.declare(unit(index), &deps);
        cache.update(unit(index));
    }
    cache
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_cache");

    for &n in &[8_u8, 64] {
        assert!(usize::from(n) <= MAX_UNITS);
        group.bench_function(format!("invalidate_chain(n={n})"), |b| {
            b.iter_batched(
                || chain(n),
                |mut cache| {
                    black_box(cache.invalidate(unit(0)));
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("invalidate_dense(n={n})"), |b| {
            b.iter_batched(
                || dense(n),
                |mut cache| {
                    black_box(cache.invalidate(unit(0)));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("test_valid", |b| {
        let cache = chain(16);
        b.iter(|| black_box(cache.test(black_box(unit(15)))));
    });

    group.finish();
}

criterion_group!(benches, bench_cache);
criterion_main!(benches);
