use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lazyweld::prelude::*;
use std::hint::black_box;

fn input(size: i64) -> Vec<i64> {
    (0..size).map(|x| (x * 7919) % size).collect()
}

fn bench_stateless_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("stateless_chain");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        let stream = Stream::of(input(*size));

        group.bench_with_input(BenchmarkId::new("head_only", size), &stream, |b, stream| {
            b.iter(|| black_box(stream.collect().unwrap()));
        });

        let chain = stream.filter(|x| x % 2 == 0).map(|x| black_box(x * 3));
        group.bench_with_input(BenchmarkId::new("filter_map", size), &chain, |b, chain| {
            b.iter(|| black_box(chain.collect().unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("reduce", size), &chain, |b, chain| {
            b.iter(|| black_box(chain.reduce(0, |acc, x| acc + x).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("plain_iterator", size), size, |b, &size| {
            let items = input(size);
            b.iter(|| {
                let result: Vec<i64> = items
                    .iter()
                    .filter(|x| *x % 2 == 0)
                    .map(|x| black_box(x * 3))
                    .collect();
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_stateful_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("stateful_chain");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        let stream = Stream::of(input(*size));

        let sorted = stream.map(|x| x % 500).sorted();
        group.bench_with_input(BenchmarkId::new("sorted", size), &sorted, |b, sorted| {
            b.iter(|| black_box(sorted.collect().unwrap()));
        });

        let distinct = stream.map(|x| x % 500).distinct();
        group.bench_with_input(
            BenchmarkId::new("distinct", size),
            &distinct,
            |b, distinct| {
                b.iter(|| black_box(distinct.collect().unwrap()));
            },
        );

        let both = stream.map(|x| x % 500).distinct().sorted();
        group.bench_with_input(
            BenchmarkId::new("distinct_sorted", size),
            &both,
            |b, both| {
                b.iter(|| black_box(both.collect().unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_short_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_circuit");
    let stream = Stream::of(input(100_000));

    for enabled in [true, false].iter() {
        let limited = stream.short_circuit(*enabled).limit(10);
        group.bench_with_input(
            BenchmarkId::new("limit_10", enabled),
            &limited,
            |b, limited| {
                b.iter(|| black_box(limited.collect().unwrap()));
            },
        );
    }

    group.bench_function("find_first", |b| {
        let chain = stream.filter(|x| *x > 99_990);
        b.iter(|| black_box(chain.find_first().unwrap()));
    });

    group.finish();
}

fn bench_chain_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_construction");

    for depth in [1, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::new("append", depth), depth, |b, &depth| {
            b.iter(|| {
                let mut stream = Stream::of(vec![1i64, 2, 3]);
                for _ in 0..depth {
                    stream = stream.map(|x| x + 1);
                }
                black_box(stream.collect().unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_stateless_chain,
    bench_stateful_chain,
    bench_short_circuit,
    bench_chain_construction
);
criterion_main!(benches);
