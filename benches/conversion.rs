//! Conversion benchmarks
//!
//! Measures scalar, array and dispatch-cache throughput in both directions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use typthon_bridge::{
    ConversionEngine, DispatchCache, HostArray, HostType, HostValue, Interpreter, PrimitiveKind,
};

fn bench_scalars(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar");
    let interp = Interpreter::new();
    let guard = interp.acquire();
    let py = guard.token();
    let engine = ConversionEngine::default();

    let int_value = py.int(123_456);
    let str_value = py.str("benchmark");
    let i64_type = HostType::primitive(PrimitiveKind::I64);

    group.bench_function("int_to_i64", |b| {
        b.iter(|| engine.foreign_to_host(py, black_box(&int_value), &i64_type, false))
    });

    group.bench_function("str_to_i64_coercion", |b| {
        let numeric = py.str("987654");
        b.iter(|| engine.foreign_to_host(py, black_box(&numeric), &i64_type, false))
    });

    group.bench_function("str_to_string", |b| {
        b.iter(|| engine.foreign_to_host(py, black_box(&str_value), &HostType::string(), false))
    });

    group.bench_function("mismatch_probe", |b| {
        b.iter(|| engine.foreign_to_host(py, black_box(&str_value), &i64_type, false))
    });

    group.bench_function("i64_to_foreign", |b| {
        let value = HostValue::I64(42);
        b.iter(|| engine.host_to_foreign(py, black_box(&value), &i64_type))
    });

    group.finish();
}

fn bench_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("array");
    let interp = Interpreter::new();
    let guard = interp.acquire();
    let py = guard.token();
    let engine = ConversionEngine::default();
    let i32_type = HostType::primitive(PrimitiveKind::I32);

    for size in [16usize, 256, 4096].iter() {
        let list = py.list((0..*size as i128).map(|v| py.int(v)).collect());
        let target = HostType::array(&i32_type, 1);

        group.bench_with_input(BenchmarkId::new("to_host", size), size, |b, _| {
            b.iter(|| engine.foreign_to_host(py, black_box(&list), &target, false))
        });

        let host = HostValue::Array(HostArray::new(
            i32_type.clone(),
            (0..*size as i32).map(HostValue::I32).collect(),
        ));
        group.bench_with_input(BenchmarkId::new("to_foreign", size), size, |b, _| {
            b.iter(|| engine.host_to_foreign(py, black_box(&host), &target))
        });
    }

    for side in [8usize, 32].iter() {
        let grid = py.list(
            (0..*side)
                .map(|_| py.list((0..*side as i128).map(|v| py.int(v)).collect()))
                .collect(),
        );
        let target = HostType::array(&i32_type, 2);

        group.bench_with_input(BenchmarkId::new("grid_to_host", side), side, |b, _| {
            b.iter(|| engine.foreign_to_host(py, black_box(&grid), &target, false))
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let types: Vec<HostType> = PrimitiveKind::ALL.iter().map(|k| HostType::primitive(*k)).collect();

    group.bench_function("cold_select", |b| {
        b.iter(|| {
            let cache = DispatchCache::new();
            cache.warm(black_box(&types));
            cache.len()
        })
    });

    group.bench_function("warm_hit", |b| {
        let cache = DispatchCache::new();
        cache.warm(&types);
        b.iter(|| {
            for ty in &types {
                black_box(cache.resolve(ty));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_scalars, bench_arrays, bench_dispatch);
criterion_main!(benches);
