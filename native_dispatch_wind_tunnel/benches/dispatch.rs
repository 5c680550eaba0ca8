// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unsafe_code, reason = "benches call native fixtures")]

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use native_dispatch::{Dispatcher, Limits, classify};
use native_dispatch_conformance::{ADD_U64_U8, INTERLEAVE, NOOP, SUM_INTS_10, WEIGH_FLOATS_10};
use native_dispatch_wind_tunnel::{args_for, distinct_shapes};

/// Entry point for `native_dispatch` wind-tunnel benchmarks.
///
/// Warm dispatch measures the steady-state cost of one call (classification, frame building,
/// cache hit, native call and decode). Cold build measures first-use trampoline compilation.
fn bench_dispatch(c: &mut Criterion) {
    bench_warm_dispatch(c);
    bench_classify(c);
    bench_cold_build(c);
}

fn bench_warm_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("warm_dispatch");
    let d = Dispatcher::new(Limits::default()).unwrap();
    for fixture in [NOOP, ADD_U64_U8, INTERLEAVE, SUM_INTS_10, WEIGH_FLOATS_10] {
        let sig = fixture.signature();
        let args = args_for(&fixture);
        let callee = fixture.native();
        d.prewarm(&sig).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name), &args, |b, args| {
            b.iter(|| {
                // SAFETY: fixtures carry their real signatures.
                let out = unsafe { d.dispatch(callee, &sig, black_box(args)) };
                black_box(out.unwrap());
            });
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let limits = Limits::default();
    for fixture in [NOOP, INTERLEAVE, SUM_INTS_10] {
        let sig = fixture.signature();
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name), &sig, |b, sig| {
            b.iter(|| black_box(classify(black_box(sig), &limits).unwrap()));
        });
    }
    group.finish();
}

fn bench_cold_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_build");
    group.sample_size(20);
    for count in [1_usize, 8] {
        let sigs = distinct_shapes(count).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(count), &sigs, |b, sigs| {
            b.iter_batched(
                || Dispatcher::new(Limits::default()).unwrap(),
                |d| {
                    for sig in sigs {
                        black_box(d.prewarm(sig).unwrap());
                    }
                    d
                },
                BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
