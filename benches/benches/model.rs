// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_model`: writes, reachability, wire round trips
//! and patch draining, over the demo catalog.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_model::{Document, GraphDeserializer, Value, serialize};
use understory_model_demos::choropleth::{self, Choropleth};
use understory_model_demos::{catalog, data};

fn chart(split: u32) -> Choropleth {
    choropleth::build(&data::synthetic(12, 4, split), "bench").unwrap()
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("model/write");

    group.bench_function("set/float", |b| {
        let mut chart = chart(1);
        let mut alpha = 0.0_f64;
        b.iter(|| {
            alpha = if alpha >= 1.0 { 0.0 } else { alpha + 0.01 };
            black_box(chart.document.set(chart.counties, "fill_alpha", alpha).unwrap())
        });
    });

    group.bench_function("set/rejected", |b| {
        let mut chart = chart(1);
        b.iter(|| black_box(chart.document.set(chart.counties, "fill_alpha", 1.5).is_err()));
    });

    group.bench_function("push/reference", |b| {
        b.iter_batched(
            || chart(1),
            |mut chart| {
                let doc = &mut chart.document;
                for _ in 0..32 {
                    let bar = doc
                        .create_with("ColorBar", [("color_mapper", chart.mapper)])
                        .unwrap();
                    doc.push(chart.plot, "right", bar).unwrap();
                }
                black_box(doc.recompute_reachability());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_reachability(c: &mut Criterion) {
    let mut group = c.benchmark_group("model/reachability");

    for len in [64_u32, 1024] {
        // Color bars hanging off one plot's right panel.
        let registry = catalog::registry().unwrap();
        let mut doc = Document::new(registry);
        let plot = doc.create("Plot").unwrap();
        let mapper = doc.create("LinearColorMapper").unwrap();
        let bars: Value = (0..len)
            .map(|_| {
                doc.create_with("ColorBar", [("color_mapper", mapper)])
                    .unwrap()
            })
            .collect();
        doc.add_root(plot).unwrap();

        group.bench_function(BenchmarkId::new("attach_detach", len), |b| {
            b.iter(|| {
                doc.set(plot, "right", bars.clone()).unwrap();
                black_box(doc.recompute_reachability());
                doc.set(plot, "right", Value::Seq(Vec::new())).unwrap();
                black_box(doc.recompute_reachability());
            });
        });
    }

    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("model/wire");

    for split in [2_u32, 8] {
        let chart = chart(split);
        let graph = serialize(&chart.document);
        let text = graph.to_json().unwrap();
        let registry = chart.document.registry().clone();
        let counties = 48 * split * split;

        group.bench_function(BenchmarkId::new("serialize", counties), |b| {
            b.iter(|| black_box(serialize(&chart.document)));
        });
        group.bench_function(BenchmarkId::new("to_json", counties), |b| {
            b.iter(|| black_box(graph.to_json().unwrap()));
        });
        group.bench_function(BenchmarkId::new("from_json", counties), |b| {
            let deserializer = GraphDeserializer::new(registry.clone());
            b.iter(|| black_box(deserializer.from_json(&text).unwrap()));
        });
    }

    group.finish();
}

fn bench_patches(c: &mut Criterion) {
    let mut group = c.benchmark_group("model/patches");

    for writes in [16_usize, 256] {
        group.bench_function(BenchmarkId::new("drain_and_apply", writes), |b| {
            b.iter_batched(
                || {
                    let mut chart = chart(2);
                    let snapshot = chart.document.snapshot();
                    let mirror = GraphDeserializer::new(chart.document.registry().clone())
                        .deserialize(&snapshot)
                        .unwrap();
                    for i in 0..writes {
                        let width = 0.5 + (i % 10) as f64 / 10.0;
                        chart
                            .document
                            .set(chart.states, "line_width", width)
                            .unwrap();
                    }
                    (chart, mirror)
                },
                |(mut chart, mut mirror)| {
                    let patches = chart.document.drain_patches();
                    mirror.apply_patches(&patches).unwrap();
                    black_box(mirror);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_write,
    bench_reachability,
    bench_wire,
    bench_patches
);
criterion_main!(benches);
