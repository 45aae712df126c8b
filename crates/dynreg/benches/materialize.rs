// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Materialization and Invocation Benchmarks
//!
//! Measures:
//! - Flat and nested document materialization
//! - Reference collapsing with an entity callback
//! - JSON parse + materialize end to end
//! - Binary encode/decode of instances
//! - Function calls with argument conversion

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dynreg::dynamic::{json, DataType, PrimitiveKind, TypeDescriptorBuilder, Value};
use dynreg::{codec, doc, Document, FunctionDescriptor, Materializer, Registry, RegistryConfig, Signature};

fn registry() -> Registry {
    let reg = Registry::with_config(RegistryConfig::builtin());
    reg.register_type(
        TypeDescriptorBuilder::new("bench.Tag")
            .string_field("UUID")
            .string_field("label")
            .build(),
    );
    reg.register_type(
        TypeDescriptorBuilder::new("bench.Point")
            .field("x", PrimitiveKind::F64)
            .field("y", PrimitiveKind::F64)
            .build(),
    );
    reg.register_type(
        TypeDescriptorBuilder::new("bench.Track")
            .field("id", PrimitiveKind::U64)
            .string_field("name")
            .field("active", PrimitiveKind::Bool)
            .field("seen", PrimitiveKind::Time)
            .sequence_field("points", DataType::Pointer("bench.Point".into()))
            .string_field("M_tag")
            .build(),
    );
    reg.register_func(
        "scale",
        FunctionDescriptor::new(
            Signature::new(vec![
                DataType::Primitive(PrimitiveKind::F64),
                DataType::Primitive(PrimitiveKind::I64),
            ])
            .returns(1),
            |args| Ok(vec![Value::F64(args.get::<f64>(0)? * args.get::<i64>(1)? as f64)]),
        ),
    );
    reg
}

fn track_doc(points: usize) -> Document {
    let pts: Vec<Value> = (0..points)
        .map(|i| Value::Document(doc! { "x" => i as f64, "y" => format!("{}.5", i) }))
        .collect();
    doc! {
        "TYPENAME" => "bench.Track",
        "id" => "123456789",
        "name" => "  track  ",
        "active" => "true",
        "seen" => "2025-06-01T12:00:00Z",
        "points" => pts,
        "M_tag" => doc! { "TYPENAME" => "bench.Tag", "UUID" => "tag-1", "label" => "hot" },
    }
}

// ============================================================================
// Benchmark 1: Materialization
// ============================================================================

fn bench_materialize(c: &mut Criterion) {
    let reg = registry();
    let mut group = c.benchmark_group("materialize");

    for points in [0usize, 10, 100] {
        let doc = track_doc(points);
        group.throughput(Throughput::Elements(points as u64 + 2));
        group.bench_with_input(BenchmarkId::new("track", points), &doc, |b, doc| {
            b.iter(|| {
                let value = reg.materializer().materialize(black_box(doc)).expect("materialize");
                black_box(value);
            });
        });
    }

    let doc = track_doc(10);
    group.bench_function("track_with_callback", |b| {
        b.iter(|| {
            let mut entities = 0usize;
            let value = Materializer::new(&reg)
                .on_entity(|_| entities += 1)
                .materialize(black_box(&doc))
                .expect("materialize");
            black_box((value, entities));
        });
    });

    group.finish();
}

fn bench_json_pipeline(c: &mut Criterion) {
    let reg = registry();
    let text = json::to_json_string(&track_doc(20), "TYPENAME").expect("json");

    c.bench_function("json_parse_materialize", |b| {
        b.iter(|| {
            let doc = json::parse_document(black_box(&text)).expect("parse");
            black_box(reg.materializer().materialize(&doc).expect("materialize"));
        });
    });
}

// ============================================================================
// Benchmark 2: Binary codec
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let reg = registry();
    let track = reg
        .materializer()
        .materialize(&track_doc(50))
        .expect("materialize");
    let encoded = codec::to_bytes(&track).expect("encode");

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("encode_track", |b| {
        b.iter(|| black_box(codec::to_bytes(black_box(&track)).expect("encode")));
    });

    group.bench_function("decode_track", |b| {
        b.iter(|| {
            black_box(codec::from_bytes(&reg, black_box(&encoded), "bench.Track").expect("decode"))
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark 3: Invocation
// ============================================================================

fn bench_call_function(c: &mut Criterion) {
    let reg = registry();

    c.bench_function("call_function_convert", |b| {
        b.iter(|| {
            let out = reg
                .call_function("scale", vec![Value::F32(1.5), black_box(Value::U8(4))])
                .expect("call");
            black_box(out);
        });
    });
}

criterion_group!(
    benches,
    bench_materialize,
    bench_json_pipeline,
    bench_codec,
    bench_call_function
);
criterion_main!(benches);
