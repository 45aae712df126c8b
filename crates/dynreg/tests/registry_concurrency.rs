// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::doc_markdown)] // Test documentation
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::items_after_statements)] // Test helpers
#![allow(clippy::needless_pass_by_value)] // Thread closures own their inputs

//! Registry concurrency tests
//!
//! Readers run against writers that keep replacing and deleting entries.
//! Every descriptor a reader observes must be one that was registered
//! whole: field count and field names always agree with its version tag.

use dynreg::dynamic::{DataType, PrimitiveKind, TypeDescriptor, TypeDescriptorBuilder, Value};
use dynreg::{doc, FunctionDescriptor, Registry, RegistryConfig, Signature};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const TYPE_NAME: &str = "live.Shape";
const READERS: usize = 6;
const WRITES: usize = 500;

/// Version `v` declares `version` plus `v + 1` fields named `f{v}_{i}`.
fn shape_version(v: usize) -> TypeDescriptor {
    let mut builder =
        TypeDescriptorBuilder::new(TYPE_NAME).field("version", PrimitiveKind::U32);
    for i in 0..=v {
        builder = builder.field(format!("f{}_{}", v, i), PrimitiveKind::I64);
    }
    builder.build()
}

fn version_of(desc: &TypeDescriptor) -> usize {
    let first = &desc.fields()[1].name;
    let tag = first
        .strip_prefix('f')
        .and_then(|rest| rest.split('_').next())
        .expect("versioned field name");
    tag.parse().expect("numeric version")
}

fn assert_whole(desc: &TypeDescriptor) {
    assert_eq!(desc.name(), TYPE_NAME);
    assert_eq!(desc.fields()[0].name, "version");
    let v = version_of(desc);
    assert_eq!(desc.fields().len(), v + 2, "partial descriptor: {:?}", desc);
    for (i, field) in desc.fields()[1..].iter().enumerate() {
        assert_eq!(field.name, format!("f{}_{}", v, i));
        assert_eq!(field.data_type, DataType::Primitive(PrimitiveKind::I64));
        assert_eq!(desc.field_index(&field.name), Some(i + 1));
    }
}

#[test]
fn test_readers_never_observe_partial_descriptors() {
    let reg = Arc::new(Registry::with_config(RegistryConfig::builtin()));
    reg.register_type(shape_version(0));

    let barrier = Arc::new(Barrier::new(READERS + 1));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..READERS)
        .map(|id| {
            let reg = Arc::clone(&reg);
            let barrier = Arc::clone(&barrier);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                barrier.wait();
                while !done.load(Ordering::Acquire) {
                    match fastrand::usize(..3) {
                        0 => {
                            if let Some(desc) = reg.get_type(TYPE_NAME) {
                                assert_whole(&desc);
                            }
                        }
                        1 => {
                            if let Ok(inst) = reg.new_instance(TYPE_NAME) {
                                assert_whole(inst.descriptor());
                                assert_eq!(inst.fields().count(), inst.descriptor().fields().len());
                            }
                        }
                        _ => {
                            let d = doc! { "TYPENAME" => TYPE_NAME, "version" => id as i64 };
                            let value = reg.materializer().materialize(&d).expect("materialize");
                            match value {
                                Value::Instance(inst) => {
                                    assert_whole(inst.descriptor());
                                    assert_eq!(inst.get::<u32>("version").unwrap(), id as u32);
                                }
                                // Deleted between writes: passed through untouched
                                Value::Document(back) => assert_eq!(back, d),
                                other => panic!("unexpected value: {:?}", other),
                            }
                        }
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    for v in 1..=WRITES {
        if v % 50 == 0 {
            reg.delete_type(TYPE_NAME);
        } else {
            reg.register_type(shape_version(v % 16));
        }
        if v % 100 == 0 {
            thread::yield_now();
        }
    }
    reg.register_type(shape_version(3));
    done.store(true, Ordering::Release);

    for handle in readers {
        handle.join().expect("reader panicked");
    }

    assert_whole(&reg.get_type(TYPE_NAME).expect("final version"));
    assert_eq!(version_of(&reg.get_type(TYPE_NAME).unwrap()), 3);
}

#[test]
fn test_concurrent_function_registration_and_calls() {
    let reg = Arc::new(Registry::with_config(RegistryConfig::builtin()));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4i64)
        .map(|t| {
            let reg = Arc::clone(&reg);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..100i64 {
                    let name = format!("f{}_{}", t, i);
                    reg.register_func(
                        &name,
                        FunctionDescriptor::new(
                            Signature::new(vec![DataType::Primitive(PrimitiveKind::I64)])
                                .returns(1),
                            move |args| Ok(vec![Value::I64(args.get::<i64>(0)? + t * 1000 + i)]),
                        ),
                    );
                    let out = reg.call_function(&name, vec![Value::I64(1)]).expect("call");
                    assert_eq!(out, vec![Value::I64(1 + t * 1000 + i)]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let names = reg.list_funcs();
    assert_eq!(names.len(), 400);
    assert!(names.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_global_registry_is_shared() {
    let handles: Vec<_> = (0..4)
        .map(|t| {
            thread::spawn(move || {
                Registry::global().register_type(
                    TypeDescriptorBuilder::new(format!("global.T{}", t))
                        .string_field("name")
                        .build(),
                );
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("registration panicked");
    }

    for t in 0..4 {
        assert!(Registry::global().contains_type(&format!("global.T{}", t)));
    }
}
