// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Integration tests for dynamic types module.

use super::*;
use crate::config::{RegistryConfig, TYPE_MARKER_KEY};
use crate::Registry;

fn registry() -> Registry {
    let reg = Registry::with_config(RegistryConfig::builtin());
    reg.register_type(
        TypeDescriptorBuilder::new("sensor.Location")
            .string_field("building")
            .field("floor", PrimitiveKind::I16)
            .build(),
    );
    reg.register_type(
        TypeDescriptorBuilder::new("sensor.Reading")
            .field("sensor_id", PrimitiveKind::U32)
            .field("temperature", PrimitiveKind::F64)
            .field("humidity", PrimitiveKind::F32)
            .field("timestamp", PrimitiveKind::Time)
            .struct_field("location", "sensor.Location")
            .sequence_field("samples", DataType::Primitive(PrimitiveKind::F64))
            .map_field("labels", DataType::Primitive(PrimitiveKind::String))
            .build(),
    );
    reg
}

#[test]
fn test_full_workflow() {
    let reg = registry();

    // 1. Create and populate an instance
    let mut data = reg.new_instance("sensor.Reading").expect("instance");
    data.set("sensor_id", 42u32).expect("set sensor_id");
    data.set("temperature", 23.5f64).expect("set temperature");
    data.set("humidity", 65.0f32).expect("set humidity");
    data.set("samples", vec![1.0f64, 2.0]).expect("set samples");

    let mut location = reg.new_instance("sensor.Location").expect("location");
    location.set("building", "Building A").expect("set building");
    data.set("location", location).expect("set location");

    // 2. Verify data
    assert_eq!(data.get::<u32>("sensor_id").unwrap(), 42);
    assert_eq!(data.get::<f64>("temperature").unwrap(), 23.5);
    assert_eq!(data.get::<f32>("humidity").unwrap(), 65.0);
    let loc = data.get::<Instance>("location").unwrap();
    assert_eq!(loc.get::<String>("building").unwrap(), "Building A");

    // 3. Project to a document and back
    let doc = data.to_document();
    assert_eq!(doc[TYPE_MARKER_KEY], Value::from("sensor.Reading"));
    let back = reg.materializer().materialize(&doc).expect("materialize");
    assert_eq!(back.as_instance(), Some(&data));
}

#[test]
fn test_json_workflow() {
    let reg = registry();
    let doc = json::parse_document(
        r#"{
            "TYPENAME": "sensor.Reading",
            "sensor_id": "7",
            "temperature": 19,
            "timestamp": "2025-01-02T03:04:05Z",
            "location": {"building": "B", "floor": 3},
            "samples": [1, "2.5", null],
            "labels": {"zone": "north"}
        }"#,
    )
    .expect("parse");

    let v = reg.materializer().materialize(&doc).expect("materialize");
    let reading = v.as_instance().expect("instance");

    assert_eq!(reading.get::<u32>("sensor_id").unwrap(), 7);
    assert_eq!(reading.get::<f64>("temperature").unwrap(), 19.0);
    assert_eq!(
        reading.get::<chrono::DateTime<chrono::Utc>>("timestamp").unwrap().timestamp(),
        1_735_787_045
    );

    // Nested document without a marker takes the declared type
    let loc = reading.get::<Instance>("location").unwrap();
    assert_eq!(loc.type_name(), "sensor.Location");
    assert_eq!(loc.get::<i16>("floor").unwrap(), 3);

    let samples = reading.get::<Sequence>("samples").unwrap();
    assert_eq!(
        samples.items(),
        &[Value::F64(1.0), Value::F64(2.5), Value::F64(0.0)]
    );

    // Untyped map stays raw
    let labels = reading.get::<Document>("labels").unwrap();
    assert_eq!(labels["zone"], Value::from("north"));

    let text = json::to_json_string(&reading.to_document(), TYPE_MARKER_KEY).expect("json");
    assert!(text.contains(r#""TYPENAME":"sensor.Reading""#));
}

#[test]
fn test_any_field_dispatch() {
    let reg = registry();
    reg.register_type(
        TypeDescriptorBuilder::new("bag.Bag")
            .any_field("payload")
            .build(),
    );

    let mut m = reg.materializer();
    let typed = m
        .materialize(&crate::doc! {
            "TYPENAME" => "bag.Bag",
            "payload" => crate::doc! { "TYPENAME" => "sensor.Location", "building" => "C" },
        })
        .expect("typed payload");
    let payload = typed.as_instance().unwrap().get::<Instance>("payload").unwrap();
    assert_eq!(payload.get::<String>("building").unwrap(), "C");

    let raw = m
        .materialize(&crate::doc! {
            "TYPENAME" => "bag.Bag",
            "payload" => crate::doc! { "free" => 1i64 },
        })
        .expect("raw payload");
    let payload = raw.as_instance().unwrap().get::<Document>("payload").unwrap();
    assert_eq!(payload["free"], Value::I64(1));

    let scalar = m
        .materialize(&crate::doc! { "TYPENAME" => "bag.Bag", "payload" => 2.5f64 })
        .expect("scalar payload");
    assert_eq!(
        scalar.as_instance().unwrap().get_field("payload").unwrap(),
        &Value::F64(2.5)
    );
}
