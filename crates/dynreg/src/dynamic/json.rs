// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON bridge: `serde_json::Value` <-> [`Value`].

use crate::dynamic::{Document, Sequence, Value};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};

/// Parse JSON text into a document. The top level must be an object.
pub fn parse_document(text: &str) -> Result<Document> {
    match serde_json::from_str::<Json>(text)? {
        Json::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, from_json(v))).collect()),
        other => Err(Error::MalformedDocument(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Parse a JSON array of objects.
pub fn parse_documents(text: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Json>(text)? {
        Json::Array(items) => Ok(items.into_iter().map(from_json).collect()),
        other => Err(Error::MalformedDocument(format!(
            "expected a JSON array, found {}",
            json_kind(&other)
        ))),
    }
}

/// Convert a JSON value. Arrays become untyped sequences.
pub fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => from_number(&n),
        Json::String(s) => Value::String(s),
        Json::Array(items) => {
            Value::Sequence(Sequence::untyped(items.into_iter().map(from_json).collect()))
        }
        Json::Object(map) => {
            Value::Document(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

fn from_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::I64(i)
    } else if let Some(u) = n.as_u64() {
        Value::U64(u)
    } else {
        Value::F64(n.as_f64().unwrap_or(0.0))
    }
}

/// Convert to JSON.
///
/// Bytes become base64 text, times RFC 3339 text, instances objects carrying
/// `type_marker`. Non-finite floats become `null`.
pub fn to_json(value: &Value, type_marker: &str) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::I8(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::U8(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::U64(v) => Json::from(*v),
        Value::F32(v) => float(f64::from(*v)),
        Value::F64(v) => float(*v),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(STANDARD.encode(b)),
        Value::Time(t) => Json::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Sequence(seq) => Json::Array(seq.iter().map(|v| to_json(v, type_marker)).collect()),
        Value::Document(doc) => document_to_json(doc, type_marker),
        Value::Instance(inst) => document_to_json(&inst.to_document_with_marker(type_marker), type_marker),
    }
}

fn document_to_json(doc: &Document, type_marker: &str) -> Json {
    let map: Map<String, Json> = doc
        .iter()
        .map(|(k, v)| (k.clone(), to_json(v, type_marker)))
        .collect();
    Json::Object(map)
}

fn float(v: f64) -> Json {
    Number::from_f64(v).map_or(Json::Null, Json::Number)
}

/// Encode a document as compact JSON text (keys sorted).
pub fn to_json_string(doc: &Document, type_marker: &str) -> Result<String> {
    Ok(serde_json::to_string(&document_to_json(doc, type_marker))?)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TYPE_MARKER_KEY;

    #[test]
    fn test_parse_document() {
        let doc = parse_document(
            r#"{"TYPENAME": "shop.Item", "qty": 3, "price": 2.5, "big": 18446744073709551615,
                "tags": ["a", 1, null], "meta": {"k": true}}"#,
        )
        .expect("parse");

        assert_eq!(doc["TYPENAME"], Value::from("shop.Item"));
        assert_eq!(doc["qty"], Value::I64(3));
        assert_eq!(doc["price"], Value::F64(2.5));
        assert_eq!(doc["big"], Value::U64(u64::MAX));

        let tags = doc["tags"].as_sequence().expect("tags");
        assert!(!tags.is_typed());
        assert_eq!(tags.len(), 3);
        assert!(tags.items()[2].is_null());

        let meta = doc["meta"].as_document().expect("meta");
        assert_eq!(meta["k"], Value::Bool(true));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            parse_document("[1, 2]"),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(parse_document("{"), Err(Error::Json(_))));
        assert!(parse_documents(r#"[{"a": 1}, {"b": 2}]"#).expect("array").len() == 2);
    }

    #[test]
    fn test_to_json_string_sorted() {
        let doc = crate::doc! { "b" => 1i64, "a" => Value::Bytes(vec![0xff]), "c" => f64::NAN };
        let text = to_json_string(&doc, TYPE_MARKER_KEY).expect("encode");
        assert_eq!(text, r#"{"a":"/w==","b":1,"c":null}"#);
    }
}
