// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instances of registered types.

use crate::coerce;
use crate::config::TYPE_MARKER_KEY;
use crate::dynamic::{DataType, Document, Sequence, TypeDescriptor, Value};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// An owned, typed container for the fields of a registered type.
///
/// Fields are stored in declaration order; the descriptor is shared with the
/// registry that produced it.
#[derive(Debug, Clone)]
pub struct Instance {
    descriptor: Arc<TypeDescriptor>,
    fields: Vec<Value>,
}

impl Instance {
    /// Wrap pre-built field values. `fields` must follow declaration order.
    pub(crate) fn from_parts(descriptor: Arc<TypeDescriptor>, fields: Vec<Value>) -> Self {
        debug_assert_eq!(descriptor.fields().len(), fields.len());
        Self { descriptor, fields }
    }

    /// Get the type descriptor.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Get the type name.
    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Get a field value with type conversion.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        T::from_value(self.get_field(name)?)
    }

    /// Set a field value.
    ///
    /// Values whose representation differs from the declared type are
    /// converted when possible (numeric widths, string/bytes).
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(name)?;
        let value = value.into();
        let declared = &self.descriptor.fields()[index].data_type;
        let stored = coerce::convert(&value, declared)
            .ok_or_else(|| Error::mismatch(declared.to_string(), value.kind()))?;
        self.fields[index] = stored;
        Ok(())
    }

    /// Get a field value by name.
    pub fn get_field(&self, name: &str) -> Result<&Value> {
        let index = self.index_of(name)?;
        Ok(&self.fields[index])
    }

    /// Get a mutable field value by name.
    pub fn get_field_mut(&mut self, name: &str) -> Result<&mut Value> {
        let index = self.index_of(name)?;
        Ok(&mut self.fields[index])
    }

    pub(crate) fn set_index(&mut self, index: usize, value: Value) {
        self.fields[index] = value;
    }

    /// Iterate over fields (name, value) in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.descriptor
            .fields()
            .iter()
            .zip(&self.fields)
            .map(|(f, v)| (f.name.as_str(), v))
    }

    /// Identity stored in the field named `identity_key`, if non-empty.
    pub fn identity(&self, identity_key: &str) -> Option<String> {
        let value = self.get_field(identity_key).ok()?;
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            other => coerce::to_string(other).ok().filter(|s| !s.is_empty()),
        }
    }

    /// Project back into a document carrying the default type marker.
    pub fn to_document(&self) -> Document {
        self.to_document_with_marker(TYPE_MARKER_KEY)
    }

    /// Project back into a document carrying `type_marker`.
    ///
    /// Nested instances are projected recursively. Values in declared
    /// `Bytes` slots (and `Bytes` sequence elements) are rendered as standard
    /// base64 text; bytes held in dynamic slots stay raw.
    pub fn to_document_with_marker(&self, type_marker: &str) -> Document {
        let mut doc: Document = self
            .descriptor
            .fields()
            .iter()
            .zip(&self.fields)
            .map(|(f, value)| (f.name.clone(), project(value, &f.data_type, type_marker)))
            .collect();
        doc.insert(
            type_marker.to_string(),
            Value::String(self.type_name().to_string()),
        );
        doc
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.descriptor
            .field_index(name)
            .ok_or_else(|| Error::FieldNotFound {
                type_name: self.type_name().to_string(),
                field: name.to_string(),
            })
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.fields == other.fields
    }
}

fn project(value: &Value, declared: &DataType, type_marker: &str) -> Value {
    match (declared, value) {
        (_, Value::Instance(inst)) => Value::Document(inst.to_document_with_marker(type_marker)),
        (DataType::Bytes, Value::Bytes(bytes)) => Value::String(STANDARD.encode(bytes)),
        (DataType::Sequence(elem), Value::Sequence(seq)) => Value::Sequence(Sequence::untyped(
            seq.iter().map(|v| project(v, elem, type_marker)).collect(),
        )),
        (_, Value::Sequence(seq)) => Value::Sequence(Sequence::untyped(
            seq.iter()
                .map(|v| project(v, seq.element(), type_marker))
                .collect(),
        )),
        (_, Value::Document(doc)) => Value::Document(
            doc.iter()
                .map(|(k, v)| (k.clone(), project(v, &DataType::Any, type_marker)))
                .collect(),
        ),
        (_, other) => other.clone(),
    }
}

// ============================================================================
// Typed extraction
// ============================================================================

/// Strict extraction of a Rust value from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v.clone()),
                    other => Err(Error::mismatch($name, other.kind())),
                }
            }
        }
    };
}

impl_from_value!(bool, Bool, "bool");
impl_from_value!(i8, I8, "i8");
impl_from_value!(i16, I16, "i16");
impl_from_value!(i32, I32, "i32");
impl_from_value!(i64, I64, "i64");
impl_from_value!(u8, U8, "u8");
impl_from_value!(u16, U16, "u16");
impl_from_value!(u32, U32, "u32");
impl_from_value!(u64, U64, "u64");
impl_from_value!(f32, F32, "f32");
impl_from_value!(f64, F64, "f64");
impl_from_value!(String, String, "string");
impl_from_value!(Vec<u8>, Bytes, "bytes");
impl_from_value!(DateTime<Utc>, Time, "time");
impl_from_value!(Sequence, Sequence, "sequence");
impl_from_value!(Document, Document, "document");
impl_from_value!(Instance, Instance, "instance");

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{DataType, PrimitiveKind, TypeDescriptorBuilder};

    fn point() -> Instance {
        let desc = Arc::new(
            TypeDescriptorBuilder::new("geo.Point")
                .field("x", PrimitiveKind::F64)
                .field("y", PrimitiveKind::I32)
                .bytes_field("tag")
                .string_field("UUID")
                .build(),
        );
        Instance::from_parts(
            desc,
            vec![
                Value::F64(0.0),
                Value::I32(0),
                Value::Bytes(Vec::new()),
                Value::String(String::new()),
            ],
        )
    }

    #[test]
    fn test_get_set() {
        let mut p = point();
        p.set("x", 1.5f64).expect("set x");
        p.set("y", 7i64).expect("set y with narrowing");

        assert_eq!(p.get::<f64>("x").expect("get x"), 1.5);
        assert_eq!(p.get::<i32>("y").expect("get y"), 7);
        assert!(matches!(
            p.get::<String>("x"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let mut p = point();
        assert!(matches!(
            p.set("z", 1i64),
            Err(Error::FieldNotFound { .. })
        ));
        assert!(p.get_field("z").is_err());
    }

    #[test]
    fn test_set_rejects_unconvertible() {
        let mut p = point();
        let err = p.set("x", Value::from(vec![1i64])).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_identity() {
        let mut p = point();
        assert_eq!(p.identity("UUID"), None);
        p.set("UUID", "abc").expect("set uuid");
        assert_eq!(p.identity("UUID").as_deref(), Some("abc"));
        assert_eq!(p.identity("missing"), None);
    }

    #[test]
    fn test_to_document() {
        let mut p = point();
        p.set("tag", Value::Bytes(b"hi".to_vec())).expect("set tag");
        let doc = p.to_document();

        assert_eq!(doc.get("TYPENAME").and_then(Value::as_str), Some("geo.Point"));
        assert_eq!(doc.get("tag").and_then(Value::as_str), Some("aGk="));
        assert_eq!(doc.get("x"), Some(&Value::F64(0.0)));
    }

    #[test]
    fn test_to_document_bytes_follow_declared_type() {
        let desc = Arc::new(
            TypeDescriptorBuilder::new("blob.Box")
                .any_field("payload")
                .sequence_field("chunks", DataType::Bytes)
                .map_field("meta", DataType::Any)
                .build(),
        );
        let mut b = Instance::from_parts(
            desc,
            vec![
                Value::Null,
                Value::Sequence(Sequence::typed(DataType::Bytes, Vec::new())),
                Value::Null,
            ],
        );
        b.set("payload", Value::Bytes(vec![1, 2, 3])).expect("payload");
        b.set("chunks", vec![Value::Bytes(b"hi".to_vec())]).expect("chunks");
        b.set("meta", crate::doc! { "raw" => Value::Bytes(vec![7]) }).expect("meta");

        let doc = b.to_document();
        assert_eq!(doc["payload"], Value::Bytes(vec![1, 2, 3]));
        assert_eq!(doc["chunks"].as_sequence().unwrap().items(), &[Value::from("aGk=")]);
        assert_eq!(doc["meta"].as_document().unwrap()["raw"], Value::Bytes(vec![7]));
    }

    #[test]
    fn test_fields_iter_order() {
        let p = point();
        let names: Vec<_> = p.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["x", "y", "tag", "UUID"]);
        assert_eq!(
            p.descriptor().fields()[0].data_type,
            DataType::Primitive(PrimitiveKind::F64)
        );
    }

    #[test]
    fn test_optional_extraction() {
        let v = Value::Null;
        assert_eq!(Option::<i64>::from_value(&v).expect("null"), None);
        assert_eq!(
            Option::<i64>::from_value(&Value::I64(3)).expect("some"),
            Some(3)
        );
    }
}
