// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use crate::dynamic::{DataType, Instance, PrimitiveKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Untyped keyed mapping (a "document").
///
/// Ordered by key so that walks over a document are deterministic.
pub type Document = BTreeMap<String, Value>;

/// A dynamic value: document leaves, instance fields, call arguments and results.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    // Special
    #[default]
    Null,

    // Primitives
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),

    // Composites
    Sequence(Sequence),
    Document(Document),
    Instance(Instance),
}

/// Concrete kind of a [`Value`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    Time,
    Sequence,
    Document,
    Instance,
}

impl ValueKind {
    /// Lower-case name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Time => "time",
            Self::Sequence => "sequence",
            Self::Document => "document",
            Self::Instance => "instance",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered sequence of values with a declared element type.
///
/// `DataType::Any` marks an untyped (possibly heterogeneous) sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    element: DataType,
    items: Vec<Value>,
}

impl Sequence {
    /// Untyped sequence.
    pub fn untyped(items: Vec<Value>) -> Self {
        Self {
            element: DataType::Any,
            items,
        }
    }

    /// Sequence whose elements all have type `element`.
    pub fn typed(element: DataType, items: Vec<Value>) -> Self {
        Self { element, items }
    }

    /// Declared element type.
    pub fn element(&self) -> &DataType {
        &self.element
    }

    /// True unless the element type is `Any`.
    pub fn is_typed(&self) -> bool {
        !matches!(self.element, DataType::Any)
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<Value> {
        &mut self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::untyped(Vec::new())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Value {
    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Concrete kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::I8(_) => ValueKind::I8,
            Self::I16(_) => ValueKind::I16,
            Self::I32(_) => ValueKind::I32,
            Self::I64(_) => ValueKind::I64,
            Self::U8(_) => ValueKind::U8,
            Self::U16(_) => ValueKind::U16,
            Self::U32(_) => ValueKind::U32,
            Self::U64(_) => ValueKind::U64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::String(_) => ValueKind::String,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Time(_) => ValueKind::Time,
            Self::Sequence(_) => ValueKind::Sequence,
            Self::Document(_) => ValueKind::Document,
            Self::Instance(_) => ValueKind::Instance,
        }
    }

    /// The type this value naturally has.
    ///
    /// Used for homogeneity checks on untyped sequences.
    pub fn runtime_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Any,
            Self::Bool(_) => DataType::Primitive(PrimitiveKind::Bool),
            Self::I8(_) => DataType::Primitive(PrimitiveKind::I8),
            Self::I16(_) => DataType::Primitive(PrimitiveKind::I16),
            Self::I32(_) => DataType::Primitive(PrimitiveKind::I32),
            Self::I64(_) => DataType::Primitive(PrimitiveKind::I64),
            Self::U8(_) => DataType::Primitive(PrimitiveKind::U8),
            Self::U16(_) => DataType::Primitive(PrimitiveKind::U16),
            Self::U32(_) => DataType::Primitive(PrimitiveKind::U32),
            Self::U64(_) => DataType::Primitive(PrimitiveKind::U64),
            Self::F32(_) => DataType::Primitive(PrimitiveKind::F32),
            Self::F64(_) => DataType::Primitive(PrimitiveKind::F64),
            Self::String(_) => DataType::Primitive(PrimitiveKind::String),
            Self::Bytes(_) => DataType::Bytes,
            Self::Time(_) => DataType::Primitive(PrimitiveKind::Time),
            Self::Sequence(seq) => DataType::Sequence(Box::new(seq.element().clone())),
            Self::Document(_) => DataType::Map(Box::new(DataType::Any)),
            Self::Instance(inst) => DataType::Pointer(inst.type_name().to_string()),
        }
    }

    /// True if this value can be stored as-is in a slot of type `ty`.
    pub fn matches(&self, ty: &DataType) -> bool {
        match (ty, self) {
            (DataType::Any, _) => true,
            (_, Self::Null) => matches!(ty, DataType::Pointer(_) | DataType::Map(_)),
            (DataType::Primitive(kind), v) => v.primitive_kind() == Some(*kind),
            (DataType::Bytes, Self::Bytes(_)) => true,
            (DataType::Reference, Self::String(_)) => true,
            (DataType::Sequence(elem), Self::Sequence(seq)) => {
                seq.element() == elem.as_ref() || seq.items().iter().all(|v| v.matches(elem))
            }
            (DataType::Map(_), Self::Document(_) | Self::Instance(_)) => true,
            (DataType::Struct(name) | DataType::Pointer(name), Self::Instance(inst)) => {
                inst.type_name() == name
            }
            _ => false,
        }
    }

    /// Primitive kind of a scalar value.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Bool(_) => Some(PrimitiveKind::Bool),
            Self::I8(_) => Some(PrimitiveKind::I8),
            Self::I16(_) => Some(PrimitiveKind::I16),
            Self::I32(_) => Some(PrimitiveKind::I32),
            Self::I64(_) => Some(PrimitiveKind::I64),
            Self::U8(_) => Some(PrimitiveKind::U8),
            Self::U16(_) => Some(PrimitiveKind::U16),
            Self::U32(_) => Some(PrimitiveKind::U32),
            Self::U64(_) => Some(PrimitiveKind::U64),
            Self::F32(_) => Some(PrimitiveKind::F32),
            Self::F64(_) => Some(PrimitiveKind::F64),
            Self::String(_) => Some(PrimitiveKind::String),
            Self::Time(_) => Some(PrimitiveKind::Time),
            _ => None,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as sequence.
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as document.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as instance.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get mutable instance.
    pub fn as_instance_mut(&mut self) -> Option<&mut Instance> {
        match self {
            Self::Instance(v) => Some(v),
            _ => None,
        }
    }

    /// Consume into an instance.
    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Self::Instance(v) => Some(v),
            _ => None,
        }
    }

    /// Consume into a document.
    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Document(v) => Some(v),
            _ => None,
        }
    }
}

// Conversion traits
macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    DateTime<Utc> => Time,
    Sequence => Sequence,
    Document => Document,
    Instance => Instance,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(Sequence::untyped(v.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Build a [`Document`] from key/value pairs.
///
/// ```rust
/// use dynreg::{doc, Value};
///
/// let d = doc! { "TYPENAME" => "shop.Item", "qty" => 3i64 };
/// assert_eq!(d.get("qty"), Some(&Value::I64(3)));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::dynamic::Document::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::dynamic::Document::new();
        $(
            map.insert(::std::string::String::from($key), $crate::dynamic::Value::from($value));
        )+
        map
    }};
}
