// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.

use crate::invoke::MethodDescriptor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
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
    Time,
}

impl PrimitiveKind {
    /// Check if this is an integer kind (signed or unsigned).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    /// Check if this is a floating-point kind.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Lower-case name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
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
            Self::Time => "time",
        }
    }
}

/// Declared kind of a field, parameter or sequence element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Dynamic; accepts any value.
    Any,
    /// Scalar.
    Primitive(PrimitiveKind),
    /// Byte sequence.
    Bytes,
    /// Ordered sequence of the element type.
    Sequence(Box<DataType>),
    /// String-keyed mapping; the value type is informational, entries are
    /// stored as given.
    Map(Box<DataType>),
    /// Embedded composite; zero value is a zero instance of the named type.
    Struct(String),
    /// Owned, nullable composite; zero value is null.
    Pointer(String),
    /// Non-owning relation, stored as the target's identity string.
    Reference,
}

impl DataType {
    /// Shorthand for a primitive type.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }

    /// Shorthand for a sequence type.
    pub fn sequence_of(element: DataType) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Shorthand for a map type.
    pub fn map_of(value: DataType) -> Self {
        Self::Map(Box::new(value))
    }

    /// Name of the composite type this refers to, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Struct(name) | Self::Pointer(name) => Some(name),
            _ => None,
        }
    }

    /// Rewrite string-typed slots to `Reference` (sequences recursively).
    fn as_reference(&self) -> Option<DataType> {
        match self {
            Self::Primitive(PrimitiveKind::String) => Some(Self::Reference),
            Self::Sequence(elem) => elem.as_reference().map(Self::sequence_of),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::Bytes => f.write_str("bytes"),
            Self::Sequence(elem) => write!(f, "[]{}", elem),
            Self::Map(value) => write!(f, "map[string]{}", value),
            Self::Struct(name) => f.write_str(name),
            Self::Pointer(name) => write!(f, "*{}", name),
            Self::Reference => f.write_str("ref"),
        }
    }
}

/// Field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared field type.
    pub data_type: DataType,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A complete type descriptor: ordered fields plus a method table.
///
/// Built through [`TypeDescriptorBuilder`](crate::dynamic::TypeDescriptorBuilder);
/// the field name index is computed once at build time.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl TypeDescriptor {
    pub(crate) fn from_parts(
        name: String,
        fields: Vec<FieldDescriptor>,
        methods: HashMap<String, Arc<MethodDescriptor>>,
    ) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            name,
            fields,
            index,
            methods,
        }
    }

    /// Fully-qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Get field index by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Get method by name.
    pub fn method(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(name).cloned()
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy of this descriptor under another name.
    pub(crate) fn renamed(&self, name: &str) -> Self {
        let mut desc = self.clone();
        desc.name = name.to_string();
        desc
    }

    /// Promote string fields whose names start with `prefix` to references.
    pub(crate) fn resolve_references(mut self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        for field in &mut self.fields {
            if !field.name.starts_with(prefix) {
                continue;
            }
            if let Some(promoted) = field.data_type.as_reference() {
                log::trace!(
                    "[registry] {}.{} promoted to {}",
                    self.name,
                    field.name,
                    promoted
                );
                field.data_type = promoted;
            }
        }
        self
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("methods", &self.method_names())
            .finish()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}
