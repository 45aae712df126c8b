// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for TypeDescriptor.

use crate::dynamic::{DataType, FieldDescriptor, Instance, PrimitiveKind, TypeDescriptor, Value};
use crate::invoke::{Args, MethodDescriptor, Signature};
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for creating TypeDescriptor instances.
///
/// ```rust
/// use dynreg::dynamic::{DataType, PrimitiveKind, TypeDescriptorBuilder};
///
/// let desc = TypeDescriptorBuilder::new("shop.Order")
///     .string_field("UUID")
///     .field("total", PrimitiveKind::F64)
///     .sequence_field("lines", DataType::Pointer("shop.Line".into()))
///     .build();
/// assert_eq!(desc.fields().len(), 3);
/// ```
pub struct TypeDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl TypeDescriptorBuilder {
    /// Create a new builder for a struct type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: HashMap::new(),
        }
    }

    /// Add a primitive field.
    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.field_with_type(name, DataType::Primitive(kind))
    }

    /// Add a field with an arbitrary declared type.
    ///
    /// Declaring a name twice replaces the earlier declaration in place.
    pub fn field_with_type(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == name) {
            existing.data_type = data_type;
        } else {
            self.fields.push(FieldDescriptor::new(name, data_type));
        }
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::String)
    }

    /// Add a byte sequence field.
    pub fn bytes_field(self, name: impl Into<String>) -> Self {
        self.field_with_type(name, DataType::Bytes)
    }

    /// Add a sequence field.
    pub fn sequence_field(self, name: impl Into<String>, element: DataType) -> Self {
        self.field_with_type(name, DataType::sequence_of(element))
    }

    /// Add an embedded struct field.
    pub fn struct_field(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.field_with_type(name, DataType::Struct(type_name.into()))
    }

    /// Add an owned, nullable struct field.
    pub fn pointer_field(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.field_with_type(name, DataType::Pointer(type_name.into()))
    }

    /// Add a string-keyed map field.
    pub fn map_field(self, name: impl Into<String>, value: DataType) -> Self {
        self.field_with_type(name, DataType::map_of(value))
    }

    /// Add a dynamic field.
    pub fn any_field(self, name: impl Into<String>) -> Self {
        self.field_with_type(name, DataType::Any)
    }

    /// Add a reference field (stores the target's identity).
    pub fn reference_field(self, name: impl Into<String>) -> Self {
        self.field_with_type(name, DataType::Reference)
    }

    /// Attach a method invocable through
    /// [`Registry::call_method`](crate::Registry::call_method).
    pub fn method<F>(mut self, name: impl Into<String>, signature: Signature, adapter: F) -> Self
    where
        F: Fn(&mut Instance, &Args) -> crate::Result<Vec<Value>> + Send + Sync + 'static,
    {
        self.methods.insert(
            name.into(),
            Arc::new(MethodDescriptor::new(signature, adapter)),
        );
        self
    }

    /// Build the type descriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::from_parts(self.name, self.fields, self.methods)
    }
}
