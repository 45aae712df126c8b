// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type and function registry.
//!
//! Thread-safe name -> descriptor stores. Writers take the exclusive lock,
//! readers the shared one; descriptors are fully built and wrapped in `Arc`
//! before the write lock is taken, so readers never see a partial entry.
//! Handles are cloned out before any user code runs, which lets adapters
//! re-enter the registry.

use crate::config::RegistryConfig;
use crate::dynamic::{DataType, Document, Instance, PrimitiveKind, Sequence, TypeDescriptor, Value};
use crate::invoke::FunctionDescriptor;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Process-wide default registry.
static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Concurrent registry of named types and functions.
pub struct Registry {
    types: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
    funcs: RwLock<HashMap<String, Arc<FunctionDescriptor>>>,
    config: RegistryConfig,
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with an explicit configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            funcs: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Process-wide default registry, created on first use.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Register a type under its own name, replacing any previous entry.
    ///
    /// String fields following the relation naming convention are promoted
    /// to [`DataType::Reference`] here.
    pub fn register_type(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(descriptor.resolve_references(&self.config.reference_prefix));
        let name = descriptor.name().to_string();
        let previous = self.types.write().insert(name.clone(), Arc::clone(&descriptor));
        if previous.is_some() {
            log::debug!("[registry] type '{}' re-registered", name);
        } else {
            log::debug!("[registry] registered type '{}'", name);
        }
        descriptor
    }

    /// Register a type under an explicit name.
    pub fn register_type_as(&self, name: &str, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        if descriptor.name() == name {
            self.register_type(descriptor)
        } else {
            self.register_type(descriptor.renamed(name))
        }
    }

    /// Look up a type by exact name.
    pub fn get_type(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.read().get(name).cloned()
    }

    /// Check if a type is registered.
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Remove a type. Returns the removed descriptor.
    pub fn delete_type(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        let removed = self.types.write().remove(name);
        if removed.is_some() {
            log::debug!("[registry] deleted type '{}'", name);
        }
        removed
    }

    /// Snapshot of registered type names, sorted.
    pub fn list_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Register a function, replacing any previous entry.
    pub fn register_func(&self, name: &str, descriptor: FunctionDescriptor) {
        let previous = self
            .funcs
            .write()
            .insert(name.to_string(), Arc::new(descriptor));
        if previous.is_some() {
            log::debug!("[registry] function '{}' re-registered", name);
        } else {
            log::debug!("[registry] registered function '{}'", name);
        }
    }

    /// Look up a function by exact name.
    pub fn get_func(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.funcs.read().get(name).cloned()
    }

    /// Check if a function is registered.
    pub fn contains_func(&self, name: &str) -> bool {
        self.funcs.read().contains_key(name)
    }

    /// Remove a function. Returns the removed descriptor.
    pub fn delete_func(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        let removed = self.funcs.write().remove(name);
        if removed.is_some() {
            log::debug!("[registry] deleted function '{}'", name);
        }
        removed
    }

    /// Snapshot of registered function names, sorted.
    pub fn list_funcs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.funcs.read().keys().cloned().collect();
        names.sort();
        names
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Zero-valued instance of a registered type.
    ///
    /// A string field named like the type marker is set to the type name.
    pub fn new_instance(&self, name: &str) -> Result<Instance> {
        let descriptor = self
            .get_type(name)
            .ok_or_else(|| Error::NotRegisteredType(name.to_string()))?;
        Ok(self.zero_instance(descriptor, &mut Vec::new()))
    }

    /// Zero value of a declared type.
    pub fn zero_value(&self, ty: &DataType) -> Value {
        self.zero_value_in(ty, &mut Vec::new())
    }

    /// Project an instance into a document using this registry's type marker.
    pub fn document_of(&self, instance: &Instance) -> Document {
        instance.to_document_with_marker(&self.config.type_marker)
    }

    pub(crate) fn zero_instance(
        &self,
        descriptor: Arc<TypeDescriptor>,
        visiting: &mut Vec<String>,
    ) -> Instance {
        visiting.push(descriptor.name().to_string());
        let marker = &self.config.type_marker;
        let fields = descriptor
            .fields()
            .iter()
            .map(|f| {
                if &f.name == marker && f.data_type == DataType::Primitive(PrimitiveKind::String) {
                    Value::String(descriptor.name().to_string())
                } else {
                    self.zero_value_in(&f.data_type, visiting)
                }
            })
            .collect();
        visiting.pop();
        Instance::from_parts(descriptor, fields)
    }

    // Struct types already on `visiting` zero to Null.
    fn zero_value_in(&self, ty: &DataType, visiting: &mut Vec<String>) -> Value {
        match ty {
            DataType::Any | DataType::Pointer(_) | DataType::Map(_) => Value::Null,
            DataType::Bytes => Value::Bytes(Vec::new()),
            DataType::Reference => Value::String(String::new()),
            DataType::Sequence(elem) => {
                Value::Sequence(Sequence::typed(elem.as_ref().clone(), Vec::new()))
            }
            DataType::Struct(name) => {
                if visiting.iter().any(|v| v == name) {
                    log::debug!("[registry] cyclic embedded type '{}' zeroed to null", name);
                    return Value::Null;
                }
                match self.get_type(name) {
                    Some(descriptor) => Value::Instance(self.zero_instance(descriptor, visiting)),
                    None => Value::Null,
                }
            }
            DataType::Primitive(kind) => zero_primitive(*kind),
        }
    }
}

fn zero_primitive(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(false),
        PrimitiveKind::I8 => Value::I8(0),
        PrimitiveKind::I16 => Value::I16(0),
        PrimitiveKind::I32 => Value::I32(0),
        PrimitiveKind::I64 => Value::I64(0),
        PrimitiveKind::U8 => Value::U8(0),
        PrimitiveKind::U16 => Value::U16(0),
        PrimitiveKind::U32 => Value::U32(0),
        PrimitiveKind::U64 => Value::U64(0),
        PrimitiveKind::F32 => Value::F32(0.0),
        PrimitiveKind::F64 => Value::F64(0.0),
        PrimitiveKind::String => Value::String(String::new()),
        PrimitiveKind::Time => Value::Time(DateTime::<Utc>::default()),
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.list_types())
            .field("funcs", &self.list_funcs())
            .field("config", &self.config)
            .finish()
    }
}
