// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object materializer.
//!
//! Turns untyped documents into instances of registered types, recursively.
//!
//! # Rules
//!
//! - The top-level document must carry the type marker; a marker naming an
//!   unregistered type returns the document unchanged.
//! - Each declared field is filled from the document key of the same name,
//!   dispatched on the declared [`DataType`]. Absent and null keys leave the
//!   zero value; unmatched keys are ignored.
//! - Nested documents follow a relaxed path: a missing marker falls back to
//!   the declared struct type, an unresolvable one keeps the raw document.
//!   A struct or pointer slot whose document names a different type is left
//!   at zero and nothing is built for it.
//! - `Map` slots keep their entries as given; the declared value type is
//!   informational. Only a marked, registered document becomes an instance.
//! - The entity callback sees every constructed instance once, nested
//!   entities before the enclosing one.
//!
//! # Example
//!
//! ```rust
//! use dynreg::dynamic::{PrimitiveKind, TypeDescriptorBuilder, Value};
//! use dynreg::{doc, Materializer, Registry};
//!
//! let registry = Registry::new();
//! registry.register_type(
//!     TypeDescriptorBuilder::new("shop.Item")
//!         .field("qty", PrimitiveKind::I32)
//!         .build(),
//! );
//!
//! let mut seen = 0;
//! let value = Materializer::new(&registry)
//!     .on_entity(|_| seen += 1)
//!     .materialize(&doc! { "TYPENAME" => "shop.Item", "qty" => "3" })
//!     .unwrap();
//!
//! let item = value.as_instance().unwrap();
//! assert_eq!(item.get::<i32>("qty").unwrap(), 3);
//! assert_eq!(seen, 1);
//! ```

use crate::coerce;
use crate::config::IdentityPolicy;
use crate::dynamic::{json, DataType, Document, Instance, Sequence, TypeDescriptor, Value};
use crate::identity;
use crate::registry::Registry;
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;

type EntityCallback<'a> = Box<dyn FnMut(&Instance) + 'a>;

/// Recursive document -> instance builder bound to a registry.
pub struct Materializer<'a> {
    registry: &'a Registry,
    on_entity: Option<EntityCallback<'a>>,
}

impl<'a> Materializer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            on_entity: None,
        }
    }

    /// Invoke `callback` for every instance constructed.
    pub fn on_entity(mut self, callback: impl FnMut(&Instance) + 'a) -> Self {
        self.on_entity = Some(Box::new(callback));
        self
    }

    /// Materialize a document carrying the type marker.
    ///
    /// Returns `Value::Instance` for registered types, or the document
    /// unchanged when the marker names an unknown type.
    pub fn materialize(&mut self, doc: &Document) -> Result<Value> {
        let marker = &self.registry.config().type_marker;
        let type_name = doc
            .get(marker)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedDocument(format!("missing '{}' key", marker)))?
            .to_string();
        self.materialize_as(&type_name, doc)
    }

    /// Materialize a document as an explicitly named type.
    pub fn materialize_as(&mut self, type_name: &str, doc: &Document) -> Result<Value> {
        match self.registry.get_type(type_name) {
            Some(descriptor) => Ok(Value::Instance(self.build(descriptor, doc)?)),
            None => {
                log::debug!(
                    "[materialize] type '{}' not registered, document passed through",
                    type_name
                );
                Ok(Value::Document(doc.clone()))
            }
        }
    }

    /// Materialize a list of documents of one type into a typed sequence.
    ///
    /// The type comes from `type_name` or, failing that, the first
    /// document's marker. Without a resolvable type the input is returned as
    /// an untyped sequence.
    pub fn materialize_all(&mut self, items: &[Value], type_name: Option<&str>) -> Result<Value> {
        let docs = items
            .iter()
            .map(|item| {
                item.as_document().ok_or_else(|| {
                    Error::MalformedDocument(format!("expected a document, found {}", item.kind()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let marker = &self.registry.config().type_marker;
        let name = type_name.map(str::to_string).or_else(|| {
            docs.first()
                .and_then(|d| d.get(marker))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let descriptor = match name.as_deref().and_then(|n| self.registry.get_type(n)) {
            Some(descriptor) => descriptor,
            None => return Ok(Value::Sequence(Sequence::untyped(items.to_vec()))),
        };

        let element = DataType::Pointer(descriptor.name().to_string());
        let mut instances = Vec::with_capacity(docs.len());
        for doc in docs {
            instances.push(Value::Instance(self.build(Arc::clone(&descriptor), doc)?));
        }
        Ok(Value::Sequence(Sequence::typed(element, instances)))
    }

    /// Materialize the typed documents in a heterogeneous list.
    ///
    /// Nulls are dropped. The result is typed when every remaining element
    /// has the same runtime type, untyped otherwise.
    pub fn materialize_sequence(&mut self, items: &[Value]) -> Result<Sequence> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Null => continue,
                Value::Document(doc) => out.push(self.relaxed(doc, None)?),
                Value::Sequence(inner) => {
                    out.push(Value::Sequence(self.materialize_sequence(inner.items())?))
                }
                other => out.push(other.clone()),
            }
        }

        let element = match out.split_first() {
            Some((first, rest)) => {
                let ty = first.runtime_type();
                if rest.iter().all(|v| v.runtime_type() == ty) {
                    ty
                } else {
                    DataType::Any
                }
            }
            None => DataType::Any,
        };
        Ok(Sequence::typed(element, out))
    }

    // ========================================================================
    // Instance construction
    // ========================================================================

    fn build(&mut self, descriptor: Arc<TypeDescriptor>, doc: &Document) -> Result<Instance> {
        let mut instance = self
            .registry
            .zero_instance(Arc::clone(&descriptor), &mut Vec::new());

        for (index, field) in descriptor.fields().iter().enumerate() {
            let source = match doc.get(&field.name) {
                Some(v) if !v.is_null() => v,
                _ => continue,
            };
            match self.field_value(&field.data_type, source)? {
                Some(value) => instance.set_index(index, value),
                None => log::debug!(
                    "[materialize] {}.{}: {} source ignored for {}",
                    descriptor.name(),
                    field.name,
                    source.kind(),
                    field.data_type
                ),
            }
        }

        self.assign_identity(&mut instance, doc);
        if let Some(callback) = self.on_entity.as_mut() {
            callback(&instance);
        }
        Ok(instance)
    }

    fn assign_identity(&self, instance: &mut Instance, doc: &Document) {
        let config = self.registry.config();
        if config.identity_policy == IdentityPolicy::Keep {
            return;
        }
        let index = match instance.descriptor().field_index(&config.identity_key) {
            Some(i) => i,
            None => return,
        };
        if !matches!(instance.get_field(&config.identity_key), Ok(Value::String(s)) if s.is_empty())
        {
            return;
        }
        let id = match config.identity_policy {
            IdentityPolicy::Derived => {
                let text = json::to_json_string(doc, &config.type_marker).unwrap_or_default();
                identity::derived_uuid(&format!("{}:{}", instance.type_name(), text))
            }
            _ => identity::random_uuid(),
        };
        instance.set_index(index, Value::String(id));
    }

    // ========================================================================
    // Field dispatch
    // ========================================================================

    /// Value to store for a declared field, or `None` to keep the zero value.
    fn field_value(&mut self, ty: &DataType, source: &Value) -> Result<Option<Value>> {
        match ty {
            DataType::Any => self.dynamic(source).map(Some),
            DataType::Bytes => Ok(bytes_value(source)),
            DataType::Sequence(elem) => match source {
                Value::Sequence(seq) => Ok(Some(Value::Sequence(self.sequence(elem, seq)?))),
                _ => Ok(None),
            },
            DataType::Struct(name) | DataType::Pointer(name) => {
                let value = match source {
                    Value::Document(doc) => self.nested(doc, name)?,
                    Value::Instance(_) => Some(source.clone()),
                    _ => None,
                };
                Ok(value.filter(
                    |v| matches!(v, Value::Instance(inst) if inst.type_name() == name),
                ))
            }
            // The declared value type is informational: entries are kept as given
            DataType::Map(_) => match source {
                Value::Document(doc) => self.relaxed(doc, None).map(Some),
                _ => Ok(None),
            },
            DataType::Reference => match source {
                Value::Document(doc) => Ok(self.reference(doc)?.map(Value::String)),
                Value::Instance(inst) => Ok(self.identity_of(inst, None).map(Value::String)),
                Value::Sequence(_) => Ok(None),
                other => coerce::to_string(other).map(|s| Some(Value::String(s))),
            },
            DataType::Primitive(kind) => coerce::coerce(source, *kind).map(Some),
        }
    }

    /// Re-dispatch on the runtime shape of a value stored in an `Any` slot.
    fn dynamic(&mut self, source: &Value) -> Result<Value> {
        match source {
            Value::Document(doc) => self.relaxed(doc, None),
            Value::Sequence(seq) => Ok(Value::Sequence(self.sequence(&DataType::Any, seq)?)),
            other => Ok(other.clone()),
        }
    }

    /// Nested document: instance when the type resolves, raw document otherwise.
    fn relaxed(&mut self, doc: &Document, declared: Option<&str>) -> Result<Value> {
        let marker = &self.registry.config().type_marker;
        let name = doc.get(marker).and_then(Value::as_str).or(declared);
        let descriptor = match name.and_then(|n| self.registry.get_type(n)) {
            Some(descriptor) => descriptor,
            None => return Ok(Value::Document(doc.clone())),
        };
        Ok(Value::Instance(self.build(descriptor, doc)?))
    }

    /// Nested document for a `Struct(name)`/`Pointer(name)` slot. A marker
    /// naming another type yields `None` without building anything.
    fn nested(&mut self, doc: &Document, name: &str) -> Result<Option<Value>> {
        let other = doc
            .get(&self.registry.config().type_marker)
            .and_then(Value::as_str)
            .filter(|found| *found != name)
            .map(str::to_string);
        if let Some(found) = other {
            log::debug!("[materialize] '{}' document in a '{}' slot skipped", found, name);
            return Ok(None);
        }
        self.relaxed(doc, Some(name)).map(Some)
    }

    fn reference(&mut self, doc: &Document) -> Result<Option<String>> {
        Ok(match self.relaxed(doc, None)? {
            Value::Instance(inst) => self.identity_of(&inst, Some(doc)),
            _ => self.document_identity(doc),
        })
    }

    fn identity_of(&self, instance: &Instance, doc: Option<&Document>) -> Option<String> {
        instance
            .identity(&self.registry.config().identity_key)
            .or_else(|| doc.and_then(|d| self.document_identity(d)))
    }

    fn document_identity(&self, doc: &Document) -> Option<String> {
        doc.get(&self.registry.config().identity_key)
            .filter(|v| !v.is_null())
            .and_then(|v| coerce::to_string(v).ok())
            .filter(|s| !s.is_empty())
    }

    // ========================================================================
    // Sequences
    // ========================================================================

    fn sequence(&mut self, elem: &DataType, seq: &Sequence) -> Result<Sequence> {
        let mut items = Vec::with_capacity(seq.len());
        for item in seq {
            items.push(self.element(elem, item)?);
        }
        Ok(Sequence::typed(elem.clone(), items))
    }

    fn element(&mut self, elem: &DataType, item: &Value) -> Result<Value> {
        let value = match item {
            Value::Null => None,
            Value::Document(doc) => match elem {
                DataType::Reference => self.reference(doc)?.map(Value::String),
                DataType::Struct(name) | DataType::Pointer(name) => self.nested(doc, name)?,
                _ => Some(self.relaxed(doc, None)?),
            },
            Value::Sequence(inner) => match elem {
                DataType::Sequence(e) => Some(Value::Sequence(self.sequence(e, inner)?)),
                DataType::Any => Some(Value::Sequence(self.sequence(&DataType::Any, inner)?)),
                DataType::Bytes => bytes_value(item),
                _ => None,
            },
            Value::Instance(inst) if elem == &DataType::Reference => {
                self.identity_of(inst, None).map(Value::String)
            }
            other => match elem {
                DataType::Any => Some(other.clone()),
                DataType::Primitive(kind) => coerce::coerce(other, *kind).ok(),
                DataType::Reference => coerce::to_string(other).ok().map(Value::String),
                DataType::Bytes => bytes_value(other),
                _ => Some(other.clone()),
            },
        };
        Ok(match value {
            Some(v) if v.matches(elem) => v,
            _ => self.registry.zero_value(elem),
        })
    }
}

/// Bytes from a byte/string payload (base64 decoded when it is valid
/// base64 text) or from a sequence of integers in `0..=255`.
fn bytes_value(source: &Value) -> Option<Value> {
    let raw = match source {
        Value::Bytes(b) => b.as_slice(),
        Value::String(s) => s.as_bytes(),
        Value::Sequence(seq) => {
            return seq
                .iter()
                .map(|v| coerce::to_int(v).ok().and_then(|n| u8::try_from(n).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Bytes);
        }
        _ => return None,
    };
    if raw.is_empty() {
        return Some(Value::Bytes(Vec::new()));
    }
    Some(Value::Bytes(STANDARD.decode(raw).unwrap_or_else(|_| raw.to_vec())))
}

impl Registry {
    /// Materializer bound to this registry, without an entity callback.
    pub fn materializer(&self) -> Materializer<'_> {
        Materializer::new(self)
    }
}
