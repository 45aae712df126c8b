// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dynreg - Dynamic type/function registry and object materializer
//!
//! Registers named types and callables at runtime, turns loosely-structured
//! documents (string-keyed maps of heterogeneous values) into instances of
//! registered types, and invokes registered functions and methods by name
//! with best-effort argument coercion.
//!
//! ## Quick Start
//!
//! ```rust
//! use dynreg::dynamic::{json, PrimitiveKind, TypeDescriptorBuilder};
//! use dynreg::{Materializer, Registry, Result};
//!
//! fn main() -> Result<()> {
//!     let registry = Registry::new();
//!     registry.register_type(
//!         TypeDescriptorBuilder::new("shop.Customer")
//!             .string_field("UUID")
//!             .string_field("name")
//!             .build(),
//!     );
//!     registry.register_type(
//!         TypeDescriptorBuilder::new("shop.Order")
//!             .field("total", PrimitiveKind::F64)
//!             .string_field("M_customer")
//!             .build(),
//!     );
//!
//!     let doc = json::parse_document(
//!         r#"{"TYPENAME": "shop.Order", "total": "12.5",
//!             "M_customer": {"TYPENAME": "shop.Customer", "UUID": "c-1", "name": "Ada"}}"#,
//!     )?;
//!
//!     let mut entities = Vec::new();
//!     let order = Materializer::new(&registry)
//!         .on_entity(|e| entities.push(e.type_name().to_string()))
//!         .materialize(&doc)?;
//!
//!     let order = order.as_instance().expect("registered type");
//!     assert_eq!(order.get::<f64>("total")?, 12.5);
//!     assert_eq!(order.get::<String>("M_customer")?, "c-1");
//!     assert_eq!(entities, ["shop.Customer", "shop.Order"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   Materializer (documents -> instances)   |   Invoker (call by name) |
//! +---------------------------------------------------------------------+
//! |        Registry: name -> TypeDescriptor / FunctionDescriptor       |
//! +---------------------------------------------------------------------+
//! |   Coercion (scalars)  |  Identity (UUIDs)  |  Codec (binary payloads)|
//! +---------------------------------------------------------------------+
//! |              dynamic: Value, DataType, Instance, JSON               |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Concurrent name -> descriptor store, also hosts the invoker |
//! | [`Materializer`] | Recursive document -> instance builder with entity callback |
//! | [`Value`] | Dynamic value for documents, fields, arguments and results |
//! | [`Instance`] | Typed field container of a registered type |
//! | [`RegistryConfig`] | Reserved keys, relation prefix, identity policy |
//!
//! ## Modules Overview
//!
//! - [`dynamic`] - Values, type descriptors, instances, JSON bridge
//! - [`registry`] - Type and function stores
//! - [`materialize`] - Document materialization
//! - [`invoke`] - Signatures and dynamic calls
//! - [`coerce`] - Scalar coercion
//! - [`codec`] - Binary encoding
//! - [`identity`] - UUID helpers
//! - [`config`] - Configuration

pub mod codec;
pub mod coerce;
pub mod config;
pub mod dynamic;
mod error;
pub mod identity;
pub mod invoke;
pub mod materialize;
pub mod registry;

pub use config::{IdentityPolicy, RegistryConfig};
pub use dynamic::{DataType, Document, Instance, PrimitiveKind, Sequence, TypeDescriptor, Value};
pub use error::{Error, Result};
pub use invoke::{Args, FunctionDescriptor, Signature};
pub use materialize::Materializer;
pub use registry::Registry;
