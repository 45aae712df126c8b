// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values and runtime type descriptions.
//!
//! # Features
//!
//! - **TypeDescriptor**: Runtime type description (fields, declared kinds, methods)
//! - **Value**: Untyped value used by documents, instances, arguments and results
//! - **Instance**: Typed field container created from a registered descriptor
//! - **Builder API**: Fluent interface for building type descriptors
//! - **JSON bridge**: Parse documents from JSON text and render them back
//!
//! # Example
//!
//! ```rust
//! use dynreg::dynamic::{PrimitiveKind, TypeDescriptorBuilder};
//! use dynreg::Registry;
//!
//! let registry = Registry::new();
//! registry.register_type(
//!     TypeDescriptorBuilder::new("sensor.Reading")
//!         .field("sensor_id", PrimitiveKind::U32)
//!         .field("temperature", PrimitiveKind::F64)
//!         .build(),
//! );
//!
//! let mut reading = registry.new_instance("sensor.Reading").unwrap();
//! reading.set("temperature", 23.5f64).unwrap();
//! assert_eq!(reading.get::<f64>("temperature").unwrap(), 23.5);
//! ```

mod builder;
mod instance;
pub mod json;
mod type_descriptor;
mod value;

pub use builder::TypeDescriptorBuilder;
pub use instance::{FromValue, Instance};
pub use type_descriptor::{DataType, FieldDescriptor, PrimitiveKind, TypeDescriptor};
pub use value::{Document, Sequence, Value, ValueKind};

#[cfg(test)]
mod tests;
