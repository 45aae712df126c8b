// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for registry, materialization and invocation.

use crate::codec::CodecError;
use crate::dynamic::ValueKind;
use std::fmt;

/// Result type for dynreg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the registry, materializer, invoker and coercion layer.
///
/// Field-level materialization problems never show up here: they are
/// swallowed (logged at debug level) and the field keeps its zero value.
#[derive(Debug)]
pub enum Error {
    /// Name is absent from the registry where one is required.
    NotRegisteredType(String),

    /// Top-level document without a type marker, or not a mapping at all.
    MalformedDocument(String),

    /// Argument count does not match a non-variadic signature.
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Named method is absent on the instance's type.
    InvalidCallTarget(String),

    /// Scalar coercion met a kind it has no conversion rule for.
    UnconvertibleValue {
        target: &'static str,
        kind: ValueKind,
    },

    /// Typed extraction found a different kind.
    TypeMismatch { expected: String, found: ValueKind },

    /// Field is not declared on the type.
    FieldNotFound { type_name: String, field: String },

    /// Argument index past the supplied arguments.
    MissingArgument(usize),

    /// Binary encoding/decoding failure
    Codec(CodecError),

    /// JSON parsing/encoding failure
    Json(serde_json::Error),
}

impl Error {
    /// Create an unconvertible-value error for `kind` coerced to `target`.
    pub fn unconvertible(target: &'static str, kind: ValueKind) -> Self {
        Self::UnconvertibleValue { target, kind }
    }

    /// Create a type mismatch error.
    pub fn mismatch(expected: impl Into<String>, found: ValueKind) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegisteredType(name) => write!(f, "No type or function registered as '{}'", name),
            Self::MalformedDocument(msg) => write!(f, "Malformed document: {}", msg),
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "Wrong number of parameters for {}: got {} but expect {}",
                name, got, expected
            ),
            Self::InvalidCallTarget(name) => write!(f, "Method not found: {}", name),
            Self::UnconvertibleValue { target, kind } => {
                write!(f, "Value of kind {} cannot be converted to {}", kind, target)
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Self::FieldNotFound { type_name, field } => {
                write!(f, "Field not found: {}.{}", type_name, field)
            }
            Self::MissingArgument(index) => write!(f, "Missing argument at position {}", index),
            Self::Codec(e) => write!(f, "Codec error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
