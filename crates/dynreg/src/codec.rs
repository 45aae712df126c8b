// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry-backed binary serializer.
//!
//! Self-describing, CDR-style encoding of [`Value`]s: every value starts with
//! a one-byte tag, scalars are little-endian and aligned to their size,
//! strings and byte payloads are length-prefixed. Sequences carry their
//! element type; instances carry their type name and field names, so a
//! payload decodes without the encoding side's descriptor.
//!
//! The layout is not versioned and carries no header or checksum.

use crate::coerce;
use crate::dynamic::{DataType, Document, Instance, PrimitiveKind, Sequence, TypeDescriptor, Value};
use crate::registry::Registry;
use crate::Result;
use chrono::DateTime;
use std::fmt;
use std::sync::Arc;

/// Nesting limit while decoding.
const MAX_DEPTH: usize = 128;

/// Errors for binary encoding/decoding.
#[derive(Debug)]
pub enum CodecError {
    UnexpectedEof { need: usize, have: usize },
    InvalidTag { what: &'static str, tag: u8 },
    InvalidData(String),
    TooLarge(usize),
    DepthExceeded,
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { need, have } => {
                write!(f, "Buffer too small: need {} bytes, have {}", need, have)
            }
            Self::InvalidTag { what, tag } => write!(f, "Invalid {} tag: {}", what, tag),
            Self::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            Self::TooLarge(len) => write!(f, "Length {} exceeds u32 range", len),
            Self::DepthExceeded => write!(f, "Nesting deeper than {} levels", MAX_DEPTH),
            Self::Utf8(e) => write!(f, "UTF-8 error: {}", e),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::string::FromUtf8Error> for CodecError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}

// Value tags
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_I8: u8 = 2;
const TAG_I16: u8 = 3;
const TAG_I32: u8 = 4;
const TAG_I64: u8 = 5;
const TAG_U8: u8 = 6;
const TAG_U16: u8 = 7;
const TAG_U32: u8 = 8;
const TAG_U64: u8 = 9;
const TAG_F32: u8 = 10;
const TAG_F64: u8 = 11;
const TAG_STRING: u8 = 12;
const TAG_BYTES: u8 = 13;
const TAG_TIME: u8 = 14;
const TAG_SEQUENCE: u8 = 15;
const TAG_DOCUMENT: u8 = 16;
const TAG_INSTANCE: u8 = 17;

// DataType tags
const TY_ANY: u8 = 0;
const TY_PRIMITIVE: u8 = 1;
const TY_BYTES: u8 = 2;
const TY_SEQUENCE: u8 = 3;
const TY_MAP: u8 = 4;
const TY_STRUCT: u8 = 5;
const TY_POINTER: u8 = 6;
const TY_REFERENCE: u8 = 7;

/// Encode a value.
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode_value(value)?;
    Ok(encoder.into_bytes())
}

/// Decode a value. Encoded instances come back as documents carrying
/// `type_marker`, with field values exactly as encoded.
pub fn decode(bytes: &[u8], type_marker: &str) -> Result<Value> {
    let mut decoder = Decoder::new(bytes, type_marker, None);
    let value = decoder.decode_value(0)?;
    decoder.finish()?;
    Ok(value)
}

/// Decode a payload as `type_name`.
///
/// An encoded instance is decoded straight into an instance of `type_name`
/// when that type is registered: fields are matched by name and stored as
/// decoded, converted only where the representation differs. Nested records
/// of registered types become instances too. A plain document payload goes
/// through the materializer (no callback). Anything else comes back as a
/// document.
pub fn from_bytes(registry: &Registry, bytes: &[u8], type_name: &str) -> Result<Value> {
    let marker = &registry.config().type_marker;
    let mut decoder = Decoder::new(bytes, marker, Some(registry));

    if bytes.first() == Some(&TAG_INSTANCE) {
        if let Some(descriptor) = registry.get_type(type_name) {
            let instance = decoder.decode_record_as(registry, descriptor)?;
            decoder.finish()?;
            return Ok(Value::Instance(instance));
        }
    }

    let doc = match decoder.decode_value(0)? {
        Value::Document(doc) => doc,
        Value::Instance(inst) => registry.document_of(&inst),
        other => {
            return Err(CodecError::InvalidData(format!(
                "expected a document payload, found {}",
                other.kind()
            ))
            .into())
        }
    };
    decoder.finish()?;
    registry.materializer().materialize_as(type_name, &doc)
}

// ============================================================================
// Encoder
// ============================================================================

struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.buffer.len() % alignment)) % alignment;
        self.buffer.extend(std::iter::repeat_n(0, padding));
    }

    fn put_len(&mut self, len: usize) -> std::result::Result<(), CodecError> {
        let len = u32::try_from(len).map_err(|_| CodecError::TooLarge(len))?;
        self.align(4);
        self.buffer.extend(&len.to_le_bytes());
        Ok(())
    }

    fn put_str(&mut self, s: &str) -> std::result::Result<(), CodecError> {
        // Length includes null terminator
        self.put_len(s.len() + 1)?;
        self.buffer.extend(s.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    fn encode_value(&mut self, value: &Value) -> std::result::Result<(), CodecError> {
        match value {
            Value::Null => self.buffer.push(TAG_NULL),
            Value::Bool(v) => {
                self.buffer.push(TAG_BOOL);
                self.buffer.push(u8::from(*v));
            }
            Value::I8(v) => {
                self.buffer.push(TAG_I8);
                self.buffer.push(*v as u8);
            }
            Value::I16(v) => {
                self.buffer.push(TAG_I16);
                self.align(2);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::I32(v) => {
                self.buffer.push(TAG_I32);
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::I64(v) => {
                self.buffer.push(TAG_I64);
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::U8(v) => {
                self.buffer.push(TAG_U8);
                self.buffer.push(*v);
            }
            Value::U16(v) => {
                self.buffer.push(TAG_U16);
                self.align(2);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::U32(v) => {
                self.buffer.push(TAG_U32);
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::U64(v) => {
                self.buffer.push(TAG_U64);
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::F32(v) => {
                self.buffer.push(TAG_F32);
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::F64(v) => {
                self.buffer.push(TAG_F64);
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            Value::String(s) => {
                self.buffer.push(TAG_STRING);
                self.put_str(s)?;
            }
            Value::Bytes(b) => {
                self.buffer.push(TAG_BYTES);
                self.put_len(b.len())?;
                self.buffer.extend(b);
            }
            Value::Time(t) => {
                self.buffer.push(TAG_TIME);
                self.align(8);
                self.buffer.extend(&t.timestamp().to_le_bytes());
                self.buffer.extend(&t.timestamp_subsec_nanos().to_le_bytes());
            }
            Value::Sequence(seq) => {
                self.buffer.push(TAG_SEQUENCE);
                self.encode_type(seq.element())?;
                self.put_len(seq.len())?;
                for item in seq {
                    self.encode_value(item)?;
                }
            }
            Value::Document(doc) => {
                self.buffer.push(TAG_DOCUMENT);
                self.put_len(doc.len())?;
                for (key, item) in doc {
                    self.put_str(key)?;
                    self.encode_value(item)?;
                }
            }
            Value::Instance(inst) => {
                self.buffer.push(TAG_INSTANCE);
                self.put_str(inst.type_name())?;
                self.put_len(inst.descriptor().fields().len())?;
                for (name, item) in inst.fields() {
                    self.put_str(name)?;
                    self.encode_value(item)?;
                }
            }
        }
        Ok(())
    }

    fn encode_type(&mut self, ty: &DataType) -> std::result::Result<(), CodecError> {
        match ty {
            DataType::Any => self.buffer.push(TY_ANY),
            DataType::Primitive(kind) => {
                self.buffer.push(TY_PRIMITIVE);
                self.buffer.push(primitive_tag(*kind));
            }
            DataType::Bytes => self.buffer.push(TY_BYTES),
            DataType::Sequence(elem) => {
                self.buffer.push(TY_SEQUENCE);
                self.encode_type(elem)?;
            }
            DataType::Map(value) => {
                self.buffer.push(TY_MAP);
                self.encode_type(value)?;
            }
            DataType::Struct(name) => {
                self.buffer.push(TY_STRUCT);
                self.put_str(name)?;
            }
            DataType::Pointer(name) => {
                self.buffer.push(TY_POINTER);
                self.put_str(name)?;
            }
            DataType::Reference => self.buffer.push(TY_REFERENCE),
        }
        Ok(())
    }
}

fn primitive_tag(kind: PrimitiveKind) -> u8 {
    match kind {
        PrimitiveKind::Bool => TAG_BOOL,
        PrimitiveKind::I8 => TAG_I8,
        PrimitiveKind::I16 => TAG_I16,
        PrimitiveKind::I32 => TAG_I32,
        PrimitiveKind::I64 => TAG_I64,
        PrimitiveKind::U8 => TAG_U8,
        PrimitiveKind::U16 => TAG_U16,
        PrimitiveKind::U32 => TAG_U32,
        PrimitiveKind::U64 => TAG_U64,
        PrimitiveKind::F32 => TAG_F32,
        PrimitiveKind::F64 => TAG_F64,
        PrimitiveKind::String => TAG_STRING,
        PrimitiveKind::Time => TAG_TIME,
    }
}

fn primitive_from_tag(tag: u8) -> Option<PrimitiveKind> {
    Some(match tag {
        TAG_BOOL => PrimitiveKind::Bool,
        TAG_I8 => PrimitiveKind::I8,
        TAG_I16 => PrimitiveKind::I16,
        TAG_I32 => PrimitiveKind::I32,
        TAG_I64 => PrimitiveKind::I64,
        TAG_U8 => PrimitiveKind::U8,
        TAG_U16 => PrimitiveKind::U16,
        TAG_U32 => PrimitiveKind::U32,
        TAG_U64 => PrimitiveKind::U64,
        TAG_F32 => PrimitiveKind::F32,
        TAG_F64 => PrimitiveKind::F64,
        TAG_STRING => PrimitiveKind::String,
        TAG_TIME => PrimitiveKind::Time,
        _ => return None,
    })
}

// ============================================================================
// Decoder
// ============================================================================

struct Decoder<'a> {
    buffer: &'a [u8],
    offset: usize,
    type_marker: &'a str,
    // Instance records of types registered here decode to instances
    registry: Option<&'a Registry>,
}

impl<'a> Decoder<'a> {
    fn new(buffer: &'a [u8], type_marker: &'a str, registry: Option<&'a Registry>) -> Self {
        Self {
            buffer,
            offset: 0,
            type_marker,
            registry,
        }
    }

    fn finish(&self) -> std::result::Result<(), CodecError> {
        if self.remaining() > 0 {
            return Err(CodecError::InvalidData(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn align(&mut self, alignment: usize) {
        self.offset = (self.offset + alignment - 1) & !(alignment - 1);
    }

    fn read_bytes(&mut self, count: usize) -> std::result::Result<&'a [u8], CodecError> {
        if count > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                need: count,
                have: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> std::result::Result<[u8; N], CodecError> {
        self.align(N);
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u8(&mut self) -> std::result::Result<u8, CodecError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_len(&mut self) -> std::result::Result<usize, CodecError> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?) as usize)
    }

    fn read_string(&mut self) -> std::result::Result<String, CodecError> {
        let len = self.read_len()?;
        if len == 0 {
            return Err(CodecError::InvalidData("string without terminator".into()));
        }
        let bytes = self.read_bytes(len)?;
        // Remove null terminator
        Ok(String::from_utf8(bytes[..len - 1].to_vec())?)
    }

    fn decode_value(&mut self, depth: usize) -> std::result::Result<Value, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::DepthExceeded);
        }
        let tag = self.read_u8()?;
        Ok(match tag {
            TAG_NULL => Value::Null,
            TAG_BOOL => Value::Bool(self.read_u8()? != 0),
            TAG_I8 => Value::I8(self.read_u8()? as i8),
            TAG_I16 => Value::I16(i16::from_le_bytes(self.read_array()?)),
            TAG_I32 => Value::I32(i32::from_le_bytes(self.read_array()?)),
            TAG_I64 => Value::I64(i64::from_le_bytes(self.read_array()?)),
            TAG_U8 => Value::U8(self.read_u8()?),
            TAG_U16 => Value::U16(u16::from_le_bytes(self.read_array()?)),
            TAG_U32 => Value::U32(u32::from_le_bytes(self.read_array()?)),
            TAG_U64 => Value::U64(u64::from_le_bytes(self.read_array()?)),
            TAG_F32 => Value::F32(f32::from_le_bytes(self.read_array()?)),
            TAG_F64 => Value::F64(f64::from_le_bytes(self.read_array()?)),
            TAG_STRING => Value::String(self.read_string()?),
            TAG_BYTES => {
                let len = self.read_len()?;
                Value::Bytes(self.read_bytes(len)?.to_vec())
            }
            TAG_TIME => {
                let secs = i64::from_le_bytes(self.read_array()?);
                let nanos = u32::from_le_bytes(self.read_array()?);
                let time = DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
                    CodecError::InvalidData(format!("time out of range: {}s {}ns", secs, nanos))
                })?;
                Value::Time(time)
            }
            TAG_SEQUENCE => {
                let element = self.decode_type(depth + 1)?;
                let len = self.read_len()?;
                let mut items = Vec::with_capacity(len.min(self.remaining()));
                for _ in 0..len {
                    items.push(self.decode_value(depth + 1)?);
                }
                Value::Sequence(Sequence::typed(element, items))
            }
            TAG_DOCUMENT => Value::Document(self.decode_entries(depth)?),
            TAG_INSTANCE => {
                let type_name = self.read_string()?;
                let registered = self
                    .registry
                    .and_then(|r| r.get_type(&type_name).map(|d| (r, d)));
                match registered {
                    Some((registry, descriptor)) => {
                        Value::Instance(self.decode_fields(registry, descriptor, depth)?)
                    }
                    None => {
                        let mut doc = self.decode_entries(depth)?;
                        doc.insert(self.type_marker.to_string(), Value::String(type_name));
                        Value::Document(doc)
                    }
                }
            }
            other => {
                return Err(CodecError::InvalidTag {
                    what: "value",
                    tag: other,
                })
            }
        })
    }

    fn decode_entries(&mut self, depth: usize) -> std::result::Result<Document, CodecError> {
        let len = self.read_len()?;
        let mut doc = Document::new();
        for _ in 0..len {
            let key = self.read_string()?;
            let value = self.decode_value(depth + 1)?;
            doc.insert(key, value);
        }
        Ok(doc)
    }

    /// Top-level instance record decoded as `descriptor`, whatever name it
    /// was encoded under.
    fn decode_record_as(
        &mut self,
        registry: &'a Registry,
        descriptor: Arc<TypeDescriptor>,
    ) -> std::result::Result<Instance, CodecError> {
        let tag = self.read_u8()?;
        if tag != TAG_INSTANCE {
            return Err(CodecError::InvalidTag {
                what: "instance",
                tag,
            });
        }
        let encoded = self.read_string()?;
        if encoded != descriptor.name() {
            log::debug!(
                "[codec] '{}' record decoded as '{}'",
                encoded,
                descriptor.name()
            );
        }
        self.decode_fields(registry, descriptor, 0)
    }

    fn decode_fields(
        &mut self,
        registry: &'a Registry,
        descriptor: Arc<TypeDescriptor>,
        depth: usize,
    ) -> std::result::Result<Instance, CodecError> {
        let mut instance = registry.zero_instance(Arc::clone(&descriptor), &mut Vec::new());
        let len = self.read_len()?;
        for _ in 0..len {
            let key = self.read_string()?;
            let value = self.decode_value(depth + 1)?;
            let index = match descriptor.field_index(&key) {
                Some(i) => i,
                None => {
                    log::debug!("[codec] {}.{} not declared, skipped", descriptor.name(), key);
                    continue;
                }
            };
            let declared = &descriptor.fields()[index].data_type;
            match coerce::convert(&value, declared) {
                Some(stored) => instance.set_index(index, stored),
                None => log::debug!(
                    "[codec] {}.{}: {} does not fit {}",
                    descriptor.name(),
                    key,
                    value.kind(),
                    declared
                ),
            }
        }
        Ok(instance)
    }

    fn decode_type(&mut self, depth: usize) -> std::result::Result<DataType, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::DepthExceeded);
        }
        let tag = self.read_u8()?;
        Ok(match tag {
            TY_ANY => DataType::Any,
            TY_PRIMITIVE => {
                let kind_tag = self.read_u8()?;
                let kind = primitive_from_tag(kind_tag).ok_or(CodecError::InvalidTag {
                    what: "primitive",
                    tag: kind_tag,
                })?;
                DataType::Primitive(kind)
            }
            TY_BYTES => DataType::Bytes,
            TY_SEQUENCE => DataType::sequence_of(self.decode_type(depth + 1)?),
            TY_MAP => DataType::map_of(self.decode_type(depth + 1)?),
            TY_STRUCT => DataType::Struct(self.read_string()?),
            TY_POINTER => DataType::Pointer(self.read_string()?),
            TY_REFERENCE => DataType::Reference,
            other => {
                return Err(CodecError::InvalidTag {
                    what: "type",
                    tag: other,
                })
            }
        })
    }
}
