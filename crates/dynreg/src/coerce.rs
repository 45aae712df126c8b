// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar coercion layer.
//!
//! Best-effort conversions between dynamic values and scalar kinds. Kinds
//! without a rule produce [`Error::UnconvertibleValue`]; parse failures on
//! strings degrade to a zero value instead.

use crate::config::{ROUND_MAGNITUDE_LIMIT, TYPE_MARKER_KEY};
use crate::dynamic::{json, DataType, PrimitiveKind, Sequence, Value};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::num::IntErrorKind;

/// Accepted boolean spellings.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Convert to a string. The result is trimmed.
pub fn to_string(value: &Value) -> Result<String> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => format_float(f64::from(*v), v.to_string()),
        Value::F64(v) => format_float(*v, v.to_string()),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Sequence(seq) if seq.element() == &DataType::Primitive(PrimitiveKind::String) => {
            let parts: Vec<&str> = seq.iter().filter_map(Value::as_str).collect();
            parts.join(" ")
        }
        Value::Document(doc) => {
            json::to_json_string(doc, TYPE_MARKER_KEY).unwrap_or_else(|_| "{}".to_string())
        }
        other => return Err(Error::unconvertible("string", other.kind())),
    };
    Ok(s.trim().to_string())
}

// Rust's float Display never uses exponents; only infinities differ.
fn format_float(v: f64, shortest: String) -> String {
    if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        shortest
    }
}

/// Convert to a signed integer.
pub fn to_int(value: &Value) -> Result<i64> {
    match value {
        Value::Null => Ok(0),
        Value::String(s) => Ok(parse_int(s)),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::I8(v) => Ok(i64::from(*v)),
        Value::I16(v) => Ok(i64::from(*v)),
        Value::I32(v) => Ok(i64::from(*v)),
        Value::I64(v) => Ok(*v),
        Value::U8(v) => Ok(i64::from(*v)),
        Value::U16(v) => Ok(i64::from(*v)),
        Value::U32(v) => Ok(i64::from(*v)),
        Value::U64(v) => Ok(*v as i64),
        Value::F32(v) => Ok(*v as i64),
        Value::F64(v) => Ok(*v as i64),
        Value::Bytes(b) => match <[u8; 8]>::try_from(b.as_slice()) {
            Ok(raw) => Ok(i64::from_be_bytes(raw)),
            Err(_) => Err(Error::unconvertible("int", value.kind())),
        },
        other => Err(Error::unconvertible("int", other.kind())),
    }
}

fn parse_int(s: &str) -> i64 {
    match s.parse::<i64>() {
        Ok(v) => v,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

/// True for booleans and strings spelling one.
pub fn is_bool(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::String(s) => parse_bool(s).is_some(),
        _ => false,
    }
}

/// Convert to a boolean. Strings that do not spell one, and non-boolean
/// kinds, give `false`.
pub fn to_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Null => Err(Error::unconvertible("bool", value.kind())),
        Value::Bool(b) => Ok(*b),
        Value::String(s) => Ok(parse_bool(s).unwrap_or(false)),
        _ => Ok(false),
    }
}

/// True for integers, floats and times.
pub fn is_numeric(value: &Value) -> bool {
    matches!(
        value,
        Value::I8(_)
            | Value::I16(_)
            | Value::I32(_)
            | Value::I64(_)
            | Value::U8(_)
            | Value::U16(_)
            | Value::U32(_)
            | Value::U64(_)
            | Value::F32(_)
            | Value::F64(_)
            | Value::Time(_)
    )
}

/// Convert to `f64`. Times give Unix seconds.
pub fn to_numeric(value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => Ok(s.parse::<f64>().unwrap_or(0.0)),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::I8(v) => Ok(f64::from(*v)),
        Value::I16(v) => Ok(f64::from(*v)),
        Value::I32(v) => Ok(f64::from(*v)),
        Value::I64(v) => Ok(*v as f64),
        Value::U8(v) => Ok(f64::from(*v)),
        Value::U16(v) => Ok(f64::from(*v)),
        Value::U32(v) => Ok(f64::from(*v)),
        Value::U64(v) => Ok(*v as f64),
        Value::F32(v) => Ok(f64::from(*v)),
        Value::F64(v) => Ok(*v),
        Value::Time(t) => Ok(t.timestamp() as f64),
        other => Err(Error::unconvertible("numeric", other.kind())),
    }
}

/// Convert to a UTC time. Unparseable strings give the Unix epoch.
pub fn to_time(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Time(t) => Ok(*t),
        Value::String(s) => Ok(DateTime::parse_from_rfc3339(s.trim())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default()),
        v if is_numeric(v) => {
            let secs = to_numeric(v)?;
            let whole = secs.trunc();
            let nanos = ((secs - whole) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
            Ok(DateTime::from_timestamp(whole as i64, nanos).unwrap_or_default())
        }
        other => Err(Error::unconvertible("time", other.kind())),
    }
}

/// Banker's rounding of `x` to `n` decimals.
///
/// Values with `|x * 10^n|` above [`ROUND_MAGNITUDE_LIMIT`] are returned as is.
pub fn round(x: f64, n: i32) -> f64 {
    let pow = 10f64.powi(n);
    let scaled = x * pow;
    if scaled.abs() > ROUND_MAGNITUDE_LIMIT {
        return x;
    }
    let mut whole = scaled.trunc();
    let frac = scaled - whole;
    let odd = whole.abs() % 2.0 != 0.0;
    if x > 0.0 {
        if frac > 0.5 || (frac == 0.5 && odd) {
            whole += 1.0;
        }
    } else if frac < -0.5 || (frac == -0.5 && odd) {
        whole -= 1.0;
    }
    whole / pow
}

/// Report whether `a < b`.
///
/// Null on either side is always less. Different numeric kinds compare by
/// their `f64` value; other kind pairs are never less.
pub fn less(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return true;
    }
    let ordering = match (a, b) {
        (Value::String(x), Value::String(y)) => x.partial_cmp(y),
        (Value::I8(x), Value::I8(y)) => x.partial_cmp(y),
        (Value::I16(x), Value::I16(y)) => x.partial_cmp(y),
        (Value::I32(x), Value::I32(y)) => x.partial_cmp(y),
        (Value::I64(x), Value::I64(y)) => x.partial_cmp(y),
        (Value::U8(x), Value::U8(y)) => x.partial_cmp(y),
        (Value::U16(x), Value::U16(y)) => x.partial_cmp(y),
        (Value::U32(x), Value::U32(y)) => x.partial_cmp(y),
        (Value::U64(x), Value::U64(y)) => x.partial_cmp(y),
        (Value::F32(x), Value::F32(y)) => x.partial_cmp(y),
        (Value::F64(x), Value::F64(y)) => x.partial_cmp(y),
        (Value::Time(x), Value::Time(y)) => x.partial_cmp(y),
        (x, y) if is_numeric(x) && is_numeric(y) => match (to_numeric(x), to_numeric(y)) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y),
            _ => None,
        },
        _ => {
            log::debug!("[coerce] {} and {} cannot be compared", a.kind(), b.kind());
            None
        }
    };
    ordering == Some(Ordering::Less)
}

/// Coerce a value to a scalar kind. Integer targets wrap on narrowing.
pub fn coerce(value: &Value, kind: PrimitiveKind) -> Result<Value> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::Bool(to_bool(value)?),
        PrimitiveKind::String => Value::String(to_string(value)?),
        PrimitiveKind::Time => Value::Time(to_time(value)?),
        PrimitiveKind::F32 => Value::F32(to_numeric(value)? as f32),
        PrimitiveKind::F64 => Value::F64(to_numeric(value)?),
        _ => integer_as(integer(value)?, kind),
    })
}

// Exact integer view; unsigned strings beyond i64 are kept.
fn integer(value: &Value) -> Result<i128> {
    match value {
        Value::U64(v) => Ok(i128::from(*v)),
        Value::String(s) => match s.parse::<u64>() {
            Ok(v) => Ok(i128::from(v)),
            Err(_) => Ok(i128::from(parse_int(s))),
        },
        other => to_int(other).map(i128::from),
    }
}

fn integer_as(n: i128, kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::I8 => Value::I8(n as i8),
        PrimitiveKind::I16 => Value::I16(n as i16),
        PrimitiveKind::I32 => Value::I32(n as i32),
        PrimitiveKind::U8 => Value::U8(n as u8),
        PrimitiveKind::U16 => Value::U16(n as u16),
        PrimitiveKind::U32 => Value::U32(n as u32),
        PrimitiveKind::U64 => Value::U64(n as u64),
        _ => Value::I64(n as i64),
    }
}

/// Representation conversion between compatible kinds.
///
/// Numeric values convert to any numeric kind with `as` semantics; strings
/// and byte sequences convert into each other. Returns `None` otherwise.
pub fn convert(value: &Value, ty: &DataType) -> Option<Value> {
    // Sequences are rebuilt so the result carries the declared element type.
    if !matches!((ty, value), (DataType::Sequence(_), Value::Sequence(_))) && value.matches(ty) {
        return Some(value.clone());
    }
    match (ty, value) {
        (DataType::Primitive(kind), v) if kind.is_integer() || kind.is_float() => {
            numeric_as(v, *kind)
        }
        (DataType::Primitive(PrimitiveKind::String), Value::Bytes(b)) => {
            Some(Value::String(String::from_utf8_lossy(b).into_owned()))
        }
        (DataType::Bytes, Value::String(s)) => Some(Value::Bytes(s.as_bytes().to_vec())),
        (DataType::Sequence(elem), Value::Sequence(seq)) => {
            let items = seq
                .iter()
                .map(|v| convert(v, elem))
                .collect::<Option<Vec<_>>>()?;
            Some(Value::Sequence(Sequence::typed(elem.as_ref().clone(), items)))
        }
        _ => None,
    }
}

fn numeric_as(value: &Value, kind: PrimitiveKind) -> Option<Value> {
    let float = match value {
        Value::F32(v) => Some(f64::from(*v)),
        Value::F64(v) => Some(*v),
        _ => None,
    };
    if let Some(f) = float {
        return Some(match kind {
            PrimitiveKind::F32 => Value::F32(f as f32),
            PrimitiveKind::F64 => Value::F64(f),
            _ => integer_as(f as i128, kind),
        });
    }
    let n = match value {
        Value::I8(v) => i128::from(*v),
        Value::I16(v) => i128::from(*v),
        Value::I32(v) => i128::from(*v),
        Value::I64(v) => i128::from(*v),
        Value::U8(v) => i128::from(*v),
        Value::U16(v) => i128::from(*v),
        Value::U32(v) => i128::from(*v),
        Value::U64(v) => i128::from(*v),
        _ => return None,
    };
    Some(match kind {
        PrimitiveKind::F32 => Value::F32(n as f32),
        PrimitiveKind::F64 => Value::F64(n as f64),
        _ => integer_as(n, kind),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&Value::from("42")).unwrap(), 42);
        assert_eq!(to_int(&Value::from("4x2")).unwrap(), 0);
        assert_eq!(to_int(&Value::from("99999999999999999999")).unwrap(), i64::MAX);
        assert_eq!(to_int(&Value::from("-99999999999999999999")).unwrap(), i64::MIN);
        assert_eq!(to_int(&Value::F64(3.9)).unwrap(), 3);
        assert_eq!(to_int(&Value::F64(-3.9)).unwrap(), -3);
        assert_eq!(to_int(&Value::Bool(true)).unwrap(), 1);
        assert_eq!(to_int(&Value::U16(7)).unwrap(), 7);
        assert_eq!(to_int(&Value::Null).unwrap(), 0);
        assert_eq!(
            to_int(&Value::Bytes(vec![0, 0, 0, 0, 0, 0, 1, 0])).unwrap(),
            256
        );
        assert!(matches!(
            to_int(&Value::Bytes(vec![1, 2])),
            Err(Error::UnconvertibleValue { target: "int", .. })
        ));
        assert!(to_int(&Value::Document(doc! {})).is_err());
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(&Value::from("  pad  ")).unwrap(), "pad");
        assert_eq!(to_string(&Value::I32(-5)).unwrap(), "-5");
        assert_eq!(to_string(&Value::U64(u64::MAX)).unwrap(), "18446744073709551615");
        assert_eq!(to_string(&Value::F64(0.1)).unwrap(), "0.1");
        assert_eq!(to_string(&Value::F64(1e21)).unwrap(), "1000000000000000000000");
        assert_eq!(to_string(&Value::F32(1.5)).unwrap(), "1.5");
        assert_eq!(to_string(&Value::F64(f64::INFINITY)).unwrap(), "+Inf");
        assert_eq!(to_string(&Value::Bool(false)).unwrap(), "false");
        assert_eq!(to_string(&Value::Bytes(b"raw".to_vec())).unwrap(), "raw");
        assert!(to_string(&Value::Null).is_err());
        assert!(to_string(&Value::Time(DateTime::default())).is_err());
    }

    #[test]
    fn test_to_string_composites() {
        let words = Value::Sequence(Sequence::typed(
            DataType::Primitive(PrimitiveKind::String),
            vec!["a".into(), "b".into(), "c".into()],
        ));
        assert_eq!(to_string(&words).unwrap(), "a b c");
        assert!(to_string(&Value::from(vec!["a", "b"])).is_err());

        let d = Value::Document(doc! { "b" => 2i64, "a" => "x" });
        assert_eq!(to_string(&d).unwrap(), r#"{"a":"x","b":2}"#);
    }

    #[test]
    fn test_to_bool() {
        assert!(to_bool(&Value::from("true")).unwrap());
        assert!(to_bool(&Value::from("T")).unwrap());
        assert!(!to_bool(&Value::from("yes")).unwrap());
        assert!(!to_bool(&Value::I64(1)).unwrap());
        assert!(to_bool(&Value::Null).is_err());

        assert!(is_bool(&Value::from("0")));
        assert!(!is_bool(&Value::from("no")));
        assert!(!is_bool(&Value::I64(0)));
    }

    #[test]
    fn test_to_numeric() {
        assert_eq!(to_numeric(&Value::from("2.5")).unwrap(), 2.5);
        assert_eq!(to_numeric(&Value::from("abc")).unwrap(), 0.0);
        assert_eq!(to_numeric(&Value::Bool(true)).unwrap(), 1.0);
        let t = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        assert_eq!(to_numeric(&Value::Time(t)).unwrap(), 1_700_000_000.0);
        assert!(to_numeric(&Value::Bytes(vec![])).is_err());

        assert!(is_numeric(&Value::U8(1)));
        assert!(is_numeric(&Value::Time(t)));
        assert!(!is_numeric(&Value::from("1")));
    }

    #[test]
    fn test_round() {
        assert_eq!(round(2.5, 0), 2.0);
        assert_eq!(round(3.5, 0), 4.0);
        assert_eq!(round(-2.5, 0), -2.0);
        assert_eq!(round(-3.5, 0), -4.0);
        assert_eq!(round(1.2345, 2), 1.23);
        assert_eq!(round(1e18, 2), 1e18);
    }

    #[test]
    fn test_less() {
        assert!(less(&Value::Null, &Value::I64(1)));
        assert!(less(&Value::I64(1), &Value::Null));
        assert!(less(&Value::from("a"), &Value::from("b")));
        assert!(!less(&Value::I64(2), &Value::I64(1)));
        assert!(less(&Value::I32(1), &Value::F64(1.5)));
        assert!(!less(&Value::from("a"), &Value::I64(5)));
        assert!(!less(&Value::Bool(false), &Value::Bool(true)));
    }

    #[test]
    fn test_to_time() {
        let t = to_time(&Value::from("2024-03-01T12:00:00Z")).unwrap();
        assert_eq!(t.timestamp(), 1_709_294_400);
        assert_eq!(to_time(&Value::from("nope")).unwrap(), DateTime::<Utc>::default());
        assert_eq!(to_time(&Value::I64(60)).unwrap().timestamp(), 60);
        assert!(to_time(&Value::Null).is_err());
    }

    #[test]
    fn test_coerce_kinds() {
        assert_eq!(coerce(&Value::from("300"), PrimitiveKind::U8).unwrap(), Value::U8(44));
        assert_eq!(coerce(&Value::I64(-1), PrimitiveKind::U16).unwrap(), Value::U16(u16::MAX));
        assert_eq!(
            coerce(&Value::from("18446744073709551615"), PrimitiveKind::U64).unwrap(),
            Value::U64(u64::MAX)
        );
        assert_eq!(coerce(&Value::I64(3), PrimitiveKind::F32).unwrap(), Value::F32(3.0));
        assert_eq!(coerce(&Value::I64(3), PrimitiveKind::String).unwrap(), Value::from("3"));
        assert!(matches!(
            coerce(&Value::Document(doc! {}), PrimitiveKind::I32),
            Err(Error::UnconvertibleValue { .. })
        ));
    }

    #[test]
    fn test_convert() {
        let i32_ty = DataType::Primitive(PrimitiveKind::I32);
        assert_eq!(convert(&Value::I64(5), &i32_ty), Some(Value::I32(5)));
        assert_eq!(convert(&Value::F64(2.9), &i32_ty), Some(Value::I32(2)));
        assert_eq!(convert(&Value::from("5"), &i32_ty), None);
        assert_eq!(
            convert(&Value::from("hi"), &DataType::Bytes),
            Some(Value::Bytes(b"hi".to_vec()))
        );

        let floats = DataType::sequence_of(DataType::Primitive(PrimitiveKind::F64));
        let converted = convert(&Value::from(vec![1i64, 2]), &floats).expect("sequence");
        assert_eq!(
            converted,
            Value::Sequence(Sequence::typed(
                DataType::Primitive(PrimitiveKind::F64),
                vec![Value::F64(1.0), Value::F64(2.0)]
            ))
        );
    }
}
