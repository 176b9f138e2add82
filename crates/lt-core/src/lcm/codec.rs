//! LCM binary encoding of dynamic messages.
//!
//! A payload is the 8-byte big-endian fingerprint of the top-level type
//! followed by its members in declaration order. All integers and floats are
//! big-endian; booleans take one byte; strings are an `i32` length that
//! counts a trailing NUL, then the bytes and the NUL. Nested records carry
//! no fingerprint of their own. Arrays are written element by element,
//! outermost dimension first.

use lt_common::{Message, Value};
use thiserror::Error;

use super::catalog::Primitive;
use super::registry::{DecodeError, Extent, MemberType, TypeRegistry};

/// Failure to encode a message against its type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("unknown type {0}")]
    UnknownType(String),

    #[error("field '{field}': expected {expected}")]
    Mismatch { field: String, expected: String },
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Malformed(format!(
                "needed {} bytes at offset {}, {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

/// Decode a full payload, fingerprint included.
pub fn decode(registry: &TypeRegistry, payload: &[u8]) -> Result<Message, DecodeError> {
    let mut reader = Reader::new(payload);
    let fingerprint = u64::from_be_bytes(
        reader
            .array::<8>()
            .map_err(|_| DecodeError::Malformed("payload shorter than a fingerprint".into()))?,
    );
    let index = registry
        .index_of_fingerprint(fingerprint)
        .ok_or(DecodeError::UnknownType { fingerprint })?;
    decode_record(registry, index, &mut reader)
}

fn decode_record(registry: &TypeRegistry, index: usize, r: &mut Reader<'_>) -> Result<Message, DecodeError> {
    let ty = registry.resolved(index);
    let mut msg = Message::new(ty.name.as_str());

    for member in &ty.members {
        let value = if member.dims.is_empty() {
            decode_one(registry, &member.ty, r)?
        } else {
            let extents = member
                .dims
                .iter()
                .map(|d| extent(&msg, d, &member.name))
                .collect::<Result<Vec<_>, _>>()?;
            decode_array(registry, &member.ty, &extents, r)?
        };
        msg.push(member.name.as_str(), value);
    }
    Ok(msg)
}

fn extent(msg: &Message, dim: &Extent, member: &str) -> Result<usize, DecodeError> {
    match dim {
        Extent::Fixed(n) => Ok(*n),
        Extent::Var(name) => {
            let n = msg.get(name).and_then(Value::as_int).unwrap_or(-1);
            usize::try_from(n).map_err(|_| {
                DecodeError::Malformed(format!("{}: invalid length {} in '{}'", member, n, name))
            })
        }
    }
}

fn decode_array(
    registry: &TypeRegistry,
    ty: &MemberType,
    extents: &[usize],
    r: &mut Reader<'_>,
) -> Result<Value, DecodeError> {
    let n = extents[0];
    let mut items = Vec::with_capacity(n.min(r.remaining()));
    for _ in 0..n {
        let item = if extents.len() == 1 {
            decode_one(registry, ty, r)?
        } else {
            decode_array(registry, ty, &extents[1..], r)?
        };
        items.push(item);
    }
    Ok(Value::Array(items))
}

fn decode_one(registry: &TypeRegistry, ty: &MemberType, r: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let p = match ty {
        MemberType::Struct(index) => return Ok(Value::Record(decode_record(registry, *index, r)?)),
        MemberType::Primitive(p) => *p,
    };
    Ok(match p {
        Primitive::Int8 => Value::Int(i8::from_be_bytes(r.array()?) as i64),
        Primitive::Int16 => Value::Int(i16::from_be_bytes(r.array()?) as i64),
        Primitive::Int32 => Value::Int(i32::from_be_bytes(r.array()?) as i64),
        Primitive::Int64 => Value::Int(i64::from_be_bytes(r.array()?)),
        Primitive::Byte => Value::Int(u8::from_be_bytes(r.array()?) as i64),
        Primitive::Float => Value::Float(f32::from_be_bytes(r.array()?) as f64),
        Primitive::Double => Value::Float(f64::from_be_bytes(r.array()?)),
        Primitive::Boolean => Value::Bool(i8::from_be_bytes(r.array()?) != 0),
        Primitive::String => {
            let len = i32::from_be_bytes(r.array()?);
            let len = usize::try_from(len)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| DecodeError::Malformed(format!("invalid string length {}", len)))?;
            let bytes = r.take(len)?;
            let text = bytes.strip_suffix(&[0u8]).unwrap_or(bytes);
            Value::Text(String::from_utf8_lossy(text).into_owned())
        }
    })
}

/// Encode `msg` as the registry type at `index`, fingerprint first.
pub(crate) fn encode(registry: &TypeRegistry, index: usize, msg: &Message) -> Result<Vec<u8>, EncodeError> {
    let mut out = registry.resolved(index).fingerprint.to_be_bytes().to_vec();
    encode_record(registry, index, msg, &mut out)?;
    Ok(out)
}

fn encode_record(registry: &TypeRegistry, index: usize, msg: &Message, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    for member in &registry.resolved(index).members {
        let value = msg.get(&member.name).ok_or_else(|| EncodeError::Mismatch {
            field: member.name.clone(),
            expected: "a value".into(),
        })?;
        encode_array(registry, &member.ty, value, member.dims.len(), &member.name, out)?;
    }
    Ok(())
}

fn encode_array(
    registry: &TypeRegistry,
    ty: &MemberType,
    value: &Value,
    depth: usize,
    field: &str,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    if depth == 0 {
        return encode_one(registry, ty, value, field, out);
    }
    match value {
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| encode_array(registry, ty, item, depth - 1, field, out)),
        _ => Err(mismatch(field, "an array")),
    }
}

fn encode_one(
    registry: &TypeRegistry,
    ty: &MemberType,
    value: &Value,
    field: &str,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let p = match (ty, value) {
        (MemberType::Struct(index), Value::Record(m)) => return encode_record(registry, *index, m, out),
        (MemberType::Struct(_), _) => return Err(mismatch(field, "a record")),
        (MemberType::Primitive(p), _) => *p,
    };

    match (p, value) {
        (Primitive::Int8, Value::Int(i)) => out.extend_from_slice(&(*i as i8).to_be_bytes()),
        (Primitive::Int16, Value::Int(i)) => out.extend_from_slice(&(*i as i16).to_be_bytes()),
        (Primitive::Int32, Value::Int(i)) => out.extend_from_slice(&(*i as i32).to_be_bytes()),
        (Primitive::Int64, Value::Int(i)) => out.extend_from_slice(&i.to_be_bytes()),
        (Primitive::Byte, Value::Int(i)) => out.push(*i as u8),
        (Primitive::Float, v) => {
            let f = v.as_number().ok_or_else(|| mismatch(field, "a number"))?;
            out.extend_from_slice(&(f as f32).to_be_bytes());
        }
        (Primitive::Double, v) => {
            let f = v.as_number().ok_or_else(|| mismatch(field, "a number"))?;
            out.extend_from_slice(&f.to_be_bytes());
        }
        (Primitive::Boolean, Value::Bool(b)) => out.push(u8::from(*b)),
        (Primitive::String, Value::Text(s)) => {
            out.extend_from_slice(&(s.len() as i32 + 1).to_be_bytes());
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        (p, _) => return Err(mismatch(field, p.lcm_name())),
    }
    Ok(())
}

fn mismatch(field: &str, expected: &str) -> EncodeError {
    EncodeError::Mismatch {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcm::catalog::TypeCatalog;

    const CATALOG: &str = r#"{"package": "nav", "types": [
        {"name": "pt_t", "members": [
            {"name": "x", "type": "float"},
            {"name": "ok", "type": "boolean"}
        ]},
        {"name": "scan_t", "members": [
            {"name": "utime", "type": "int64_t"},
            {"name": "frame", "type": "string"},
            {"name": "n", "type": "int16_t"},
            {"name": "ranges", "type": "double", "dims": ["n"]},
            {"name": "grid", "type": "int8_t", "dims": [2, 2]},
            {"name": "raw", "type": "byte", "dims": [2]},
            {"name": "origin", "type": "pt_t"},
            {"name": "pts", "type": "pt_t", "dims": ["n"]}
        ]}
    ]}"#;

    fn registry() -> TypeRegistry {
        TypeRegistry::from_catalogs(vec![TypeCatalog::parse_json(CATALOG).unwrap()]).unwrap()
    }

    fn pt(x: f64, ok: bool) -> Value {
        Value::Record(Message::new("pt_t").with("x", Value::Float(x)).with("ok", Value::Bool(ok)))
    }

    fn scan() -> Message {
        Message::new("scan_t")
            .with("utime", Value::Int(1_700_000_000_000_000))
            .with("frame", Value::Text("laser".into()))
            .with("n", Value::Int(2))
            .with("ranges", Value::Array(vec![Value::Float(1.5), Value::Float(-2.25)]))
            .with(
                "grid",
                Value::Array(vec![
                    Value::Array(vec![Value::Int(-1), Value::Int(2)]),
                    Value::Array(vec![Value::Int(3), Value::Int(-4)]),
                ]),
            )
            .with("raw", Value::Array(vec![Value::Int(255), Value::Int(0)]))
            .with("origin", pt(0.5, true))
            .with("pts", Value::Array(vec![pt(1.0, false), pt(2.0, true)]))
    }

    #[test]
    fn encoded_message_decodes_to_same_fields() {
        let reg = registry();
        let bytes = reg.encode("nav.scan_t", &scan()).unwrap();
        assert_eq!(
            &bytes[..8],
            &reg.fingerprint_of("nav.scan_t").unwrap().to_be_bytes()
        );
        assert_eq!(reg.decode_message(&bytes).unwrap(), scan());
    }

    #[test]
    fn string_length_counts_trailing_nul() {
        let reg = registry();
        let bytes = reg.encode("nav.scan_t", &scan()).unwrap();
        // fingerprint (8) + utime (8), then the string length
        assert_eq!(&bytes[16..20], &6i32.to_be_bytes());
        assert_eq!(&bytes[20..26], b"laser\0");
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let reg = registry();
        let bytes = reg.encode("nav.scan_t", &scan()).unwrap();
        let err = reg.decode_message(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
        assert!(matches!(
            reg.decode_message(&[1, 2, 3]),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn negative_variable_length_is_malformed() {
        let reg = registry();
        let base = scan();
        let msg = Message::new("scan_t")
            .with("utime", base.get("utime").cloned().unwrap())
            .with("frame", Value::Text("f".into()))
            .with("n", Value::Int(-1))
            .with("ranges", Value::Array(vec![]))
            .with("grid", base.get("grid").cloned().unwrap())
            .with("raw", base.get("raw").cloned().unwrap())
            .with("origin", pt(0.0, false))
            .with("pts", Value::Array(vec![]));
        let bytes = reg.encode("nav.scan_t", &msg).unwrap();
        assert!(matches!(
            reg.decode_message(&bytes),
            Err(DecodeError::Malformed(reason)) if reason.contains("invalid length")
        ));
    }

    #[test]
    fn type_mismatch_on_encode() {
        let reg = registry();
        let msg = Message::new("pt_t").with("x", Value::Text("no".into())).with("ok", Value::Bool(true));
        assert_eq!(
            reg.encode("nav.pt_t", &msg),
            Err(EncodeError::Mismatch {
                field: "x".into(),
                expected: "a number".into()
            })
        );
        assert!(matches!(
            reg.encode("nav.nope_t", &msg),
            Err(EncodeError::UnknownType(_))
        ));
    }
}
