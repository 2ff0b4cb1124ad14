// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Stored value payloads.
//!
//! A value is a one-byte type tag plus a type-specific payload. Unlike the key
//! encoding, the value encoding is never compared bytewise, so integers are
//! stored as plain big-endian and strings raw. A value optionally carries a
//! TTL: a `ttl` prefix byte, the duration in milliseconds, then the wrapped
//! value.

use std::fmt;

use crate::time::HybridTime;

use super::error::{DocError, DocResult};
use super::primitive::PrimitiveValue;
use super::value_type::ValueType;

/// Time-to-live attached to a stored value. [`Ttl::MAX`] means "never
/// expires" and is not written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ttl(Option<u64>);

impl Ttl {
    /// Never expires.
    pub const MAX: Ttl = Ttl(None);

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Ttl(Some(millis))
    }

    #[inline]
    pub const fn is_max(&self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub const fn millis(&self) -> Option<u64> {
        self.0
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::MAX
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ms) => write!(f, "{ms}ms"),
            None => write!(f, "max"),
        }
    }
}

/// A primitive (or marker) together with its TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    primitive: PrimitiveValue,
    ttl: Ttl,
}

impl Value {
    pub fn new(primitive: PrimitiveValue, ttl: Ttl) -> Self {
        Self { primitive, ttl }
    }

    pub fn from_primitive(primitive: PrimitiveValue) -> Self {
        Self::new(primitive, Ttl::MAX)
    }

    /// The deletion marker.
    pub fn tombstone() -> Self {
        Self::from_primitive(PrimitiveValue::Tombstone)
    }

    /// The object init marker.
    pub fn object_marker() -> Self {
        Self::from_primitive(PrimitiveValue::Object)
    }

    #[inline]
    pub fn primitive(&self) -> &PrimitiveValue {
        &self.primitive
    }

    #[inline]
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self.primitive, PrimitiveValue::Tombstone)
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.primitive.value_type()
    }

    /// Returns true if this value, written at `written`, is no longer live at
    /// `snapshot`. `table_ttl` applies when the value has no TTL of its own.
    pub fn expired_at(&self, written: HybridTime, snapshot: HybridTime, table_ttl: Ttl) -> bool {
        let effective = if self.ttl.is_max() { table_ttl } else { self.ttl };
        match effective.millis() {
            None => false,
            Some(ms) => written.add_millis(ms) <= snapshot,
        }
    }

    /// Serializes into the stored byte form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if let Some(ms) = self.ttl.millis() {
            out.push(ValueType::TtlPrefix.as_byte());
            out.extend_from_slice(&ms.to_be_bytes());
        }
        match &self.primitive {
            PrimitiveValue::Null
            | PrimitiveValue::Boolean(_)
            | PrimitiveValue::Object
            | PrimitiveValue::Array
            | PrimitiveValue::Tombstone => out.push(self.primitive.value_type().as_byte()),
            PrimitiveValue::Int64(v) => {
                out.push(ValueType::Int64.as_byte());
                out.extend_from_slice(&v.to_be_bytes());
            }
            PrimitiveValue::Double(v) => {
                out.push(ValueType::Double.as_byte());
                out.extend_from_slice(&v.to_bits().to_be_bytes());
            }
            PrimitiveValue::Timestamp(v) => {
                out.push(ValueType::Timestamp.as_byte());
                out.extend_from_slice(&v.to_be_bytes());
            }
            PrimitiveValue::Uuid(bytes) => {
                out.push(ValueType::Uuid.as_byte());
                out.extend_from_slice(bytes);
            }
            PrimitiveValue::Decimal(s) => {
                out.push(ValueType::Decimal.as_byte());
                out.extend_from_slice(s.as_bytes());
            }
            PrimitiveValue::String(s) => {
                out.push(ValueType::String.as_byte());
                out.extend_from_slice(s.as_bytes());
            }
        }
        out
    }

    /// Decodes a stored value; the whole slice must be consumed.
    pub fn decode(bytes: &[u8]) -> DocResult<Value> {
        let (ttl, rest) = Self::split_ttl(bytes)?;
        let (&tag, payload) = rest
            .split_first()
            .ok_or_else(|| DocError::CorruptValue("empty value".into()))?;
        let vt = ValueType::from_byte(tag)
            .map_err(|_| DocError::CorruptValue(format!("unknown value type byte 0x{tag:02x}")))?;
        let primitive = match vt {
            ValueType::Null => expect_empty(payload, PrimitiveValue::Null)?,
            ValueType::False => expect_empty(payload, PrimitiveValue::Boolean(false))?,
            ValueType::True => expect_empty(payload, PrimitiveValue::Boolean(true))?,
            ValueType::Object => expect_empty(payload, PrimitiveValue::Object)?,
            ValueType::Array => expect_empty(payload, PrimitiveValue::Array)?,
            ValueType::Tombstone => expect_empty(payload, PrimitiveValue::Tombstone)?,
            ValueType::Int64 => PrimitiveValue::Int64(i64::from_be_bytes(fixed(payload)?)),
            ValueType::Double => {
                PrimitiveValue::Double(f64::from_bits(u64::from_be_bytes(fixed(payload)?)))
            }
            ValueType::Timestamp => PrimitiveValue::Timestamp(i64::from_be_bytes(fixed(payload)?)),
            ValueType::Uuid => PrimitiveValue::Uuid(fixed(payload)?),
            ValueType::Decimal => PrimitiveValue::Decimal(value_utf8(payload)?),
            ValueType::String => PrimitiveValue::String(value_utf8(payload)?),
            ValueType::GroupEnd | ValueType::UInt16Hash | ValueType::TtlPrefix => {
                return Err(DocError::CorruptValue(format!(
                    "{vt:?} is not a valid value type"
                )))
            }
        };
        Ok(Value::new(primitive, ttl))
    }

    /// Reads just the value type, without materializing the payload.
    pub fn decode_type(bytes: &[u8]) -> DocResult<ValueType> {
        let (_, rest) = Self::split_ttl(bytes)?;
        let &tag = rest
            .first()
            .ok_or_else(|| DocError::CorruptValue("empty value".into()))?;
        ValueType::from_byte(tag)
            .map_err(|_| DocError::CorruptValue(format!("unknown value type byte 0x{tag:02x}")))
    }

    fn split_ttl(bytes: &[u8]) -> DocResult<(Ttl, &[u8])> {
        match bytes.first() {
            Some(&b) if b == ValueType::TtlPrefix.as_byte() => {
                if bytes.len() < 9 {
                    return Err(DocError::CorruptValue("truncated ttl prefix".into()));
                }
                let mut ms = [0u8; 8];
                ms.copy_from_slice(&bytes[1..9]);
                let rest = &bytes[9..];
                if rest.first() == Some(&ValueType::TtlPrefix.as_byte()) {
                    return Err(DocError::CorruptValue("nested ttl prefix".into()));
                }
                Ok((Ttl::from_millis(u64::from_be_bytes(ms)), rest))
            }
            _ => Ok((Ttl::MAX, bytes)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ttl.is_max() {
            write!(f, "{}", self.primitive)
        } else {
            write!(f, "{}; TTL: {}", self.primitive, self.ttl)
        }
    }
}

fn expect_empty(payload: &[u8], primitive: PrimitiveValue) -> DocResult<PrimitiveValue> {
    if payload.is_empty() {
        Ok(primitive)
    } else {
        Err(DocError::CorruptValue(format!(
            "unexpected payload after {:?}",
            primitive.value_type()
        )))
    }
}

fn fixed<const N: usize>(payload: &[u8]) -> DocResult<[u8; N]> {
    if payload.len() != N {
        return Err(DocError::CorruptValue(format!(
            "expected {N}-byte payload, found {}",
            payload.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(payload);
    Ok(out)
}

fn value_utf8(payload: &[u8]) -> DocResult<String> {
    String::from_utf8(payload.to_vec())
        .map_err(|_| DocError::CorruptValue("invalid utf-8 in value".into()))
}
