// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Primitive values and their order-preserving key encoding.
//!
//! Every primitive encodes as a one-byte [`ValueType`] tag followed by a
//! type-specific payload. The key form is designed so that comparing encoded
//! byte strings is equivalent to comparing the primitives themselves, and so
//! that concatenated primitives remain self-delimiting:
//!
//! - strings are "zero encoded": `0x00` becomes `0x00 0x01`, terminated by
//!   `0x00 0x00`;
//! - signed 64-bit integers are big-endian with the sign bit flipped;
//! - doubles are big-endian IEEE bits, fully inverted when negative and with
//!   only the sign bit flipped when positive.
//!
//! The value form of the same primitives lives in [`super::value`]; it skips
//! the ordering transforms because values are never compared bytewise.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::error::{DocError, DocResult};
use super::value_type::ValueType;

const SIGN_BIT: u64 = 1 << 63;

/// A tagged scalar: the leaf type of the document model.
///
/// The `Object`, `Array`, and `Tombstone` variants are reserved sentinels.
/// They appear as stored value types (init markers, deletion markers) but are
/// not key-encodable and carry no payload.
#[derive(Debug, Clone)]
pub enum PrimitiveValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Double(f64),
    /// Arbitrary-precision decimal carried as its canonical string form.
    Decimal(String),
    String(String),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
    Uuid([u8; 16]),
    Object,
    Array,
    Tombstone,
}

impl PrimitiveValue {
    /// Returns the type tag this primitive encodes with.
    pub fn value_type(&self) -> ValueType {
        match self {
            PrimitiveValue::Null => ValueType::Null,
            PrimitiveValue::Boolean(false) => ValueType::False,
            PrimitiveValue::Boolean(true) => ValueType::True,
            PrimitiveValue::Int64(_) => ValueType::Int64,
            PrimitiveValue::Double(_) => ValueType::Double,
            PrimitiveValue::Decimal(_) => ValueType::Decimal,
            PrimitiveValue::String(_) => ValueType::String,
            PrimitiveValue::Timestamp(_) => ValueType::Timestamp,
            PrimitiveValue::Uuid(_) => ValueType::Uuid,
            PrimitiveValue::Object => ValueType::Object,
            PrimitiveValue::Array => ValueType::Array,
            PrimitiveValue::Tombstone => ValueType::Tombstone,
        }
    }

    /// Appends the order-preserving key encoding of this primitive.
    ///
    /// Sentinels (`Object`, `Array`, `Tombstone`) are not addressable path
    /// components and are rejected with `BadArgument`.
    pub fn append_to_key(&self, out: &mut Vec<u8>) -> DocResult<()> {
        match self {
            PrimitiveValue::Null
            | PrimitiveValue::Boolean(_) => out.push(self.value_type().as_byte()),
            PrimitiveValue::Int64(v) => {
                out.push(ValueType::Int64.as_byte());
                out.extend_from_slice(&encode_int64_ordered(*v));
            }
            PrimitiveValue::Double(v) => {
                out.push(ValueType::Double.as_byte());
                out.extend_from_slice(&encode_double_ordered(*v));
            }
            PrimitiveValue::Decimal(s) => {
                out.push(ValueType::Decimal.as_byte());
                append_zero_encoded(s.as_bytes(), out);
            }
            PrimitiveValue::String(s) => {
                out.push(ValueType::String.as_byte());
                append_zero_encoded(s.as_bytes(), out);
            }
            PrimitiveValue::Timestamp(v) => {
                out.push(ValueType::Timestamp.as_byte());
                out.extend_from_slice(&encode_int64_ordered(*v));
            }
            PrimitiveValue::Uuid(bytes) => {
                out.push(ValueType::Uuid.as_byte());
                out.extend_from_slice(bytes);
            }
            PrimitiveValue::Object | PrimitiveValue::Array | PrimitiveValue::Tombstone => {
                return Err(DocError::BadArgument(format!(
                    "{:?} is not key-encodable",
                    self.value_type()
                )));
            }
        }
        Ok(())
    }

    /// Convenience wrapper around [`PrimitiveValue::append_to_key`].
    pub fn to_key_bytes(&self) -> DocResult<Vec<u8>> {
        let mut out = Vec::new();
        self.append_to_key(&mut out)?;
        Ok(out)
    }

    /// Decodes one primitive from the front of `input`, advancing it past the
    /// consumed bytes. Fails with `CorruptKey` on unknown tags or truncated
    /// payloads.
    pub fn decode_from_key(input: &mut &[u8]) -> DocResult<PrimitiveValue> {
        let (&tag, rest) = input
            .split_first()
            .ok_or_else(|| DocError::CorruptKey("empty key component".into()))?;
        *input = rest;

        match ValueType::from_byte(tag)? {
            ValueType::Null => Ok(PrimitiveValue::Null),
            ValueType::False => Ok(PrimitiveValue::Boolean(false)),
            ValueType::True => Ok(PrimitiveValue::Boolean(true)),
            ValueType::Int64 => Ok(PrimitiveValue::Int64(decode_int64_ordered(take_array(
                input,
            )?))),
            ValueType::Double => Ok(PrimitiveValue::Double(decode_double_ordered(take_array(
                input,
            )?))),
            ValueType::Timestamp => Ok(PrimitiveValue::Timestamp(decode_int64_ordered(
                take_array(input)?,
            ))),
            ValueType::Uuid => Ok(PrimitiveValue::Uuid(take_array(input)?)),
            ValueType::Decimal => {
                let bytes = decode_zero_encoded(input)?;
                Ok(PrimitiveValue::Decimal(utf8(bytes)?))
            }
            ValueType::String => {
                let bytes = decode_zero_encoded(input)?;
                Ok(PrimitiveValue::String(utf8(bytes)?))
            }
            other => Err(DocError::CorruptKey(format!(
                "{other:?} is not a valid key component"
            ))),
        }
    }
}

impl From<&str> for PrimitiveValue {
    fn from(s: &str) -> Self {
        PrimitiveValue::String(s.to_string())
    }
}

impl From<i64> for PrimitiveValue {
    fn from(v: i64) -> Self {
        PrimitiveValue::Int64(v)
    }
}

impl From<bool> for PrimitiveValue {
    fn from(v: bool) -> Self {
        PrimitiveValue::Boolean(v)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(v: f64) -> Self {
        PrimitiveValue::Double(v)
    }
}

impl PartialEq for PrimitiveValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PrimitiveValue {}

impl PartialOrd for PrimitiveValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrimitiveValue {
    /// Total order matching the bytewise order of the key encoding: type tags
    /// first, then the per-type payload. Doubles compare by their ordered bit
    /// pattern, which gives a total order over NaNs as well.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_type = self.value_type().as_byte().cmp(&other.value_type().as_byte());
        if by_type != Ordering::Equal {
            return by_type;
        }
        match (self, other) {
            (PrimitiveValue::Int64(a), PrimitiveValue::Int64(b)) => a.cmp(b),
            (PrimitiveValue::Double(a), PrimitiveValue::Double(b)) => {
                encode_double_ordered(*a).cmp(&encode_double_ordered(*b))
            }
            (PrimitiveValue::Decimal(a), PrimitiveValue::Decimal(b)) => a.cmp(b),
            (PrimitiveValue::String(a), PrimitiveValue::String(b)) => a.cmp(b),
            (PrimitiveValue::Timestamp(a), PrimitiveValue::Timestamp(b)) => a.cmp(b),
            (PrimitiveValue::Uuid(a), PrimitiveValue::Uuid(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl Hash for PrimitiveValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_type().as_byte().hash(state);
        match self {
            PrimitiveValue::Int64(v) | PrimitiveValue::Timestamp(v) => v.hash(state),
            PrimitiveValue::Double(v) => v.to_bits().hash(state),
            PrimitiveValue::Decimal(s) | PrimitiveValue::String(s) => s.hash(state),
            PrimitiveValue::Uuid(b) => b.hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Null => write!(f, "null"),
            PrimitiveValue::Boolean(v) => write!(f, "{v}"),
            PrimitiveValue::Int64(v) => write!(f, "{v}"),
            PrimitiveValue::Double(v) => write!(f, "{v}"),
            PrimitiveValue::Decimal(s) => write!(f, "Decimal({s})"),
            PrimitiveValue::String(s) => write!(f, "{s:?}"),
            PrimitiveValue::Timestamp(v) => write!(f, "Timestamp({v})"),
            PrimitiveValue::Uuid(bytes) => {
                write!(f, "Uuid(")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                write!(f, ")")
            }
            PrimitiveValue::Object => write!(f, "{{}}"),
            PrimitiveValue::Array => write!(f, "[]"),
            PrimitiveValue::Tombstone => write!(f, "DEL"),
        }
    }
}

/// Big-endian with the sign bit flipped, so bytewise order matches numeric
/// order.
#[inline]
fn encode_int64_ordered(v: i64) -> [u8; 8] {
    ((v as u64) ^ SIGN_BIT).to_be_bytes()
}

#[inline]
fn decode_int64_ordered(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ SIGN_BIT) as i64
}

/// IEEE 754 order transform: negative doubles have all bits inverted,
/// non-negative ones only the sign bit flipped.
#[inline]
fn encode_double_ordered(v: f64) -> [u8; 8] {
    let bits = v.to_bits();
    let ordered = if bits & SIGN_BIT != 0 {
        !bits
    } else {
        bits | SIGN_BIT
    };
    ordered.to_be_bytes()
}

#[inline]
fn decode_double_ordered(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    let bits = if ordered & SIGN_BIT != 0 {
        ordered & !SIGN_BIT
    } else {
        !ordered
    };
    f64::from_bits(bits)
}

/// Copies `bytes` replacing `0x00` with `0x00 0x01`, then appends the
/// `0x00 0x00` terminator.
fn append_zero_encoded(bytes: &[u8], out: &mut Vec<u8>) {
    for &b in bytes {
        if b == 0x00 {
            out.extend_from_slice(&[0x00, 0x01]);
        } else {
            out.push(b);
        }
    }
    out.extend_from_slice(&[0x00, 0x00]);
}

/// Inverse of [`append_zero_encoded`]; consumes through the terminator.
fn decode_zero_encoded(input: &mut &[u8]) -> DocResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    loop {
        match input.get(i) {
            None => return Err(DocError::CorruptKey("unterminated string".into())),
            Some(0x00) => match input.get(i + 1) {
                Some(0x00) => {
                    *input = &input[i + 2..];
                    return Ok(out);
                }
                Some(0x01) => {
                    out.push(0x00);
                    i += 2;
                }
                _ => {
                    return Err(DocError::CorruptKey(
                        "invalid zero-encoding escape".into(),
                    ))
                }
            },
            Some(&b) => {
                out.push(b);
                i += 1;
            }
        }
    }
}

fn take_array<const N: usize>(input: &mut &[u8]) -> DocResult<[u8; N]> {
    if input.len() < N {
        return Err(DocError::CorruptKey(format!(
            "truncated payload: need {N} bytes, have {}",
            input.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&input[..N]);
    *input = &input[N..];
    Ok(out)
}

fn utf8(bytes: Vec<u8>) -> DocResult<String> {
    String::from_utf8(bytes).map_err(|_| DocError::CorruptKey("invalid utf-8 in key".into()))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_primitive() -> impl Strategy<Value = PrimitiveValue> {
        prop_oneof![
            Just(PrimitiveValue::Null),
            any::<bool>().prop_map(PrimitiveValue::Boolean),
            any::<i64>().prop_map(PrimitiveValue::Int64),
            any::<f64>().prop_map(PrimitiveValue::Double),
            "[0-9]{1,18}(\\.[0-9]{1,6})?".prop_map(PrimitiveValue::Decimal),
            ".*".prop_map(PrimitiveValue::String),
            any::<i64>().prop_map(PrimitiveValue::Timestamp),
            any::<[u8; 16]>().prop_map(PrimitiveValue::Uuid),
        ]
    }

    proptest! {
        #[test]
        fn key_roundtrip(p in arb_primitive()) {
            let encoded = p.to_key_bytes().unwrap();
            let mut slice = encoded.as_slice();
            let decoded = PrimitiveValue::decode_from_key(&mut slice).unwrap();
            prop_assert!(slice.is_empty());
            prop_assert_eq!(decoded, p);
        }

        #[test]
        fn key_order_matches_value_order(a in arb_primitive(), b in arb_primitive()) {
            let ea = a.to_key_bytes().unwrap();
            let eb = b.to_key_bytes().unwrap();
            prop_assert_eq!(a.cmp(&b), ea.cmp(&eb));
        }

        #[test]
        fn concatenated_keys_self_delimit(a in arb_primitive(), b in arb_primitive()) {
            let mut joined = a.to_key_bytes().unwrap();
            b.append_to_key(&mut joined).unwrap();
            let mut slice = joined.as_slice();
            let da = PrimitiveValue::decode_from_key(&mut slice).unwrap();
            let db = PrimitiveValue::decode_from_key(&mut slice).unwrap();
            prop_assert!(slice.is_empty());
            prop_assert_eq!(da, a);
            prop_assert_eq!(db, b);
        }
    }
}
