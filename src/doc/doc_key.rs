// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Document keys and subdocument keys.
//!
//! A [`DocKey`] names a top-level document: an optional 2-byte hash bucket
//! with its hashed primitives, then the range primitives. Each group is
//! terminated by a group-end marker, so the encoding stays prefix-free.
//!
//! A [`SubDocKey`] is a `DocKey` plus the subkey path below the document root
//! and, when present, the generation [`HybridTime`] of the addressed node:
//!
//! ```text
//! [doc key] [subkey...] [group-end] [~hybrid_time]
//! ```
//!
//! The group-end before the timestamp appears only when a timestamp follows,
//! which is what lets a timestamp-free encoding serve as a scan prefix for
//! the whole subtree.

use std::fmt;

use crate::time::HybridTime;

use super::error::{DocError, DocResult};
use super::key_bytes::KeyBytes;
use super::primitive::PrimitiveValue;
use super::value_type::ValueType;

/// Identity of a top-level document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DocKey {
    hash_bucket: Option<u16>,
    hashed_group: Vec<PrimitiveValue>,
    range_group: Vec<PrimitiveValue>,
}

impl DocKey {
    /// A range-partitioned key: no hash bucket, range components only.
    pub fn new(range_group: Vec<PrimitiveValue>) -> Self {
        Self {
            hash_bucket: None,
            hashed_group: Vec::new(),
            range_group,
        }
    }

    /// A hash-partitioned key. The bucket is the externally computed hash of
    /// the hashed components.
    pub fn with_hash(
        hash_bucket: u16,
        hashed_group: Vec<PrimitiveValue>,
        range_group: Vec<PrimitiveValue>,
    ) -> Self {
        Self {
            hash_bucket: Some(hash_bucket),
            hashed_group,
            range_group,
        }
    }

    #[inline]
    pub fn hash_bucket(&self) -> Option<u16> {
        self.hash_bucket
    }

    #[inline]
    pub fn hashed_group(&self) -> &[PrimitiveValue] {
        &self.hashed_group
    }

    #[inline]
    pub fn range_group(&self) -> &[PrimitiveValue] {
        &self.range_group
    }

    /// Appends the full encoding, including both group-end markers.
    pub fn append_to(&self, key: &mut KeyBytes) -> DocResult<()> {
        match self.hash_bucket {
            Some(bucket) => {
                key.append_value_type(ValueType::UInt16Hash);
                key.append_raw(&bucket.to_be_bytes());
                for p in &self.hashed_group {
                    key.append_primitive(p)?;
                }
            }
            None => {
                if !self.hashed_group.is_empty() {
                    return Err(DocError::BadArgument(
                        "hashed components require a hash bucket".into(),
                    ));
                }
            }
        }
        key.append_group_end();
        for p in &self.range_group {
            key.append_primitive(p)?;
        }
        key.append_group_end();
        Ok(())
    }

    pub fn encode(&self) -> DocResult<KeyBytes> {
        let mut key = KeyBytes::new();
        self.append_to(&mut key)?;
        Ok(key)
    }

    /// Decodes a DocKey from the front of `input`, advancing past it.
    pub fn decode_from(input: &mut &[u8]) -> DocResult<DocKey> {
        let mut doc_key = DocKey::default();
        if let Some(&first) = input.first() {
            if first == ValueType::UInt16Hash.as_byte() {
                if input.len() < 3 {
                    return Err(DocError::CorruptKey("truncated hash bucket".into()));
                }
                doc_key.hash_bucket = Some(u16::from_be_bytes([input[1], input[2]]));
                *input = &input[3..];
                doc_key.hashed_group = decode_group(input)?;
            } else {
                expect_group_end(input)?;
            }
        } else {
            return Err(DocError::CorruptKey("empty document key".into()));
        }
        doc_key.range_group = decode_group(input)?;
        Ok(doc_key)
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocKey(")?;
        if let Some(bucket) = self.hash_bucket {
            write!(f, "0x{bucket:04x}, ")?;
        }
        write_group(f, &self.hashed_group)?;
        write!(f, ", ")?;
        write_group(f, &self.range_group)?;
        write!(f, ")")
    }
}

/// A fully qualified node address: document key, subkey path, and (optionally)
/// the generation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubDocKey {
    doc_key: DocKey,
    subkeys: Vec<PrimitiveValue>,
    hybrid_time: Option<HybridTime>,
}

impl SubDocKey {
    pub fn new(doc_key: DocKey, subkeys: Vec<PrimitiveValue>, hybrid_time: HybridTime) -> Self {
        Self {
            doc_key,
            subkeys,
            hybrid_time: Some(hybrid_time),
        }
    }

    /// A timestamp-free key, usable as a scan prefix for the whole subtree.
    pub fn without_hybrid_time(doc_key: DocKey, subkeys: Vec<PrimitiveValue>) -> Self {
        Self {
            doc_key,
            subkeys,
            hybrid_time: None,
        }
    }

    #[inline]
    pub fn doc_key(&self) -> &DocKey {
        &self.doc_key
    }

    #[inline]
    pub fn subkeys(&self) -> &[PrimitiveValue] {
        &self.subkeys
    }

    #[inline]
    pub fn hybrid_time(&self) -> Option<HybridTime> {
        self.hybrid_time
    }

    /// Encodes the key; the timestamp section is present only when this key
    /// carries one.
    pub fn encode(&self) -> DocResult<KeyBytes> {
        let mut key = self.doc_key.encode()?;
        for subkey in &self.subkeys {
            key.append_primitive(subkey)?;
        }
        if let Some(ht) = self.hybrid_time {
            key.append_hybrid_time(ht);
        }
        Ok(key)
    }

    /// Decodes a complete stored key (timestamp included).
    pub fn decode(bytes: &[u8]) -> DocResult<SubDocKey> {
        let mut input = bytes;
        let doc_key = DocKey::decode_from(&mut input)?;
        let mut subkeys = Vec::new();
        loop {
            match input.first() {
                None => {
                    return Err(DocError::CorruptKey(
                        "subdocument key missing generation timestamp".into(),
                    ))
                }
                Some(&b) if b == ValueType::GroupEnd.as_byte() => {
                    input = &input[1..];
                    if input.len() != 8 {
                        return Err(DocError::CorruptKey(format!(
                            "expected 8 timestamp bytes, found {}",
                            input.len()
                        )));
                    }
                    let mut ts = [0u8; 8];
                    ts.copy_from_slice(input);
                    return Ok(SubDocKey::new(doc_key, subkeys, HybridTime::decode_desc(ts)));
                }
                Some(_) => subkeys.push(PrimitiveValue::decode_from_key(&mut input)?),
            }
        }
    }
}

impl fmt::Display for SubDocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubDocKey({}, ", self.doc_key)?;
        write!(f, "[")?;
        for (i, subkey) in self.subkeys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{subkey}")?;
        }
        match self.hybrid_time {
            Some(ht) => write!(f, "; {ht}])"),
            None => write!(f, "])"),
        }
    }
}

fn decode_group(input: &mut &[u8]) -> DocResult<Vec<PrimitiveValue>> {
    let mut group = Vec::new();
    loop {
        match input.first() {
            None => return Err(DocError::CorruptKey("unterminated key group".into())),
            Some(&b) if b == ValueType::GroupEnd.as_byte() => {
                *input = &input[1..];
                return Ok(group);
            }
            Some(_) => group.push(PrimitiveValue::decode_from_key(input)?),
        }
    }
}

fn expect_group_end(input: &mut &[u8]) -> DocResult<()> {
    match input.first() {
        Some(&b) if b == ValueType::GroupEnd.as_byte() => {
            *input = &input[1..];
            Ok(())
        }
        _ => Err(DocError::CorruptKey("expected group-end marker".into())),
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, group: &[PrimitiveValue]) -> fmt::Result {
    write!(f, "[")?;
    for (i, p) in group.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{p}")?;
    }
    write!(f, "]")
}
