// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Mutable buffer for building encoded document keys.

use crate::time::HybridTime;

use super::error::DocResult;
use super::primitive::PrimitiveValue;
use super::value_type::ValueType;

/// An encoded key (or key prefix) under construction.
///
/// Builders grow and truncate one buffer as they walk a document path instead
/// of re-encoding from scratch at every level.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyBytes(Vec<u8>);

impl KeyBytes {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    #[inline]
    pub fn append_raw(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    #[inline]
    pub fn append_value_type(&mut self, vt: ValueType) {
        self.0.push(vt.as_byte());
    }

    #[inline]
    pub fn append_group_end(&mut self) {
        self.append_value_type(ValueType::GroupEnd);
    }

    /// Appends the key encoding of one primitive path component.
    #[inline]
    pub fn append_primitive(&mut self, p: &PrimitiveValue) -> DocResult<()> {
        p.append_to_key(&mut self.0)
    }

    /// Appends a generation timestamp: a group-end marker followed by the
    /// descending-order encoding of `ht`. The marker keeps entries for a path
    /// sorted before entries for any of its descendants.
    pub fn append_hybrid_time(&mut self, ht: HybridTime) {
        self.append_group_end();
        self.0.extend_from_slice(&ht.encode_desc());
    }

    #[inline]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Returns the smallest key strictly greater than every key having this
    /// one as a prefix, or an empty key if no such bound exists (all `0xff`).
    pub fn prefix_successor(&self) -> KeyBytes {
        let mut bytes = self.0.clone();
        while bytes.last() == Some(&0xff) {
            bytes.pop();
        }
        if let Some(last) = bytes.last_mut() {
            *last += 1;
        }
        KeyBytes(bytes)
    }
}

impl AsRef<[u8]> for KeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
