// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Cursor over the store positioned at an encoded path prefix.

use crate::doc::{DocResult, KeyBytes, Value, ValueType};
use crate::storage::{Cursor, Store};
use crate::time::HybridTime;

/// A forward cursor that answers one question per seek: what is the newest
/// entry stored at exactly this path?
///
/// Owns its store cursor for the lifetime of a batch operation. Every
/// underlying seek is counted; tests use the counter to bound read
/// amplification.
pub struct InternalDocIterator<'a> {
    cursor: Box<dyn Cursor + 'a>,
    key_prefix: KeyBytes,
    found: Option<(ValueType, HybridTime)>,
    num_seeks: u64,
}

impl<'a> InternalDocIterator<'a> {
    pub fn new(store: &'a dyn Store) -> DocResult<Self> {
        Ok(Self {
            cursor: store.cursor()?,
            key_prefix: KeyBytes::new(),
            found: None,
            num_seeks: 0,
        })
    }

    /// Seeks to the newest entry whose path is exactly `prefix` and records
    /// its type and generation time, if any.
    pub fn seek_to_key_prefix(&mut self, prefix: &[u8]) -> DocResult<()> {
        self.key_prefix = KeyBytes::from_vec(prefix.to_vec());
        let mut target = self.key_prefix.clone();
        // kMax complements to all-zero bytes, so this lands on the newest
        // version at the path, or past the path entirely.
        target.append_hybrid_time(HybridTime::MAX);
        self.cursor.seek(target.as_slice())?;
        self.num_seeks += 1;
        self.found = self.classify()?;
        Ok(())
    }

    /// An entry at exactly the sought path has the shape
    /// `prefix ++ group-end ++ 8 timestamp bytes`; anything else belongs to a
    /// descendant or an unrelated key.
    fn classify(&self) -> DocResult<Option<(ValueType, HybridTime)>> {
        let Some((key, value)) = self.cursor.entry() else {
            return Ok(None);
        };
        let plen = self.key_prefix.len();
        if key.len() != plen + 9
            || !key.starts_with(self.key_prefix.as_slice())
            || key[plen] != ValueType::GroupEnd.as_byte()
        {
            return Ok(None);
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&key[plen + 1..]);
        let gen_ht = HybridTime::decode_desc(ts);
        let value_type = Value::decode_type(value)?;
        Ok(Some((value_type, gen_ht)))
    }

    /// Returns true if the last seek found an entry at the sought path.
    #[inline]
    pub fn key_matches_prefix(&self) -> bool {
        self.found.is_some()
    }

    /// Type of the newest entry at the sought path, or `None` when absent.
    #[inline]
    pub fn value_type(&self) -> Option<ValueType> {
        self.found.map(|(vt, _)| vt)
    }

    /// Generation time of the newest entry at the sought path.
    #[inline]
    pub fn generation_time(&self) -> Option<HybridTime> {
        self.found.map(|(_, ht)| ht)
    }

    #[inline]
    pub fn found(&self) -> Option<(ValueType, HybridTime)> {
        self.found
    }

    #[inline]
    pub fn key_prefix(&self) -> &[u8] {
        self.key_prefix.as_slice()
    }

    /// Number of store seeks performed so far.
    #[inline]
    pub fn num_seeks(&self) -> u64 {
        self.num_seeks
    }
}
