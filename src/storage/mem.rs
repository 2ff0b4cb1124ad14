// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! In-memory store over an ordered map.
//!
//! Useful for tests and lightweight embedding; semantics match the RocksDB
//! backend (bytewise key order, last-write-wins batches).

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::error::StoreError;
use super::store::{Cursor, Store};

/// An ordered in-memory key/value store.
#[derive(Debug, Default)]
pub struct MemStore {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl Store for MemStore {
    fn cursor(&self) -> Result<Box<dyn Cursor + '_>, StoreError> {
        // A cursor reads a point-in-time snapshot of the map.
        let entries: Vec<_> = self
            .map
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(MemCursor { entries, pos: 0 }))
    }

    fn write(&self, batch: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StoreError> {
        let mut map = self.map.write();
        for (key, value) in batch {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

struct MemCursor {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
}

impl Cursor for MemCursor {
    fn seek(&mut self, target: &[u8]) -> Result<(), StoreError> {
        self.pos = self.entries.partition_point(|(k, _)| k.as_slice() < target);
        Ok(())
    }

    fn entry(&self) -> Option<(&[u8], &[u8])> {
        self.entries
            .get(self.pos)
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    fn next(&mut self) -> Result<(), StoreError> {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        Ok(())
    }
}
