// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The abstract ordered key/value store the document layer runs on.

use super::error::StoreError;

/// A forward cursor over the store's bytewise-ordered keyspace.
///
/// Cursors are owned by a single batch or scan and must not be shared across
/// threads.
pub trait Cursor {
    /// Positions the cursor at the first entry with key `>= target`.
    fn seek(&mut self, target: &[u8]) -> Result<(), StoreError>;

    /// Returns the current entry, or `None` when the cursor is exhausted.
    fn entry(&self) -> Option<(&[u8], &[u8])>;

    /// Advances to the next entry.
    fn next(&mut self) -> Result<(), StoreError>;
}

/// An embedded store: ordered seeks plus atomic batch writes.
///
/// Keys and values are opaque byte strings; the comparator must be plain
/// bytewise ordering (the document key encoding is order-preserving by
/// construction, so no custom comparator is needed).
pub trait Store: Send + Sync {
    /// Opens a new cursor over the current state of the store.
    fn cursor(&self) -> Result<Box<dyn Cursor + '_>, StoreError>;

    /// Atomically applies a batch of puts, in order. Later entries for the
    /// same key win.
    fn write(&self, batch: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StoreError>;
}

/// Durability mode for write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Writes are synced to the WAL but not fsynced to disk.
    /// Durable against process crashes but not power failures.
    #[default]
    WalOnly,
    /// Writes are fsynced to disk on every batch.
    FsyncEveryWrite,
}

/// LSM compaction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompactionStyle {
    #[default]
    Level,
    Universal,
}

/// Store tuning knobs, passed explicitly at open time.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// SSTable block size in bytes.
    pub block_size: usize,
    pub compaction_style: CompactionStyle,
    /// Bloom filter density for point lookups.
    pub bloom_filter_bits_per_key: f64,
    pub durability: DurabilityMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            block_size: 32 * 1024,
            compaction_style: CompactionStyle::default(),
            bloom_filter_bits_per_key: 10.0,
            durability: DurabilityMode::default(),
        }
    }
}
