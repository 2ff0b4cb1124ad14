// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! RocksDB-backed store.

use std::path::Path;

use rocksdb::{
    BlockBasedOptions, DBCompactionStyle, DBRawIteratorWithThreadMode, DBWithThreadMode,
    MultiThreaded, Options, WriteBatch, WriteOptions,
};

use super::error::StoreError;
use super::store::{CompactionStyle, Cursor, DurabilityMode, Store, StoreOptions};

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB store configured for the document keyspace.
pub struct RocksStore {
    db: Db,
    write_opts: WriteOptions,
}

impl RocksStore {
    /// Opens or creates a database at the given path with default options.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Opens or creates a database with explicit tuning options.
    pub fn open_with_options(path: &Path, options: StoreOptions) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compaction_style(match options.compaction_style {
            CompactionStyle::Level => DBCompactionStyle::Level,
            CompactionStyle::Universal => DBCompactionStyle::Universal,
        });

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_block_size(options.block_size);
        block_opts.set_bloom_filter(options.bloom_filter_bits_per_key, false);
        opts.set_block_based_table_factory(&block_opts);

        let db = Db::open(&opts, path)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(options.durability == DurabilityMode::FsyncEveryWrite);

        tracing::debug!(path = %path.display(), ?options, "opened document store");

        Ok(Self { db, write_opts })
    }

    /// Forces a flush of memtables to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl Store for RocksStore {
    fn cursor(&self) -> Result<Box<dyn Cursor + '_>, StoreError> {
        Ok(Box::new(RocksCursor {
            inner: self.db.raw_iterator(),
        }))
    }

    fn write(&self, batch: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StoreError> {
        let mut wb = WriteBatch::default();
        for (key, value) in batch {
            wb.put(key, value);
        }
        self.db.write_opt(wb, &self.write_opts)?;
        Ok(())
    }
}

struct RocksCursor<'a> {
    inner: DBRawIteratorWithThreadMode<'a, Db>,
}

impl RocksCursor<'_> {
    fn check_status(&self) -> Result<(), StoreError> {
        if self.inner.valid() {
            return Ok(());
        }
        // An invalid iterator is either exhausted (fine) or failed.
        self.inner.status().map_err(StoreError::from)
    }
}

impl Cursor for RocksCursor<'_> {
    fn seek(&mut self, target: &[u8]) -> Result<(), StoreError> {
        self.inner.seek(target);
        self.check_status()
    }

    fn entry(&self) -> Option<(&[u8], &[u8])> {
        self.inner.item()
    }

    fn next(&mut self) -> Result<(), StoreError> {
        self.inner.next();
        self.check_status()
    }
}
