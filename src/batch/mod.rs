// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Write-batch construction for document mutations.
//!
//! [`DocWriteBatch`] is the mutation entry point: it turns path-level
//! operations into ordered, encoded key/value entries while maintaining the
//! structural invariants of the keyspace (init markers, tombstones,
//! generation times). [`InternalDocIterator`] answers its point probes;
//! [`DocWriteBatchCache`] memoizes them for the life of the batch.

mod cache;
mod internal_doc_iterator;
mod write_batch;

pub use cache::{CacheEntry, DocWriteBatchCache, NodeState};
pub use internal_doc_iterator::InternalDocIterator;
pub use write_batch::{DocWriteBatch, InitMarkerBehavior};
