// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Embedded store abstraction and backends.
//!
//! The document layer only needs two things from its store: ordered forward
//! seeks and atomic batch writes ([`Store`], [`Cursor`]). [`RocksStore`] is
//! the production backend; [`MemStore`] is an ordered in-memory map with the
//! same semantics.

mod debug;
mod error;
mod mem;
mod rocks;
mod store;

pub use debug::{debug_dump, debug_dump_to_string};
pub use error::StoreError;
pub use mem::MemStore;
pub use rocks::RocksStore;
pub use store::{CompactionStyle, Cursor, DurabilityMode, Store, StoreOptions};
