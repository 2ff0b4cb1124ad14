// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! StrataDB: a document-over-KV storage layer.
//!
//! Projects hierarchical, MVCC-versioned documents onto the flat ordered
//! key/value interface of an embedded LSM store. Path-level mutations become
//! ordered sequences of encoded writes; subtree reads become short forward
//! range scans reconstructed through a visitor.
//!
//! # Layout of a document
//!
//! Every node of a document gets its own store entries, keyed by the encoded
//! path and the generation hybrid time of the write, newest first:
//!
//! ```text
//! SubDocKey(DocKey([], ["users"]), [; HT(30)])           -> {}
//! SubDocKey(DocKey([], ["users"]), ["name"; HT(30)])     -> "alice"
//! SubDocKey(DocKey([], ["users"]), ["role"; HT(30)])     -> "admin"
//! ```
//!
//! Deletes write tombstones, overwrites write fresh init markers, and reads
//! at a snapshot reconstruct the tree that was live at that time.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use stratadb::batch::{DocWriteBatch, InitMarkerBehavior};
//! use stratadb::doc::{DocKey, DocPath, PrimitiveValue, SubDocKey, Ttl, Value};
//! use stratadb::read::get_subdocument;
//! use stratadb::storage::{RocksStore, Store};
//! use stratadb::time::HybridClock;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RocksStore::open(Path::new("/tmp/docdb"))?;
//! let clock = HybridClock::new();
//!
//! // Write users.name = "alice".
//! let path = DocPath::new(
//!     DocKey::new(vec![PrimitiveValue::from("users")]),
//!     vec![PrimitiveValue::from("name")],
//! );
//! let mut batch = DocWriteBatch::new(&store);
//! batch.set_primitive(
//!     &path,
//!     Value::from_primitive(PrimitiveValue::from("alice")),
//!     clock.now(),
//!     InitMarkerBehavior::Required,
//! )?;
//! store.write(batch.put_batch())?;
//!
//! // Read the whole document back at the latest snapshot.
//! let root = SubDocKey::without_hybrid_time(
//!     DocKey::new(vec![PrimitiveValue::from("users")]),
//!     vec![],
//! );
//! let doc = get_subdocument(&store, &root, clock.now(), Ttl::MAX)?;
//! println!("{doc:?}");
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod doc;
pub mod read;
pub mod storage;
pub mod time;
pub mod txn;

pub use batch::{DocWriteBatch, InitMarkerBehavior, InternalDocIterator};
pub use doc::{
    DocError, DocKey, DocPath, DocResult, KeyBytes, PrimitiveValue, SubDocKey, SubDocument, Ttl,
    Value, ValueType,
};
pub use read::{get_subdocument, scan_subdocument, DocVisitor, SubDocumentBuildingVisitor};
pub use storage::{
    debug_dump, debug_dump_to_string, CompactionStyle, Cursor, DurabilityMode, MemStore,
    RocksStore, Store, StoreError, StoreOptions,
};
pub use time::{HybridClock, HybridTime};
pub use txn::{
    apply_doc_write_transaction, execute_doc_write_transaction, prepare_doc_write_transaction,
    DocOperation, DocWriteOperation, LockMode, LockPlan, SharedLockManager,
};
