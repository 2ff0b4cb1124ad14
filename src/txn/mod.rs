// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transaction driver: lock planning, then batch application.
//!
//! A document transaction runs in two phases. [`prepare_doc_write_transaction`]
//! is pure: it derives the sorted, deduplicated list of (encoded path, mode)
//! locks the batch needs, promoting any path requested both shared and
//! exclusive. After the caller acquires those locks (and, when requested, a
//! read snapshot), [`apply_doc_write_transaction`] reads through the store,
//! drives the batch builder, and returns the serialized write batch. Locks
//! are released by the caller once the store confirms durability.

mod lock_manager;
mod operation;

pub use lock_manager::{LockMode, SharedLockManager};
pub use operation::{DocOperation, DocWriteOperation};

use std::collections::BTreeMap;

use crate::batch::DocWriteBatch;
use crate::doc::DocResult;
use crate::storage::Store;
use crate::time::HybridTime;

/// The lock requirements of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPlan {
    /// Sorted, deduplicated (encoded path, mode) pairs. Acquiring in this
    /// order across all transactions yields a global lock ordering.
    pub locks: Vec<(Vec<u8>, LockMode)>,
    /// True when any operation in the batch needs a clean read snapshot
    /// before being applied.
    pub need_read_snapshot: bool,
}

/// Derives the lock plan for a batch of operations. Pure: no store access.
///
/// Every target path contributes shared locks on its ancestors (document key
/// included) and its requested mode on the full path; overlapping requests
/// merge with exclusive winning.
pub fn prepare_doc_write_transaction(ops: &[Box<dyn DocOperation>]) -> DocResult<LockPlan> {
    let mut merged: BTreeMap<Vec<u8>, LockMode> = BTreeMap::new();
    let mut need_read_snapshot = false;

    for op in ops {
        need_read_snapshot |= op.needs_read_snapshot();
        for (path, mode) in op.doc_paths()? {
            let prefixes = path.lock_prefixes()?;
            let last = prefixes.len() - 1;
            for (i, prefix) in prefixes.into_iter().enumerate() {
                let requested = if i == last { mode } else { LockMode::Shared };
                merged
                    .entry(prefix.into_vec())
                    .and_modify(|m| *m = m.combine(requested))
                    .or_insert(requested);
            }
        }
    }

    Ok(LockPlan {
        locks: merged.into_iter().collect(),
        need_read_snapshot,
    })
}

/// Applies every operation at `hybrid_time` and returns the serialized write
/// batch, ready for [`Store::write`]. The caller must already hold the locks
/// from [`prepare_doc_write_transaction`].
pub fn apply_doc_write_transaction(
    ops: &[Box<dyn DocOperation>],
    hybrid_time: HybridTime,
    store: &dyn Store,
) -> DocResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut batch = DocWriteBatch::new(store);
    for op in ops {
        op.apply(&mut batch, hybrid_time)?;
    }
    tracing::debug!(
        entries = batch.len(),
        seeks = batch.seek_count(),
        %hybrid_time,
        "built document write batch"
    );
    Ok(batch.into_put_batch())
}

/// Convenience driver: plan, lock, apply, flush, unlock.
///
/// A failure at any step leaves the store unchanged; locks are always
/// released.
pub fn execute_doc_write_transaction(
    ops: &[Box<dyn DocOperation>],
    hybrid_time: HybridTime,
    store: &dyn Store,
    lock_manager: &SharedLockManager,
) -> DocResult<()> {
    let plan = prepare_doc_write_transaction(ops)?;
    lock_manager.lock_batch(&plan.locks);
    let result = apply_doc_write_transaction(ops, hybrid_time, store)
        .and_then(|batch| store.write(&batch).map_err(Into::into));
    lock_manager.unlock_batch(&plan.locks);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::InitMarkerBehavior;
    use crate::doc::{DocKey, DocPath, PrimitiveValue, SubDocKey, SubDocument, Ttl, Value};
    use crate::read::get_subdocument;
    use crate::storage::MemStore;

    fn path(doc: &str, subkeys: &[&str]) -> DocPath {
        DocPath::new(
            DocKey::new(vec![PrimitiveValue::from(doc)]),
            subkeys.iter().map(|s| PrimitiveValue::from(*s)).collect(),
        )
    }

    fn set_op(doc: &str, subkeys: &[&str], v: i64) -> Box<dyn DocOperation> {
        Box::new(DocWriteOperation::SetPrimitive {
            path: path(doc, subkeys),
            value: Value::from_primitive(PrimitiveValue::Int64(v)),
            init: InitMarkerBehavior::Required,
        })
    }

    fn insert_empty_object_op(doc: &str, subkeys: &[&str]) -> Box<dyn DocOperation> {
        Box::new(DocWriteOperation::InsertSubDocument {
            path: path(doc, subkeys),
            subdoc: SubDocument::object(),
            init: InitMarkerBehavior::Required,
            ttl: Ttl::MAX,
        })
    }

    fn encoded(doc: &str, subkeys: &[&str]) -> Vec<u8> {
        path(doc, subkeys).encode().unwrap().into_vec()
    }

    #[test]
    fn test_lock_plan_promotes_and_sorts() {
        // insert a.b = {}, set a.b.c, set a.b.d, set e.f: the a.b prefix is
        // requested shared (as an ancestor) and exclusive (as a target), and
        // must come out exclusive, with everything sorted bytewise.
        let ops = vec![
            insert_empty_object_op("a", &["b"]),
            set_op("a", &["b", "c"], 1),
            set_op("a", &["b", "d"], 2),
            set_op("e", &["f"], 3),
        ];
        let plan = prepare_doc_write_transaction(&ops).unwrap();

        let expected = vec![
            (encoded("a", &[]), LockMode::Shared),
            (encoded("a", &["b"]), LockMode::Exclusive),
            (encoded("a", &["b", "c"]), LockMode::Exclusive),
            (encoded("a", &["b", "d"]), LockMode::Exclusive),
            (encoded("e", &[]), LockMode::Shared),
            (encoded("e", &["f"]), LockMode::Exclusive),
        ];
        assert_eq!(plan.locks, expected);
        assert!(!plan.need_read_snapshot);
    }

    #[test]
    fn test_lock_plan_is_order_independent() {
        let forward = vec![set_op("a", &["b", "c"], 1), set_op("e", &["f"], 2)];
        let reversed = vec![set_op("e", &["f"], 2), set_op("a", &["b", "c"], 1)];
        assert_eq!(
            prepare_doc_write_transaction(&forward).unwrap(),
            prepare_doc_write_transaction(&reversed).unwrap()
        );
    }

    #[test]
    fn test_need_read_snapshot_flag() {
        struct ConditionalOp;
        impl DocOperation for ConditionalOp {
            fn doc_paths(&self) -> DocResult<Vec<(DocPath, LockMode)>> {
                Ok(vec![(
                    DocPath::new(DocKey::new(vec![PrimitiveValue::from("a")]), vec![]),
                    LockMode::Shared,
                )])
            }
            fn needs_read_snapshot(&self) -> bool {
                true
            }
            fn apply(
                &self,
                _batch: &mut DocWriteBatch<'_>,
                _hybrid_time: HybridTime,
            ) -> DocResult<()> {
                Ok(())
            }
        }

        let ops: Vec<Box<dyn DocOperation>> = vec![Box::new(ConditionalOp)];
        let plan = prepare_doc_write_transaction(&ops).unwrap();
        assert!(plan.need_read_snapshot);
        // A read target is locked shared, not exclusive.
        assert_eq!(plan.locks, vec![(encoded("a", &[]), LockMode::Shared)]);
    }

    #[test]
    fn test_apply_builds_batch_without_flushing() {
        let store = MemStore::new();
        let ops = vec![set_op("a", &["b"], 1)];
        let batch =
            apply_doc_write_transaction(&ops, HybridTime::from_micros(10), &store).unwrap();
        assert!(!batch.is_empty());
        // Nothing reached the store until the caller writes the batch.
        assert!(store.is_empty());
    }

    #[test]
    fn test_execute_end_to_end() {
        let store = MemStore::new();
        let lock_manager = SharedLockManager::new();
        let ops = vec![set_op("a", &["b", "c"], 7)];

        execute_doc_write_transaction(&ops, HybridTime::from_micros(10), &store, &lock_manager)
            .unwrap();
        assert_eq!(lock_manager.locked_key_count(), 0);

        let root = SubDocKey::without_hybrid_time(
            DocKey::new(vec![PrimitiveValue::from("a")]),
            vec![],
        );
        let doc = get_subdocument(&store, &root, HybridTime::from_micros(20), Ttl::MAX)
            .unwrap()
            .unwrap();
        let expected = SubDocument::object_from([(
            PrimitiveValue::from("b"),
            SubDocument::object_from([(
                PrimitiveValue::from("c"),
                PrimitiveValue::Int64(7).into(),
            )]),
        )]);
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_failed_apply_leaves_store_unchanged() {
        let store = MemStore::new();
        let lock_manager = SharedLockManager::new();
        // Writing at kMax is a bad argument; the transaction must fail
        // without flushing anything.
        let ops = vec![set_op("a", &["b"], 1)];
        let result = execute_doc_write_transaction(&ops, HybridTime::MAX, &store, &lock_manager);
        assert!(result.is_err());
        assert!(store.is_empty());
        assert_eq!(lock_manager.locked_key_count(), 0);
    }
}
