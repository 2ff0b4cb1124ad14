// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Construction of ordered key/value write batches from path-level mutations.
//!
//! A [`DocWriteBatch`] turns `set`/`extend`/`insert`/`delete` operations on
//! document paths into the encoded entries the store will apply atomically.
//! It reads from the store while writing (to classify existing nodes), and
//! appends entries in canonical flush order: ancestors before descendants,
//! tombstones before init markers at the same path, markers before deeper
//! sibling writes.

use std::collections::HashMap;

use crate::doc::{
    DocError, DocPath, DocResult, KeyBytes, PrimitiveValue, SubDocKey, SubDocument, Ttl, Value,
    ValueType,
};
use crate::storage::Store;
use crate::time::HybridTime;

use super::cache::{DocWriteBatchCache, NodeState};
use super::internal_doc_iterator::InternalDocIterator;

/// Whether intermediate object markers are written for missing ancestors.
///
/// `Required` guarantees an explicit `object` entry at every interior depth,
/// so readers need not reason about generation-time ordering. `Optional`
/// omits the markers; readers then derive object existence from live
/// descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMarkerBehavior {
    Required,
    Optional,
}

/// What a probe found at an interior path.
enum Probe {
    Absent,
    Tombstone,
    Object,
    Primitive,
}

/// Builds the write batch for one document transaction.
///
/// Owns its cache and put buffer exclusively; dropping the batch before it is
/// handed to the store leaves no visible side effects.
pub struct DocWriteBatch<'a> {
    store: &'a dyn Store,
    cache: DocWriteBatchCache,
    put_batch: Vec<(Vec<u8>, Vec<u8>)>,
    key_index: HashMap<Vec<u8>, usize>,
    num_seeks: u64,
}

impl<'a> DocWriteBatch<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            cache: DocWriteBatchCache::new(),
            put_batch: Vec::new(),
            key_index: HashMap::new(),
            num_seeks: 0,
        }
    }

    /// Sets the node at `path` to a primitive value (or tombstone), creating
    /// intermediate objects as dictated by `init`.
    pub fn set_primitive(
        &mut self,
        path: &DocPath,
        value: Value,
        hybrid_time: HybridTime,
        init: InitMarkerBehavior,
    ) -> DocResult<()> {
        tracing::trace!(%path, %value, %hybrid_time, "set_primitive");
        self.check_write_args(path, hybrid_time)?;

        let mut iter = InternalDocIterator::new(self.store)?;
        let result = self.set_primitive_internal(path, value, &mut iter, hybrid_time, init);
        self.num_seeks += iter.num_seeks();
        result
    }

    /// Merges `subdoc` into the subtree at `path`: leaves become primitive
    /// writes, object keys merge with existing ones, nothing is overwritten
    /// except leaves written explicitly.
    pub fn extend_subdocument(
        &mut self,
        path: &DocPath,
        subdoc: &SubDocument,
        hybrid_time: HybridTime,
        init: InitMarkerBehavior,
        ttl: Ttl,
    ) -> DocResult<()> {
        match subdoc {
            SubDocument::Object(map) => {
                for (subkey, child) in map {
                    self.extend_subdocument(
                        &path.child(subkey.clone()),
                        child,
                        hybrid_time,
                        init,
                        ttl,
                    )?;
                }
                Ok(())
            }
            SubDocument::Primitive(PrimitiveValue::Object)
            | SubDocument::Primitive(PrimitiveValue::Array)
            | SubDocument::Primitive(PrimitiveValue::Tombstone) => Err(DocError::BadArgument(
                "sentinel primitives cannot be written as leaves".into(),
            )),
            SubDocument::Primitive(p) => {
                self.set_primitive(path, Value::new(p.clone(), ttl), hybrid_time, init)
            }
            SubDocument::Array(_) => Err(DocError::BadArgument("arrays are reserved".into())),
        }
    }

    /// Replaces the subtree at `path` with `subdoc`: a tombstone buries the
    /// existing subtree, then the new content is written on top of it.
    pub fn insert_subdocument(
        &mut self,
        path: &DocPath,
        subdoc: &SubDocument,
        hybrid_time: HybridTime,
        init: InitMarkerBehavior,
        ttl: Ttl,
    ) -> DocResult<()> {
        if !subdoc.is_primitive() {
            self.set_primitive(path, Value::tombstone(), hybrid_time, init)?;
        }
        self.extend_subdocument(path, subdoc, hybrid_time, init, ttl)
    }

    /// Hides the subtree at `path` from snapshots at or after `hybrid_time`.
    pub fn delete_subdoc(
        &mut self,
        path: &DocPath,
        hybrid_time: HybridTime,
        init: InitMarkerBehavior,
    ) -> DocResult<()> {
        self.set_primitive(path, Value::tombstone(), hybrid_time, init)
    }

    fn check_write_args(&self, path: &DocPath, hybrid_time: HybridTime) -> DocResult<()> {
        if hybrid_time.is_max() {
            return Err(DocError::BadArgument(
                "writes require a concrete hybrid time".into(),
            ));
        }
        let doc_key = path.doc_key();
        if doc_key.range_group().is_empty() && doc_key.hashed_group().is_empty() {
            return Err(DocError::BadArgument("empty document key".into()));
        }
        Ok(())
    }

    fn set_primitive_internal(
        &mut self,
        path: &DocPath,
        value: Value,
        iter: &mut InternalDocIterator<'_>,
        hybrid_time: HybridTime,
        init: InitMarkerBehavior,
    ) -> DocResult<()> {
        let mut prefix = path.encoded_doc_key()?;

        // Walk the document root and each intermediate node, ensuring a live
        // container above the write. Under required markers, one missing
        // level proves every deeper level missing (children never exist
        // without their ancestors' markers), so probing stops there; without
        // markers every level must be probed.
        let mut known_missing = false;
        for subkey in path.subkeys() {
            if known_missing {
                self.push(&prefix, hybrid_time, &Value::object_marker())?;
            } else {
                match self.probe(iter, &prefix, hybrid_time)? {
                    Probe::Object => {}
                    Probe::Absent | Probe::Tombstone => {
                        if init == InitMarkerBehavior::Required {
                            self.push(&prefix, hybrid_time, &Value::object_marker())?;
                            known_missing = true;
                        }
                    }
                    Probe::Primitive => {
                        // Overwriting a primitive with an object: bury the old
                        // value, then lay down a fresh container.
                        self.push(&prefix, hybrid_time, &Value::tombstone())?;
                        if init == InitMarkerBehavior::Required {
                            self.push(&prefix, hybrid_time, &Value::object_marker())?;
                            known_missing = true;
                        }
                    }
                }
            }
            prefix.append_primitive(subkey)?;
        }

        self.push(&prefix, hybrid_time, &value)
    }

    /// Classifies the node at `prefix`, consulting the cache before the store.
    fn probe(
        &mut self,
        iter: &mut InternalDocIterator<'_>,
        prefix: &KeyBytes,
        observed_at: HybridTime,
    ) -> DocResult<Probe> {
        let state = match self.cache.get(prefix.as_slice()) {
            Some(entry) => entry.state,
            None => {
                iter.seek_to_key_prefix(prefix.as_slice())?;
                let state = match iter.found() {
                    None => NodeState::Absent,
                    Some((value_type, gen_ht)) => NodeState::Present { value_type, gen_ht },
                };
                self.cache
                    .put(prefix.as_slice().to_vec(), state, observed_at);
                state
            }
        };
        Ok(match state {
            NodeState::Absent => Probe::Absent,
            NodeState::Present { value_type, .. } => match value_type {
                ValueType::Object => Probe::Object,
                ValueType::Tombstone => Probe::Tombstone,
                _ => Probe::Primitive,
            },
        })
    }

    /// Appends one entry and records it in the cache and the duplicate index.
    ///
    /// Two writes at the same (path, time) with conflicting values are
    /// rejected; the single sanctioned pair is a tombstone followed by an
    /// object marker, which flushes in that order so the marker wins at the
    /// store.
    fn push(&mut self, prefix: &KeyBytes, hybrid_time: HybridTime, value: &Value) -> DocResult<()> {
        let mut key = prefix.clone();
        key.append_hybrid_time(hybrid_time);
        let key = key.into_vec();
        let encoded = value.encode();

        if let Some(&idx) = self.key_index.get(&key) {
            let existing = &self.put_batch[idx].1;
            if *existing == encoded {
                // Re-writing the identical value is a no-op.
                return Ok(());
            }
            let tombstone_then_marker = Value::decode_type(existing)? == ValueType::Tombstone
                && value.value_type() == ValueType::Object;
            if !tombstone_then_marker {
                return Err(DocError::InvariantViolation(format!(
                    "conflicting writes at {}",
                    describe_key(&key)
                )));
            }
        }

        self.cache.put(
            prefix.as_slice().to_vec(),
            NodeState::Present {
                value_type: value.value_type(),
                gen_ht: hybrid_time,
            },
            hybrid_time,
        );
        self.key_index.insert(key.clone(), self.put_batch.len());
        self.put_batch.push((key, encoded));
        Ok(())
    }

    /// The entries accumulated so far, in canonical flush order.
    #[inline]
    pub fn put_batch(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.put_batch
    }

    /// Consumes the batch, yielding the entries to hand to [`Store::write`].
    pub fn into_put_batch(self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.put_batch
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.put_batch.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.put_batch.len()
    }

    /// Discards all accumulated entries and cached probes.
    pub fn clear(&mut self) {
        self.put_batch.clear();
        self.key_index.clear();
        self.cache.clear();
        self.num_seeks = 0;
    }

    /// Number of store seeks performed on behalf of this batch.
    #[inline]
    pub fn seek_count(&self) -> u64 {
        self.num_seeks
    }

    /// Reads and resets the seek counter.
    pub fn get_and_reset_seek_count(&mut self) -> u64 {
        std::mem::take(&mut self.num_seeks)
    }

    /// One line per entry, decoded, in flush order.
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        for (i, (key, value)) in self.put_batch.iter().enumerate() {
            let decoded_value = Value::decode(value)
                .map(|v| v.to_string())
                .unwrap_or_else(|_| "<undecodable>".into());
            let _ = writeln!(out, "{}. {} -> {}", i + 1, describe_key(key), decoded_value);
        }
        out
    }
}

fn describe_key(key: &[u8]) -> String {
    SubDocKey::decode(key)
        .map(|k| k.to_string())
        .unwrap_or_else(|_| "<undecodable key>".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::DocKey;
    use crate::storage::MemStore;

    fn ht(micros: u64) -> HybridTime {
        HybridTime::from_micros(micros)
    }

    fn path(doc: &str, subkeys: &[&str]) -> DocPath {
        DocPath::new(
            DocKey::new(vec![PrimitiveValue::from(doc)]),
            subkeys.iter().map(|s| PrimitiveValue::from(*s)).collect(),
        )
    }

    fn int(v: i64) -> Value {
        Value::from_primitive(PrimitiveValue::Int64(v))
    }

    /// Decodes the batch into (path string, time, value string) triples.
    fn decoded(batch: &DocWriteBatch<'_>) -> Vec<(String, u64, String)> {
        batch
            .put_batch()
            .iter()
            .map(|(key, value)| {
                let k = SubDocKey::decode(key).unwrap();
                let path: Vec<String> =
                    k.subkeys().iter().map(|s| s.to_string()).collect();
                (
                    path.join("."),
                    k.hybrid_time().unwrap().as_micros(),
                    Value::decode(value).unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_set_leaf_creates_ancestors() {
        // Writing a.b.c = 7 at t=10 must also establish containers for the
        // document root and the intermediate object.
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(
                &path("a", &["b", "c"]),
                int(7),
                ht(10),
                InitMarkerBehavior::Required,
            )
            .unwrap();

        assert_eq!(
            decoded(&batch),
            vec![
                ("".into(), 10, "{}".into()),
                ("\"b\"".into(), 10, "{}".into()),
                ("\"b\".\"c\"".into(), 10, "7".into()),
            ]
        );
        // One probe of the absent document root is enough.
        assert_eq!(batch.seek_count(), 1);
    }

    #[test]
    fn test_optional_init_skips_markers() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(
                &path("a", &["b", "c"]),
                int(7),
                ht(10),
                InitMarkerBehavior::Optional,
            )
            .unwrap();

        assert_eq!(decoded(&batch), vec![("\"b\".\"c\"".into(), 10, "7".into())]);
    }

    #[test]
    fn test_overwrite_primitive_with_object() {
        // a.b = "x" at t=5, then a.b.c = 1 at t=10: the second write buries
        // the primitive with a tombstone and lays down a fresh container.
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(
                &path("a", &["b"]),
                Value::from_primitive(PrimitiveValue::from("x")),
                ht(5),
                InitMarkerBehavior::Required,
            )
            .unwrap();
        store.write(batch.put_batch()).unwrap();

        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(
                &path("a", &["b", "c"]),
                int(1),
                ht(10),
                InitMarkerBehavior::Required,
            )
            .unwrap();

        assert_eq!(
            decoded(&batch),
            vec![
                ("\"b\"".into(), 10, "DEL".into()),
                ("\"b\"".into(), 10, "{}".into()),
                ("\"b\".\"c\"".into(), 10, "1".into()),
            ]
        );
        // Probed the root and the intermediate node.
        assert_eq!(batch.seek_count(), 2);
    }

    #[test]
    fn test_cache_avoids_repeat_seeks() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(
                &path("a", &["b", "c"]),
                int(1),
                ht(10),
                InitMarkerBehavior::Required,
            )
            .unwrap();
        let after_first = batch.seek_count();

        // A sibling write in the same batch reuses every cached ancestor.
        batch
            .set_primitive(
                &path("a", &["b", "d"]),
                int(2),
                ht(10),
                InitMarkerBehavior::Required,
            )
            .unwrap();
        assert_eq!(batch.seek_count(), after_first);
    }

    #[test]
    fn test_batch_sees_its_own_writes() {
        // The second operation must observe the container created by the
        // first, not re-create it.
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(
                &path("a", &["b"]),
                int(1),
                ht(10),
                InitMarkerBehavior::Required,
            )
            .unwrap();
        let len_after_first = batch.len();
        batch
            .set_primitive(
                &path("a", &["c"]),
                int(2),
                ht(10),
                InitMarkerBehavior::Required,
            )
            .unwrap();
        // Only the new leaf was appended; the root marker was deduplicated.
        assert_eq!(batch.len(), len_after_first + 1);
    }

    #[test]
    fn test_conflicting_writes_rejected() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(&path("a", &["b"]), int(1), ht(10), InitMarkerBehavior::Required)
            .unwrap();
        let result = batch.set_primitive(
            &path("a", &["b"]),
            int(2),
            ht(10),
            InitMarkerBehavior::Required,
        );
        assert!(matches!(result, Err(DocError::InvariantViolation(_))));
    }

    #[test]
    fn test_idempotent_delete() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .delete_subdoc(&path("a", &["b"]), ht(10), InitMarkerBehavior::Optional)
            .unwrap();
        let snapshot = decoded(&batch);
        batch
            .delete_subdoc(&path("a", &["b"]), ht(10), InitMarkerBehavior::Optional)
            .unwrap();
        assert_eq!(decoded(&batch), snapshot);
    }

    #[test]
    fn test_extend_merges_without_tombstone() {
        let store = MemStore::new();
        let subdoc = SubDocument::object_from([
            (PrimitiveValue::from("x"), PrimitiveValue::Int64(1).into()),
            (PrimitiveValue::from("y"), PrimitiveValue::Int64(2).into()),
        ]);
        let mut batch = DocWriteBatch::new(&store);
        batch
            .extend_subdocument(
                &path("a", &["b"]),
                &subdoc,
                ht(10),
                InitMarkerBehavior::Optional,
                Ttl::MAX,
            )
            .unwrap();

        let entries = decoded(&batch);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|(_, _, v)| v != "DEL"));
    }

    #[test]
    fn test_insert_replaces_with_tombstone_first() {
        let store = MemStore::new();
        let subdoc = SubDocument::object_from([(
            PrimitiveValue::from("x"),
            PrimitiveValue::Int64(1).into(),
        )]);
        let mut batch = DocWriteBatch::new(&store);
        batch
            .insert_subdocument(
                &path("a", &["b"]),
                &subdoc,
                ht(10),
                InitMarkerBehavior::Optional,
                Ttl::MAX,
            )
            .unwrap();

        let entries = decoded(&batch);
        assert_eq!(entries[0], ("\"b\"".into(), 10, "DEL".into()));
        assert_eq!(entries[1], ("\"b\".\"x\"".into(), 10, "1".into()));
    }

    #[test]
    fn test_ttl_carried_to_leaves() {
        let store = MemStore::new();
        let subdoc = SubDocument::Primitive(PrimitiveValue::Int64(5));
        let mut batch = DocWriteBatch::new(&store);
        batch
            .extend_subdocument(
                &path("a", &[]),
                &subdoc,
                ht(10),
                InitMarkerBehavior::Optional,
                Ttl::from_millis(30),
            )
            .unwrap();
        let (_, value) = &batch.put_batch()[0];
        assert_eq!(Value::decode(value).unwrap().ttl(), Ttl::from_millis(30));
    }

    #[test]
    fn test_write_at_max_time_rejected() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        let result = batch.set_primitive(
            &path("a", &[]),
            int(1),
            HybridTime::MAX,
            InitMarkerBehavior::Required,
        );
        assert!(matches!(result, Err(DocError::BadArgument(_))));
    }

    #[test]
    fn test_empty_doc_key_rejected() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        let result = batch.set_primitive(
            &DocPath::root(DocKey::new(vec![])),
            int(1),
            ht(10),
            InitMarkerBehavior::Required,
        );
        assert!(matches!(result, Err(DocError::BadArgument(_))));
    }

    #[test]
    fn test_clear() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(&path("a", &["b"]), int(1), ht(10), InitMarkerBehavior::Required)
            .unwrap();
        assert!(!batch.is_empty());
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.seek_count(), 0);
    }

    #[test]
    fn test_to_debug_string() {
        let store = MemStore::new();
        let mut batch = DocWriteBatch::new(&store);
        batch
            .set_primitive(&path("a", &["b"]), int(1), ht(10), InitMarkerBehavior::Required)
            .unwrap();
        let dump = batch.to_debug_string();
        assert!(dump.contains("SubDocKey(DocKey([], [\"a\"]), [; HT(10)]) -> {}"));
        assert!(dump.contains("[\"b\"; HT(10)]) -> 1"));
    }
}
