// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Subtree reconstruction: range scans projected back into document trees.
//!
//! [`scan_subdocument`] walks the keyspace under a root path at a snapshot
//! time and streams the live subtree through a [`DocVisitor`];
//! [`get_subdocument`] binds that scan to a building visitor and returns the
//! materialized [`SubDocument`].
//!
//! The reader works with or without init markers: a node is an object either
//! because an explicit `object` entry is live at its path, or because some
//! descendant write at or after the node's overwrite floor is live. Visitor
//! events for implicit containers are buffered and emitted only once a live
//! descendant proves the container exists.

mod visitor;

pub use visitor::{DocVisitor, SubDocumentBuildingVisitor};

use crate::doc::{
    DocError, DocResult, KeyBytes, PrimitiveValue, SubDocKey, SubDocument, Ttl, Value, ValueType,
};
use crate::storage::{Cursor, Store};
use crate::time::HybridTime;

/// Streams the live subtree under `root` at `snapshot` into `visitor`.
///
/// The root's own hybrid time, if any, is ignored; the snapshot parameter
/// alone decides visibility.
pub fn scan_subdocument(
    store: &dyn Store,
    root: &SubDocKey,
    visitor: &mut dyn DocVisitor,
    snapshot: HybridTime,
) -> DocResult<()> {
    scan_impl(store, root, visitor, snapshot, Ttl::MAX).map(|_| ())
}

/// Materializes the subtree under `root` at `snapshot`, or `None` when no
/// live node exists there. `table_ttl` applies to values without a TTL of
/// their own.
pub fn get_subdocument(
    store: &dyn Store,
    root: &SubDocKey,
    snapshot: HybridTime,
    table_ttl: Ttl,
) -> DocResult<Option<SubDocument>> {
    let mut visitor = SubDocumentBuildingVisitor::new();
    let found = scan_impl(store, root, &mut visitor, snapshot, table_ttl)?;
    if !found {
        return Ok(None);
    }
    visitor
        .into_result()
        .map(Some)
        .ok_or_else(|| DocError::InvariantViolation("scan found a subtree but built none".into()))
}

fn scan_impl(
    store: &dyn Store,
    root: &SubDocKey,
    visitor: &mut dyn DocVisitor,
    snapshot: HybridTime,
    table_ttl: Ttl,
) -> DocResult<bool> {
    let prefix =
        SubDocKey::without_hybrid_time(root.doc_key().clone(), root.subkeys().to_vec()).encode()?;

    let mut scanner = SubtreeScanner {
        cursor: store.cursor()?,
        visitor,
        snapshot,
        table_ttl,
        pending: Vec::new(),
    };
    scanner.visitor.start_sub_document(root)?;
    let found = scanner.scan_node(&prefix, HybridTime::MIN)?;
    debug_assert!(scanner.pending.is_empty());
    scanner.visitor.end_sub_document()?;
    Ok(found)
}

/// Visitor events held back until a live descendant proves their container
/// exists.
enum PendingEvent {
    StartObject,
    Key(PrimitiveValue),
}

struct SubtreeScanner<'a> {
    cursor: Box<dyn Cursor + 'a>,
    visitor: &'a mut dyn DocVisitor,
    snapshot: HybridTime,
    table_ttl: Ttl,
    pending: Vec<PendingEvent>,
}

impl SubtreeScanner<'_> {
    /// Scans the node at `prefix`. `floor` is the overwrite floor inherited
    /// from ancestors: entries older than it are hidden. Returns true if the
    /// node produced any visitor output.
    fn scan_node(&mut self, prefix: &KeyBytes, floor: HybridTime) -> DocResult<bool> {
        // One seek finds the newest version at this exact path <= snapshot,
        // because times are stored in descending order.
        let mut target = prefix.clone();
        target.append_hybrid_time(self.snapshot);
        self.cursor.seek(target.as_slice())?;

        let winner = self.winner_at(prefix)?;
        let mut child_floor = floor;

        if let Some((value, gen_ht)) = winner {
            // Whatever was written here overwrote the subtree: even a dead
            // entry hides descendants older than itself.
            child_floor = child_floor.max(gen_ht);

            let live = gen_ht >= floor
                && !value.is_tombstone()
                && !value.expired_at(gen_ht, self.snapshot, self.table_ttl);
            if live {
                match value.primitive() {
                    PrimitiveValue::Object => {
                        self.flush_pending()?;
                        self.visitor.start_object()?;
                        self.scan_children(prefix, child_floor)?;
                        self.visitor.end_object()?;
                        return Ok(true);
                    }
                    PrimitiveValue::Array => {
                        return Err(DocError::CorruptValue(
                            "array values are reserved".into(),
                        ));
                    }
                    primitive => {
                        let primitive = primitive.clone();
                        self.flush_pending()?;
                        self.visitor.visit_value(&primitive)?;
                        return Ok(true);
                    }
                }
            }
        }

        // No live entry at the path itself. The node may still exist as an
        // object through live descendants written without init markers.
        let mark = self.pending.len();
        self.pending.push(PendingEvent::StartObject);
        let any = self.scan_children(prefix, child_floor)?;
        if any {
            self.visitor.end_object()?;
        } else {
            self.pending.truncate(mark);
        }
        Ok(any)
    }

    /// Enumerates the children of `prefix` in key order, scanning each.
    /// Returns true if any child emitted output.
    fn scan_children(&mut self, prefix: &KeyBytes, floor: HybridTime) -> DocResult<bool> {
        // Skip the node's own version entries: their group-end byte sorts
        // below every subkey tag.
        let mut probe = prefix.clone();
        probe.append_raw(&[ValueType::GroupEnd.as_byte() + 1]);
        self.cursor.seek(probe.as_slice())?;

        let mut any = false;
        loop {
            let subkey = {
                let Some((key, _)) = self.cursor.entry() else {
                    break;
                };
                if !key.starts_with(prefix.as_slice()) {
                    break;
                }
                let mut rest = &key[prefix.len()..];
                PrimitiveValue::decode_from_key(&mut rest)?
            };
            let mut child_prefix = prefix.clone();
            child_prefix.append_primitive(&subkey)?;

            let mark = self.pending.len();
            self.pending.push(PendingEvent::Key(subkey));
            if self.scan_node(&child_prefix, floor)? {
                any = true;
            } else {
                self.pending.truncate(mark);
            }

            // Advance past the child's subtree unless the recursion already
            // left it behind.
            let inside_child = match self.cursor.entry() {
                Some((key, _)) => key.starts_with(child_prefix.as_slice()),
                None => false,
            };
            if inside_child {
                let successor = child_prefix.prefix_successor();
                if successor.is_empty() {
                    break;
                }
                self.cursor.seek(successor.as_slice())?;
            }
        }
        Ok(any)
    }

    /// Decodes the current entry if it sits exactly at `prefix`.
    fn winner_at(&self, prefix: &KeyBytes) -> DocResult<Option<(Value, HybridTime)>> {
        let Some((key, value)) = self.cursor.entry() else {
            return Ok(None);
        };
        let plen = prefix.len();
        if key.len() != plen + 9
            || !key.starts_with(prefix.as_slice())
            || key[plen] != ValueType::GroupEnd.as_byte()
        {
            return Ok(None);
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&key[plen + 1..]);
        let gen_ht = HybridTime::decode_desc(ts);
        let value = Value::decode(value)?;
        Ok(Some((value, gen_ht)))
    }

    fn flush_pending(&mut self) -> DocResult<()> {
        for event in std::mem::take(&mut self.pending) {
            match event {
                PendingEvent::StartObject => self.visitor.start_object()?,
                PendingEvent::Key(key) => self.visitor.visit_key(&key)?,
            }
        }
        Ok(())
    }
}
