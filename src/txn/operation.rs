// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Document operations: the unit of work the query layer hands to the
//! transaction driver.

use crate::batch::{DocWriteBatch, InitMarkerBehavior};
use crate::doc::{DocPath, DocResult, SubDocument, Ttl, Value};
use crate::time::HybridTime;

use super::lock_manager::LockMode;

/// One operation in a document transaction.
///
/// Implementations report the paths they touch (with the lock mode needed on
/// each full path; ancestors are implicitly locked shared), whether they need
/// a consistent read snapshot, and how to apply themselves to a write batch.
pub trait DocOperation: Send + Sync {
    /// Target paths with the lock mode required on the full path.
    fn doc_paths(&self) -> DocResult<Vec<(DocPath, LockMode)>>;

    /// True when the operation must read at a clean snapshot before applying
    /// (conditional writes, read-modify-write).
    fn needs_read_snapshot(&self) -> bool;

    /// Applies the operation at `hybrid_time`, reading through the batch's
    /// store as needed.
    fn apply(&self, batch: &mut DocWriteBatch<'_>, hybrid_time: HybridTime) -> DocResult<()>;
}

/// The built-in path-level write operations.
#[derive(Debug, Clone)]
pub enum DocWriteOperation {
    SetPrimitive {
        path: DocPath,
        value: Value,
        init: InitMarkerBehavior,
    },
    ExtendSubDocument {
        path: DocPath,
        subdoc: SubDocument,
        init: InitMarkerBehavior,
        ttl: Ttl,
    },
    InsertSubDocument {
        path: DocPath,
        subdoc: SubDocument,
        init: InitMarkerBehavior,
        ttl: Ttl,
    },
    DeleteSubDoc {
        path: DocPath,
        init: InitMarkerBehavior,
    },
}

impl DocWriteOperation {
    fn path(&self) -> &DocPath {
        match self {
            DocWriteOperation::SetPrimitive { path, .. }
            | DocWriteOperation::ExtendSubDocument { path, .. }
            | DocWriteOperation::InsertSubDocument { path, .. }
            | DocWriteOperation::DeleteSubDoc { path, .. } => path,
        }
    }
}

impl DocOperation for DocWriteOperation {
    fn doc_paths(&self) -> DocResult<Vec<(DocPath, LockMode)>> {
        Ok(vec![(self.path().clone(), LockMode::Exclusive)])
    }

    fn needs_read_snapshot(&self) -> bool {
        false
    }

    fn apply(&self, batch: &mut DocWriteBatch<'_>, hybrid_time: HybridTime) -> DocResult<()> {
        match self {
            DocWriteOperation::SetPrimitive { path, value, init } => {
                batch.set_primitive(path, value.clone(), hybrid_time, *init)
            }
            DocWriteOperation::ExtendSubDocument {
                path,
                subdoc,
                init,
                ttl,
            } => batch.extend_subdocument(path, subdoc, hybrid_time, *init, *ttl),
            DocWriteOperation::InsertSubDocument {
                path,
                subdoc,
                init,
                ttl,
            } => batch.insert_subdocument(path, subdoc, hybrid_time, *init, *ttl),
            DocWriteOperation::DeleteSubDoc { path, init } => {
                batch.delete_subdoc(path, hybrid_time, *init)
            }
        }
    }
}
