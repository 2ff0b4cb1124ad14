// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Document-layer error types.

use crate::storage::StoreError;
use crate::time::HybridTime;

/// Errors that can occur while encoding, decoding, or applying document
/// operations.
///
/// Corruption and invariant violations are never recovered from silently: the
/// batch or scan that hit them is abandoned and the error is returned to the
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("corrupt key: {0}")]
    CorruptKey(String),

    #[error("corrupt value: {0}")]
    CorruptValue(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("snapshot not available at {0}")]
    SnapshotNotAvailable(HybridTime),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout the document layer.
pub type DocResult<T> = Result<T, DocError>;
