// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Hybrid time: the logical clock domain of the MVCC document store.
//!
//! Every write is stamped with a [`HybridTime`]; reads execute at a snapshot
//! hybrid time. The timestamps themselves are assigned by an external oracle
//! (the tablet MVCC manager); [`HybridClock`] is a self-contained monotonic
//! source for embedded use and tests.

mod clock;
mod hybrid_time;

pub use clock::HybridClock;
pub use hybrid_time::HybridTime;
