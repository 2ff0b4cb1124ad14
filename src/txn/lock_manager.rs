// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Shared/exclusive lock manager over encoded path prefixes.
//!
//! Acquisition order is the caller's responsibility: feeding every
//! transaction the sorted, deduplicated key list produced by the lock planner
//! gives a global lock ordering, which is what makes blocking acquisition
//! deadlock-free.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use parking_lot::{Condvar, Mutex};

const NUM_SHARDS: usize = 64;

/// Lock modes for read/write access to a path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Multiple holders allowed; taken on ancestors and read targets.
    Shared,
    /// Single holder; taken on write targets.
    Exclusive,
}

impl LockMode {
    /// Merges two requested modes on the same key: exclusive wins.
    #[inline]
    pub fn combine(self, other: LockMode) -> LockMode {
        if self == LockMode::Exclusive || other == LockMode::Exclusive {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        }
    }
}

#[derive(Debug, Default)]
struct LockState {
    shared: usize,
    exclusive: bool,
}

#[derive(Default)]
struct Shard {
    locks: Mutex<HashMap<Vec<u8>, LockState>>,
    available: Condvar,
}

/// Blocking per-key lock table, sharded to reduce contention.
pub struct SharedLockManager {
    shards: [Shard; NUM_SHARDS],
}

impl SharedLockManager {
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| Shard::default()),
        }
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % NUM_SHARDS]
    }

    /// Acquires every lock in the given order, blocking as needed.
    ///
    /// The slice must be sorted and deduplicated (one mode per key); the
    /// planner guarantees both.
    pub fn lock_batch(&self, locks: &[(Vec<u8>, LockMode)]) {
        for (key, mode) in locks {
            self.lock(key, *mode);
        }
    }

    /// Releases locks previously taken with [`SharedLockManager::lock_batch`].
    pub fn unlock_batch(&self, locks: &[(Vec<u8>, LockMode)]) {
        for (key, mode) in locks.iter().rev() {
            self.unlock(key, *mode);
        }
    }

    fn lock(&self, key: &[u8], mode: LockMode) {
        let shard = self.shard(key);
        let mut locks = shard.locks.lock();
        loop {
            let state = locks.entry(key.to_vec()).or_default();
            let compatible = match mode {
                LockMode::Shared => !state.exclusive,
                LockMode::Exclusive => !state.exclusive && state.shared == 0,
            };
            if compatible {
                match mode {
                    LockMode::Shared => state.shared += 1,
                    LockMode::Exclusive => state.exclusive = true,
                }
                return;
            }
            shard.available.wait(&mut locks);
        }
    }

    fn unlock(&self, key: &[u8], mode: LockMode) {
        let shard = self.shard(key);
        let mut locks = shard.locks.lock();
        if let Some(state) = locks.get_mut(key) {
            match mode {
                LockMode::Shared => state.shared = state.shared.saturating_sub(1),
                LockMode::Exclusive => state.exclusive = false,
            }
            if state.shared == 0 && !state.exclusive {
                locks.remove(key);
            }
        }
        drop(locks);
        shard.available.notify_all();
    }

    /// Returns the number of keys currently locked (test helper).
    pub fn locked_key_count(&self) -> usize {
        self.shards.iter().map(|s| s.locks.lock().len()).sum()
    }
}

impl Default for SharedLockManager {
    fn default() -> Self {
        Self::new()
    }
}
