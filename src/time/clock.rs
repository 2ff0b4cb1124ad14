// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Monotonic hybrid-time source.
//!
//! Stands in for the tablet MVCC manager when the document layer is used on
//! its own. Combines wall-clock microseconds with a compare-and-swap loop so
//! that every call returns a strictly larger [`HybridTime`], even under
//! concurrent access.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::HybridTime;

/// Monotonic hybrid-time generator.
///
/// Guarantees that each call to `now()` returns a timestamp strictly greater
/// than all previous calls on the same clock.
#[derive(Debug, Default)]
pub struct HybridClock {
    last_micros: AtomicU64,
}

impl HybridClock {
    /// Creates a clock starting from the current wall-clock time.
    pub fn new() -> Self {
        Self::default()
    }

    fn physical_micros() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }

    /// Returns a hybrid time strictly greater than any previously returned.
    pub fn now(&self) -> HybridTime {
        loop {
            let physical = Self::physical_micros();
            let last = self.last_micros.load(Ordering::Acquire);
            let next = physical.max(last.saturating_add(1));

            match self.last_micros.compare_exchange(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return HybridTime::from_micros(next),
                Err(_) => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_increasing() {
        let clock = HybridClock::new();
        let mut last = clock.now();
        for _ in 0..1000 {
            let current = clock.now();
            assert!(current > last, "clock must be strictly monotonic");
            last = current;
        }
    }

    #[test]
    fn test_concurrent_monotonic() {
        use std::sync::Arc;
        use std::thread;

        let clock = Arc::new(HybridClock::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                thread::spawn(move || {
                    let mut last = clock.now();
                    for _ in 0..1000 {
                        let current = clock.now();
                        assert!(current > last, "per-thread monotonicity");
                        last = current;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread panicked");
        }
    }

    #[test]
    fn test_never_returns_max() {
        let clock = HybridClock::new();
        assert!(!clock.now().is_max());
    }
}
