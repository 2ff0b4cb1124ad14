// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Hybrid timestamps used for multi-versioning.

use std::fmt;

/// A 64-bit logical timestamp ordering all writes in the document store.
///
/// The raw value counts microseconds since the Unix epoch; a logical
/// sub-microsecond component is reserved for a future extension. Larger is
/// newer. Inside encoded keys the timestamp is stored bitwise-complemented so
/// that a forward seek lands on the newest version first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HybridTime(u64);

impl HybridTime {
    /// The "latest possible" sentinel. Reads at `MAX` see every committed
    /// version; writes must never be assigned it.
    pub const MAX: HybridTime = HybridTime(u64::MAX);

    /// The earliest representable time.
    pub const MIN: HybridTime = HybridTime(0);

    /// Creates a hybrid time from microseconds since the Unix epoch.
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Returns the raw microsecond value.
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Returns true if this is the `MAX` sentinel.
    #[inline]
    pub const fn is_max(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Adds a wall-clock millisecond duration, saturating at `MAX`.
    ///
    /// This is the single conversion point between the hybrid-time domain and
    /// wall-clock TTL durations: a value written at `t` with TTL `d` expires
    /// at `t.add_millis(d)`.
    #[inline]
    pub fn add_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis.saturating_mul(1000)))
    }

    /// Encodes into key form: bitwise complement, big-endian, so larger times
    /// sort first under the bytewise comparator.
    #[inline]
    pub fn encode_desc(&self) -> [u8; 8] {
        (!self.0).to_be_bytes()
    }

    /// Decodes the key form produced by [`HybridTime::encode_desc`].
    #[inline]
    pub fn decode_desc(bytes: [u8; 8]) -> Self {
        Self(!u64::from_be_bytes(bytes))
    }
}

impl fmt::Debug for HybridTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            write!(f, "HT(max)")
        } else {
            write!(f, "HT({})", self.0)
        }
    }
}

impl fmt::Display for HybridTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(HybridTime::from_micros(100) < HybridTime::from_micros(200));
        assert!(HybridTime::from_micros(200) < HybridTime::MAX);
        assert!(HybridTime::MIN < HybridTime::from_micros(1));
    }

    #[test]
    fn test_encode_desc_inverts_order() {
        let older = HybridTime::from_micros(100).encode_desc();
        let newer = HybridTime::from_micros(200).encode_desc();
        // Newer times must sort first (smaller in byte order).
        assert!(newer < older);
        assert!(HybridTime::MAX.encode_desc() < newer);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        for t in [0, 1, 100, u64::MAX / 2, u64::MAX] {
            let ht = HybridTime::from_micros(t);
            assert_eq!(HybridTime::decode_desc(ht.encode_desc()), ht);
        }
    }

    #[test]
    fn test_add_millis() {
        let ht = HybridTime::from_micros(1_000);
        assert_eq!(ht.add_millis(10), HybridTime::from_micros(11_000));
        assert_eq!(HybridTime::MAX.add_millis(1), HybridTime::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(HybridTime::from_micros(42).to_string(), "HT(42)");
        assert_eq!(HybridTime::MAX.to_string(), "HT(max)");
    }
}
