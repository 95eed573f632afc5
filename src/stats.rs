//! Cache hit/miss and removal counters.

use serde::Serialize;

/// Counters maintained by [`ExpiringStore`](crate::expire::ExpiringStore).
///
/// Every lookup counts as exactly one hit or one miss. A read that finds an
/// entry past its deadline counts as a miss and as an expiration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value.
    pub hits: u64,
    /// Lookups that found nothing (absent or expired).
    pub misses: u64,
    /// Insert calls, new keys and updates alike.
    pub inserts: u64,
    /// Entries dropped to make room for a new key.
    pub evictions: u64,
    /// Entries dropped because their deadline passed.
    pub expirations: u64,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}
