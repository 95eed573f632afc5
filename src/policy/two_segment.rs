//! Two-segment cache: FIFO probation in front of an LRU protected area.
//!
//! New keys land in a FIFO probation segment. A key that is read while on
//! probation has proven it is wanted more than once and moves into the
//! protected LRU segment. One-off keys (scans, bulk loads) churn through
//! probation without disturbing the protected working set.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        TwoSegmentCache<K, V>                                │
//! │                                                                             │
//! │   PROBATION (FifoCache)                     PROTECTED (LruCache)            │
//! │   ┌─────────────────────────────┐           ┌─────────────────────────────┐ │
//! │   │ newest               oldest │  get hit  │ MRU                     LRU │ │
//! │   │  [k5] ◄──► [k4] ◄──► [k3]  ─┼──────────►│  [k3] ◄──► [k1] ◄──► [k2]   │ │
//! │   │                        evict│ promote   │                        evict│ │
//! │   └─────────────────────────────┘           └─────────────────────────────┘ │
//! │          ▲                                          ▲                       │
//! │   insert(new key)                        insert(key already protected)      │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - `insert` of a new key targets probation and may evict probation's oldest.
//! - `insert` of a key already protected updates it in place there.
//! - `get` hitting probation removes the entry and inserts it into protected,
//!   which may evict protected's least recent entry.
//! - A key is never present in both segments.
//!
//! ## Example Usage
//!
//! ```
//! use stashkit::policy::two_segment::{Segment, TwoSegmentCache};
//! use stashkit::traits::EvictionStore;
//!
//! let mut cache = TwoSegmentCache::try_new(2, 2).unwrap();
//! cache.insert("a", 1);
//! assert_eq!(cache.segment_of(&"a"), Some(Segment::Probation));
//!
//! cache.get(&"a");
//! assert_eq!(cache.segment_of(&"a"), Some(Segment::Protected));
//! assert_eq!(cache.capacity(), 4);
//! ```

use std::hash::Hash;

use crate::error::ConfigError;
use crate::policy::fifo::FifoCache;
use crate::policy::lru::LruCache;
use crate::traits::EvictionStore;

/// Which segment of a [`TwoSegmentCache`] holds a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Probation,
    Protected,
}

/// FIFO probation segment feeding an LRU protected segment.
#[derive(Debug)]
pub struct TwoSegmentCache<K, V> {
    probation: FifoCache<K, V>,
    protected: LruCache<K, V>,
}

impl<K, V> TwoSegmentCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a two-segment cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] naming whichever segment size is
    /// zero.
    pub fn try_new(probation_capacity: usize, protected_capacity: usize) -> Result<Self, ConfigError> {
        ConfigError::require_positive("capacity", probation_capacity)?;
        ConfigError::require_positive("protected_capacity", protected_capacity)?;
        Ok(Self {
            probation: FifoCache::try_new(probation_capacity)?,
            protected: LruCache::try_new(protected_capacity)?,
        })
    }

    pub fn segment_of(&self, key: &K) -> Option<Segment> {
        if self.probation.contains(key) {
            Some(Segment::Probation)
        } else if self.protected.contains(key) {
            Some(Segment::Protected)
        } else {
            None
        }
    }

    pub fn probation_keys(&self, oldest_first: bool) -> Vec<K> {
        self.probation.keys(oldest_first)
    }

    pub fn protected_keys(&self, oldest_first: bool) -> Vec<K> {
        self.protected.keys(oldest_first)
    }

    pub fn probation_len(&self) -> usize {
        self.probation.len()
    }

    pub fn protected_len(&self) -> usize {
        self.protected.len()
    }

    /// Reads `key` from either segment without promoting it.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.probation.peek(key).or_else(|| self.protected.peek(key))
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.probation.debug_validate_invariants();
        self.protected.debug_validate_invariants();
        for key in self.probation.keys(true) {
            assert!(!self.protected.contains(&key), "key present in both segments");
        }
    }
}

impl<K, V> EvictionStore<K, V> for TwoSegmentCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.protected.contains(&key) {
            return self.protected.insert(key, value);
        }
        self.probation.insert(key, value)
    }

    // A promotion can evict from protected; that victim is dropped here and
    // is not observable through `get`.
    fn get(&mut self, key: &K) -> Option<&V> {
        if let Some(value) = self.probation.remove(key) {
            self.protected.insert(key.clone(), value);
        }
        self.protected.get(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.probation
            .remove(key)
            .or_else(|| self.protected.remove(key))
    }

    fn contains(&self, key: &K) -> bool {
        self.probation.contains(key) || self.protected.contains(key)
    }

    fn clear(&mut self) {
        self.probation.clear();
        self.protected.clear();
    }

    fn len(&self) -> usize {
        self.probation.len() + self.protected.len()
    }

    fn capacity(&self) -> usize {
        self.probation.capacity() + self.protected.capacity()
    }

    fn keys(&self, oldest_first: bool) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        if oldest_first {
            keys.extend(self.probation.keys(true));
            keys.extend(self.protected.keys(true));
        } else {
            keys.extend(self.protected.keys(false));
            keys.extend(self.probation.keys(false));
        }
        keys
    }
}
