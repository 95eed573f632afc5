//! # LFU (Least Frequently Used) Cache
//!
//! Evicts the entry with the fewest recorded accesses. Frequencies live in an
//! [`IndexedMinHeap`], so every access re-heapifies exactly one entry.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                            LfuCache<K, V>                                │
//!   │                                                                          │
//!   │   ┌───────────────────────────────┐   ┌──────────────────────────────┐   │
//!   │   │ values: FxHashMap<K, V>       │   │ freq: IndexedMinHeap<K, u64> │   │
//!   │   │                               │   │                              │   │
//!   │   │  page_1 → ...                 │   │        (page_3, 1)  ← victim │   │
//!   │   │  page_2 → ...                 │   │        /          \          │   │
//!   │   │  page_3 → ...                 │   │  (page_2, 3)  (page_1, 15)   │   │
//!   │   └───────────────────────────────┘   └──────────────────────────────┘   │
//!   │                                                                          │
//!   │   capacity: usize                                                        │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction Flow
//!
//! ```text
//!   insert(key, value)
//!        │
//!        ▼
//!   key present? ── YES ──► replace value, frequency += 1
//!        │
//!        NO
//!        ▼
//!   len == capacity? ── YES ──► pop minimum-frequency entry (the victim)
//!        │
//!        ▼
//!   store value, frequency = 1
//! ```
//!
//! The victim is chosen before the new key is admitted, so a fresh key with
//! frequency 1 is never evicted by its own insertion. Among equal frequencies
//! the longest-resident entry goes first; callers should not rely on that.
//!
//! ## Example Usage
//!
//! ```
//! use stashkit::policy::lfu::LfuCache;
//! use stashkit::traits::EvictionStore;
//!
//! let mut cache = LfuCache::try_new(2).unwrap();
//! cache.insert("hot", 1);
//! cache.insert("cold", 2);
//! cache.get(&"hot");
//! cache.get(&"hot");
//!
//! assert_eq!(cache.insert("new", 3), Some(("cold", 2)));
//! assert_eq!(cache.frequency(&"hot"), Some(3));
//! assert_eq!(cache.frequency(&"new"), Some(1));
//! ```

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::IndexedMinHeap;
use crate::error::ConfigError;
use crate::traits::EvictionStore;

/// Frequency-ordered bounded cache.
pub struct LfuCache<K, V> {
    values: FxHashMap<K, V>,
    freq: IndexedMinHeap<K, u64>,
    capacity: usize,
}

impl<K, V> LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an LFU cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] when `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = ConfigError::require_positive("capacity", capacity)?;
        Ok(Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            freq: IndexedMinHeap::with_capacity(capacity),
            capacity,
        })
    }

    /// Recorded access count for `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.freq.score_of(key).copied()
    }

    /// Bumps `key`'s frequency without reading it.
    pub fn increment_frequency(&mut self, key: &K) -> Option<u64> {
        self.freq
            .modify(key, |f| *f = f.saturating_add(1))
            .copied()
    }

    /// Resets `key` to frequency 1, returning the old count.
    pub fn reset_frequency(&mut self, key: &K) -> Option<u64> {
        if !self.freq.contains(key) {
            return None;
        }
        self.freq.update(key.clone(), 1)
    }

    pub fn peek(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// The entry that would be evicted next.
    pub fn peek_lfu(&self) -> Option<(&K, &V)> {
        let (key, _) = self.freq.peek_best()?;
        self.values.get_key_value(key)
    }

    pub fn pop_lfu(&mut self) -> Option<(K, V)> {
        let (key, _) = self.freq.pop_best()?;
        let value = self.values.remove(&key)?;
        Some((key, value))
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.freq.debug_validate_invariants();
        assert_eq!(self.values.len(), self.freq.len());
        assert!(self.values.len() <= self.capacity);
        for key in self.values.keys() {
            assert!(self.freq.contains(key));
        }
    }
}

impl<K, V> EvictionStore<K, V> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(slot) = self.values.get_mut(&key) {
            *slot = value;
            self.increment_frequency(&key);
            return None;
        }

        let evicted = if self.values.len() >= self.capacity {
            self.pop_lfu()
        } else {
            None
        };

        self.freq.update(key.clone(), 1);
        self.values.insert(key, value);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if !self.values.contains_key(key) {
            return None;
        }
        self.increment_frequency(key);
        self.values.get(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.values.remove(key)?;
        self.freq.remove(key);
        Some(value)
    }

    fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    fn clear(&mut self) {
        self.values.clear();
        self.freq.clear();
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn keys(&self, oldest_first: bool) -> Vec<K> {
        let mut keys = self.freq.sorted_keys();
        if !oldest_first {
            keys.reverse();
        }
        keys
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("len", &self.values.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
