//! First-In-First-Out (FIFO) cache.
//!
//! Entries leave in the order they first arrived. Reads never reorder, and
//! overwriting a key keeps its original position, so the eviction order is
//! fixed the moment a key is admitted.
//!
//! ```text
//!   insert order: a, b, c            capacity = 3
//!
//!   head ─► [c] ◄──► [b] ◄──► [a] ◄── tail
//!           newest            oldest (next victim)
//!
//!   get(a)        → order unchanged
//!   insert(a, v') → value replaced, order unchanged
//!   insert(d, _)  → evicts a
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use stashkit::policy::fifo::FifoCache;
//! use stashkit::traits::EvictionStore;
//!
//! let mut cache = FifoCache::try_new(2).unwrap();
//! cache.insert(1, "one");
//! cache.insert(2, "two");
//! cache.get(&1);
//!
//! assert_eq!(cache.insert(3, "three"), Some((1, "one")));
//! assert_eq!(cache.keys(true), vec![2, 3]);
//! ```

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::{IntrusiveList, SlotId};
use crate::error::ConfigError;
use crate::traits::EvictionStore;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Insertion-ordered bounded cache.
pub struct FifoCache<K, V> {
    index: FxHashMap<K, SlotId>,
    // front = newest, back = oldest
    queue: IntrusiveList<Entry<K, V>>,
    capacity: usize,
}

impl<K, V> FifoCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a FIFO cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] when `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = ConfigError::require_positive("capacity", capacity)?;
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            queue: IntrusiveList::with_capacity(capacity),
            capacity,
        })
    }

    pub fn peek(&self, key: &K) -> Option<&V> {
        let &id = self.index.get(key)?;
        self.queue.get(id).map(|entry| &entry.value)
    }

    /// The entry that will be evicted next.
    pub fn peek_oldest(&self) -> Option<(&K, &V)> {
        self.queue.back().map(|entry| (&entry.key, &entry.value))
    }

    pub fn pop_oldest(&mut self) -> Option<(K, V)> {
        let entry = self.queue.pop_back()?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    /// Position of `key` counted from the oldest end (0 = next victim).
    pub fn age_rank(&self, key: &K) -> Option<usize> {
        self.index.get(key)?;
        self.queue.iter_rev().position(|entry| entry.key == *key)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.queue.debug_validate_invariants();
        assert_eq!(self.index.len(), self.queue.len());
        assert!(self.queue.len() <= self.capacity);
    }
}

impl<K, V> EvictionStore<K, V> for FifoCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.queue.get_mut(id) {
                entry.value = value;
            }
            return None;
        }

        let evicted = if self.queue.len() >= self.capacity {
            self.pop_oldest()
        } else {
            None
        };

        let id = self.queue.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        self.peek(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.queue.remove(id).map(|entry| entry.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn clear(&mut self) {
        self.index.clear();
        self.queue.clear();
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn keys(&self, oldest_first: bool) -> Vec<K> {
        if oldest_first {
            self.queue.iter_rev().map(|entry| entry.key.clone()).collect()
        } else {
            self.queue.iter().map(|entry| entry.key.clone()).collect()
        }
    }
}

impl<K, V> fmt::Debug for FifoCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoCache")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
