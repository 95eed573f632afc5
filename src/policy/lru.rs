//! # Least Recently Used (LRU) Cache
//!
//! Evicts the entry that has gone longest without being read or written.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                            LruCache<K, V>                                │
//!   │                                                                          │
//!   │   ┌──────────────────────────────────────────────────────────────────┐   │
//!   │   │  index: FxHashMap<K, SlotId>                                     │   │
//!   │   │                                                                  │   │
//!   │   │  ┌─────────┬──────────────────────────────────────────────┐      │   │
//!   │   │  │   Key   │  SlotId                                      │      │   │
//!   │   │  ├─────────┼──────────────────────────────────────────────┤      │   │
//!   │   │  │ user:7  │  ──────────────────────────────────────────┐ │      │   │
//!   │   │  │ user:3  │  ────────────────────────────────────┐     │ │      │   │
//!   │   │  │ user:9  │  ──────────────────────────────┐     │     │ │      │   │
//!   │   │  └─────────┴────────────────────────────────┼─────┼─────┼─┘      │   │
//!   │   └─────────────────────────────────────────────┼─────┼─────┼────────┘   │
//!   │                                                 │     │     │            │
//!   │   ┌─────────────────────────────────────────────┼─────┼─────┼────────┐   │
//!   │   │  order: IntrusiveList<Entry<K, V>>          ▼     ▼     ▼        │   │
//!   │   │                                                                  │   │
//!   │   │  head ──► ┌───────┐ ◄──► ┌───────┐ ◄──► ┌───────┐ ◄── tail       │   │
//!   │   │   (MRU)   │ key,v │      │ key,v │      │ key,v │   (LRU)        │   │
//!   │   │           └───────┘      └───────┘      └───────┘                │   │
//!   │   └──────────────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation      | Effect on order                       | Complexity |
//! |----------------|---------------------------------------|------------|
//! | `insert` (new) | push at head, evict tail if over cap  | O(1)       |
//! | `insert` (upd) | replace value, move to head           | O(1)       |
//! | `get`          | move to head on hit                   | O(1)       |
//! | `peek`         | none                                  | O(1)       |
//! | `touch`        | move to head                          | O(1)       |
//! | `pop_lru`      | remove tail                           | O(1)       |
//! | `recency_rank` | none                                  | O(n)       |
//!
//! ## Example Usage
//!
//! ```
//! use stashkit::policy::lru::LruCache;
//! use stashkit::traits::EvictionStore;
//!
//! let mut cache = LruCache::try_new(2).unwrap();
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.get(&"a");
//!
//! // "b" is now least recently used
//! assert_eq!(cache.insert("c", 3), Some(("b", 2)));
//! assert_eq!(cache.peek_lru(), Some((&"a", &1)));
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

/// Recency-ordered bounded cache.
pub struct LruCache<K, V> {
    index: FxHashMap<K, SlotId>,
    order: IntrusiveList<Entry<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an LRU cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] when `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = ConfigError::require_positive("capacity", capacity)?;
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: IntrusiveList::with_capacity(capacity),
            capacity,
        })
    }

    /// Reads `key` without promoting it.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let &id = self.index.get(key)?;
        self.order.get(id).map(|entry| &entry.value)
    }

    /// Least recently used entry, without promoting it.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.order.back().map(|entry| (&entry.key, &entry.value))
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let entry = self.order.pop_back()?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    /// Marks `key` as most recently used. Returns `false` if absent.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&id) => self.order.move_to_front(id),
            None => false,
        }
    }

    /// Position of `key` counted from the most recent end (0 = MRU).
    pub fn recency_rank(&self, key: &K) -> Option<usize> {
        self.index.get(key)?;
        self.order.iter().position(|entry| entry.key == *key)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.order.debug_validate_invariants();
        assert_eq!(self.index.len(), self.order.len());
        assert!(self.order.len() <= self.capacity);
        for (key, &id) in &self.index {
            let entry = self.order.get(id).expect("indexed slot missing");
            assert!(entry.key == *key);
        }
    }
}

impl<K, V> EvictionStore<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.order.get_mut(id) {
                entry.value = value;
            }
            self.order.move_to_front(id);
            return None;
        }

        let evicted = if self.order.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let id = self.order.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let &id = self.index.get(key)?;
        self.order.move_to_front(id);
        self.order.get(id).map(|entry| &entry.value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.order.remove(id).map(|entry| entry.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn keys(&self, oldest_first: bool) -> Vec<K> {
        if oldest_first {
            self.order.iter_rev().map(|entry| entry.key.clone()).collect()
        } else {
            self.order.iter().map(|entry| entry.key.clone()).collect()
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<K, V> Extend<(K, V)> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
