//! Unified cache builder for all eviction policies.
//!
//! Picks an eviction policy at runtime and hides the concrete type behind
//! [`PolicyStore`], which dispatches to the chosen policy through an enum.
//!
//! ## Example
//!
//! ```rust
//! use stashkit::builder::{CacheBuilder, CachePolicy};
//! use stashkit::traits::EvictionStore;
//!
//! let mut cache = CacheBuilder::new(100)
//!     .try_build::<u64, String>(CachePolicy::Lru)
//!     .unwrap();
//! cache.insert(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some(&"hello".to_string()));
//! ```

use std::fmt;
use std::hash::Hash;

use crate::config::PolicyKind;
use crate::error::ConfigError;
use crate::policy::fifo::FifoCache;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::two_segment::TwoSegmentCache;
use crate::traits::EvictionStore;

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// First In, First Out eviction.
    Fifo,
    /// Least Recently Used eviction.
    Lru,
    /// Least Frequently Used eviction.
    Lfu,
    /// FIFO probation segment (sized by the builder capacity) feeding an LRU
    /// protected segment of `protected_capacity` entries.
    TwoSegment { protected_capacity: usize },
}

impl CachePolicy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            CachePolicy::Fifo => PolicyKind::Fifo,
            CachePolicy::Lru => PolicyKind::Lru,
            CachePolicy::Lfu => PolicyKind::Lfu,
            CachePolicy::TwoSegment { .. } => PolicyKind::TwoSegment,
        }
    }
}

/// Eviction store whose policy was chosen at runtime.
pub struct PolicyStore<K, V> {
    inner: StoreInner<K, V>,
}

enum StoreInner<K, V> {
    Fifo(FifoCache<K, V>),
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
    TwoSegment(TwoSegmentCache<K, V>),
}

impl<K, V> PolicyStore<K, V> {
    /// The policy this store was built with.
    pub fn kind(&self) -> PolicyKind {
        match &self.inner {
            StoreInner::Fifo(_) => PolicyKind::Fifo,
            StoreInner::Lru(_) => PolicyKind::Lru,
            StoreInner::Lfu(_) => PolicyKind::Lfu,
            StoreInner::TwoSegment(_) => PolicyKind::TwoSegment,
        }
    }
}

impl<K, V> EvictionStore<K, V> for PolicyStore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        match &mut self.inner {
            StoreInner::Fifo(fifo) => fifo.insert(key, value),
            StoreInner::Lru(lru) => lru.insert(key, value),
            StoreInner::Lfu(lfu) => lfu.insert(key, value),
            StoreInner::TwoSegment(two) => two.insert(key, value),
        }
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        match &mut self.inner {
            StoreInner::Fifo(fifo) => fifo.get(key),
            StoreInner::Lru(lru) => lru.get(key),
            StoreInner::Lfu(lfu) => lfu.get(key),
            StoreInner::TwoSegment(two) => two.get(key),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        match &mut self.inner {
            StoreInner::Fifo(fifo) => fifo.remove(key),
            StoreInner::Lru(lru) => lru.remove(key),
            StoreInner::Lfu(lfu) => lfu.remove(key),
            StoreInner::TwoSegment(two) => two.remove(key),
        }
    }

    fn contains(&self, key: &K) -> bool {
        match &self.inner {
            StoreInner::Fifo(fifo) => fifo.contains(key),
            StoreInner::Lru(lru) => lru.contains(key),
            StoreInner::Lfu(lfu) => lfu.contains(key),
            StoreInner::TwoSegment(two) => two.contains(key),
        }
    }

    fn clear(&mut self) {
        match &mut self.inner {
            StoreInner::Fifo(fifo) => fifo.clear(),
            StoreInner::Lru(lru) => lru.clear(),
            StoreInner::Lfu(lfu) => lfu.clear(),
            StoreInner::TwoSegment(two) => two.clear(),
        }
    }

    fn len(&self) -> usize {
        match &self.inner {
            StoreInner::Fifo(fifo) => fifo.len(),
            StoreInner::Lru(lru) => lru.len(),
            StoreInner::Lfu(lfu) => lfu.len(),
            StoreInner::TwoSegment(two) => two.len(),
        }
    }

    fn capacity(&self) -> usize {
        match &self.inner {
            StoreInner::Fifo(fifo) => fifo.capacity(),
            StoreInner::Lru(lru) => lru.capacity(),
            StoreInner::Lfu(lfu) => lfu.capacity(),
            StoreInner::TwoSegment(two) => two.capacity(),
        }
    }

    fn keys(&self, oldest_first: bool) -> Vec<K> {
        match &self.inner {
            StoreInner::Fifo(fifo) => fifo.keys(oldest_first),
            StoreInner::Lru(lru) => lru.keys(oldest_first),
            StoreInner::Lfu(lfu) => lfu.keys(oldest_first),
            StoreInner::TwoSegment(two) => two.keys(oldest_first),
        }
    }
}

impl<K, V> fmt::Debug for PolicyStore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyStore")
            .field("policy", &self.kind())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    ///
    /// For [`CachePolicy::TwoSegment`] this is the probation segment size.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Build a cache with the specified policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] when any capacity is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stashkit::builder::{CacheBuilder, CachePolicy};
    /// use stashkit::traits::EvictionStore;
    ///
    /// let fifo = CacheBuilder::new(100).try_build::<u64, String>(CachePolicy::Fifo).unwrap();
    /// assert_eq!(fifo.capacity(), 100);
    ///
    /// let two = CacheBuilder::new(25)
    ///     .try_build::<u64, String>(CachePolicy::TwoSegment { protected_capacity: 75 })
    ///     .unwrap();
    /// assert_eq!(two.capacity(), 100);
    ///
    /// assert!(CacheBuilder::new(0).try_build::<u64, String>(CachePolicy::Lru).is_err());
    /// ```
    pub fn try_build<K, V>(self, policy: CachePolicy) -> Result<PolicyStore<K, V>, ConfigError>
    where
        K: Clone + Eq + Hash,
    {
        let inner = match policy {
            CachePolicy::Fifo => StoreInner::Fifo(FifoCache::try_new(self.capacity)?),
            CachePolicy::Lru => StoreInner::Lru(LruCache::try_new(self.capacity)?),
            CachePolicy::Lfu => StoreInner::Lfu(LfuCache::try_new(self.capacity)?),
            CachePolicy::TwoSegment { protected_capacity } => StoreInner::TwoSegment(
                TwoSegmentCache::try_new(self.capacity, protected_capacity)?,
            ),
        };

        Ok(PolicyStore { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_policies_basic_ops() {
        let policies = [
            CachePolicy::Fifo,
            CachePolicy::Lru,
            CachePolicy::Lfu,
            CachePolicy::TwoSegment {
                protected_capacity: 10,
            },
        ];

        for policy in policies {
            let mut cache = CacheBuilder::new(10)
                .try_build::<u64, String>(policy)
                .unwrap();
            assert_eq!(cache.kind(), policy.kind());

            // Insert
            assert_eq!(cache.insert(1, "one".to_string()), None);
            assert_eq!(cache.insert(2, "two".to_string()), None);

            // Get
            assert_eq!(cache.get(&1), Some(&"one".to_string()));
            assert_eq!(cache.get(&2), Some(&"two".to_string()));
            assert_eq!(cache.get(&3), None);

            // Contains
            assert!(cache.contains(&1));
            assert!(!cache.contains(&99));

            // Len
            assert_eq!(cache.len(), 2);
            assert!(!cache.is_empty());

            // Update
            assert_eq!(cache.insert(1, "ONE".to_string()), None);
            assert_eq!(cache.get(&1), Some(&"ONE".to_string()));

            // Remove
            assert_eq!(cache.remove(&2), Some("two".to_string()));
            assert_eq!(cache.keys(true), vec![1]);

            // Clear
            cache.clear();
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_capacity_enforcement() {
        let mut cache = CacheBuilder::new(2)
            .try_build::<u64, String>(CachePolicy::Lru)
            .unwrap();

        cache.insert(1, "one".to_string());
        cache.insert(2, "two".to_string());
        let evicted = cache.insert(3, "three".to_string());

        assert_eq!(evicted, Some((1, "one".to_string())));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_zero_capacity_rejected_for_every_policy() {
        for policy in [CachePolicy::Fifo, CachePolicy::Lru, CachePolicy::Lfu] {
            let err = CacheBuilder::new(0).try_build::<u8, u8>(policy).unwrap_err();
            assert_eq!(err, ConfigError::ZeroCapacity { field: "capacity" });
        }

        let err = CacheBuilder::new(4)
            .try_build::<u8, u8>(CachePolicy::TwoSegment {
                protected_capacity: 0,
            })
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroCapacity {
                field: "protected_capacity"
            }
        );
    }
}
