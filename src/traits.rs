//! # Eviction Store Trait
//!
//! This module defines [`EvictionStore`], the capability set shared by every
//! bounded cache in the crate. Each eviction policy implements it directly, and
//! the expiration layer implements it again on top of any inner store, so
//! code written against the trait works unchanged on a plain LRU, a
//! two-segment cache, or an expiring wrapper around either.
//!
//! ## Architecture
//!
//! ```text
//!                      ┌────────────────────────────────────────────┐
//!                      │           EvictionStore<K, V>              │
//!                      │                                            │
//!                      │  insert(&mut, K, V) → Option<(K, V)>       │
//!                      │  get(&mut, &K) → Option<&V>                │
//!                      │  remove(&mut, &K) → Option<V>              │
//!                      │  contains(&, &K) → bool                    │
//!                      │  clear(&mut)                               │
//!                      │  len(&) / is_empty(&) / capacity(&)        │
//!                      │  keys(&, oldest_first) → Vec<K>            │
//!                      └─────────────────────┬──────────────────────┘
//!                                            │
//!      ┌───────────────┬───────────────┬─────┴─────────┬──────────────────────┐
//!      ▼               ▼               ▼               ▼                      ▼
//!  LruCache        FifoCache       LfuCache     TwoSegmentCache      ExpiringStore<S>
//!  (recency)       (insertion)     (frequency)  (FIFO probation +    (wraps any S, adds
//!                                               LRU protected)       idle/live timeouts)
//! ```
//!
//! ## Ordering Convention for `keys`
//!
//! | Policy       | `keys(true)` starts with        | `keys(false)` starts with      |
//! |--------------|---------------------------------|--------------------------------|
//! | LRU          | least recently used             | most recently used             |
//! | FIFO         | first inserted                  | last inserted                  |
//! | LFU          | lowest frequency                | highest frequency              |
//! | TwoSegment   | oldest probation entry          | most recent protected entry    |
//!
//! `oldest_first == true` always means "next eviction victim first".
//!
//! ## Thread Safety
//!
//! Stores take `&mut self` for every mutation and are not synchronized. Share
//! one across threads through [`SharedCache`](crate::guard::SharedCache).

/// Bounded key/value store with a fixed eviction discipline.
///
/// # Example
///
/// ```
/// use stashkit::policy::lru::LruCache;
/// use stashkit::traits::EvictionStore;
///
/// fn warm<S: EvictionStore<u64, String>>(store: &mut S, data: &[(u64, &str)]) {
///     for (key, value) in data {
///         store.insert(*key, value.to_string());
///     }
/// }
///
/// let mut cache = LruCache::try_new(2).unwrap();
/// warm(&mut cache, &[(1, "one"), (2, "two"), (3, "three")]);
/// assert_eq!(cache.len(), 2);
/// assert!(!cache.contains(&1));
/// ```
pub trait EvictionStore<K, V> {
    /// Inserts or updates `key`.
    ///
    /// Returns the entry evicted to make room, if any. Updating an existing
    /// key never evicts.
    ///
    /// # Example
    ///
    /// ```
    /// use stashkit::policy::fifo::FifoCache;
    /// use stashkit::traits::EvictionStore;
    ///
    /// let mut cache = FifoCache::try_new(1).unwrap();
    /// assert_eq!(cache.insert("a", 1), None);
    /// assert_eq!(cache.insert("a", 2), None);
    /// assert_eq!(cache.insert("b", 3), Some(("a", 2)));
    /// ```
    fn insert(&mut self, key: K, value: V) -> Option<(K, V)>;

    /// Looks up `key`, updating recency or frequency on a hit.
    ///
    /// A miss leaves the store untouched. Use [`contains`](Self::contains) to
    /// test presence without affecting eviction order.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Removes `key`, returning its value. Removing an absent key is a no-op.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Checks presence without touching eviction state.
    fn contains(&self, key: &K) -> bool;

    /// Drops every entry.
    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured bound on [`len`](Self::len).
    fn capacity(&self) -> usize;

    /// Snapshot of all keys in eviction order.
    ///
    /// With `oldest_first` the next eviction victim comes first; otherwise the
    /// order is reversed.
    ///
    /// # Example
    ///
    /// ```
    /// use stashkit::policy::lru::LruCache;
    /// use stashkit::traits::EvictionStore;
    ///
    /// let mut cache = LruCache::try_new(2).unwrap();
    /// cache.insert(1, "one");
    /// cache.insert(2, "two");
    /// cache.get(&1);
    /// cache.insert(3, "three");
    ///
    /// assert_eq!(cache.keys(true), vec![1, 3]);
    /// assert_eq!(cache.keys(false), vec![3, 1]);
    /// ```
    fn keys(&self, oldest_first: bool) -> Vec<K>;

    /// Removes each key in turn. Absent keys yield `None`.
    fn remove_batch(&mut self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|key| self.remove(key)).collect()
    }
}
