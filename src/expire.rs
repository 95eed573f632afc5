//! Idle/live expiration layered over any [`EvictionStore`].
//!
//! [`ExpiringStore`] keeps one [`ExpiryRecord`] per live key and a single
//! time-ordered queue of wake-ups. Each wake-up carries the generation of the
//! admission that scheduled it; when it fires, it only acts if that
//! generation is still current.
//!
//! ## Deadlines
//!
//! ```text
//!   deadline = min(last_access + idle, inserted_at + live)
//!
//!   inserted_at          last_access (get)        deadline
//!        │──────────────────────│───────── idle ──────►│
//!        │────────────────────── live ──────────────────────────►│
//! ```
//!
//! A disabled bound drops out of the `min`. With both bounds disabled the
//! store is eternal and the layer is a pass-through: no records, no queue.
//!
//! ## Wake-up Lifecycle
//!
//! ```text
//!   insert(k)  ──► gen = 7, push Wakeup { at: deadline, gen: 7, k }
//!   get(k)     ──► deadline moves later; the queued wake-up is left alone
//!   fire(gen 7)──► record.gen == 7 ?
//!                    no  → stale, ignore (k was overwritten or removed)
//!                    yes → deadline <= now ? expire k : re-push at deadline
//! ```
//!
//! `get` never pushes, so each live generation has exactly one wake-up in the
//! queue. Overwrites and removals leave stale wake-ups behind; the queue is
//! rebuilt from the records once stale entries clearly outnumber live ones.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use stashkit::clock::ManualClock;
//! use stashkit::expire::{Expiration, ExpiringStore};
//! use stashkit::policy::lru::LruCache;
//! use stashkit::traits::EvictionStore;
//!
//! let clock = ManualClock::new();
//! let mut store = ExpiringStore::with_clock(
//!     LruCache::try_new(8).unwrap(),
//!     Some(Expiration::live(Duration::from_secs(5))),
//!     clock.clone(),
//! );
//!
//! store.insert("session", 42);
//! clock.advance(Duration::from_secs(4));
//! assert_eq!(store.get(&"session"), Some(&42));
//!
//! clock.advance(Duration::from_secs(1));
//! assert_eq!(store.purge_expired(), 1);
//! assert!(!store.contains(&"session"));
//! ```

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::stats::CacheStats;
use crate::traits::EvictionStore;

const COMPACT_FACTOR: usize = 4;
const COMPACT_SLACK: usize = 16;

// ---------------------------------------------------------------------------
// Expiration
// ---------------------------------------------------------------------------

/// Idle and absolute-lifetime bounds. `None` disables a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Expiration {
    idle: Option<Duration>,
    live: Option<Duration>,
}

impl Expiration {
    /// Zero durations are treated as disabled.
    pub fn new(idle: Option<Duration>, live: Option<Duration>) -> Self {
        Self {
            idle: idle.filter(|d| !d.is_zero()),
            live: live.filter(|d| !d.is_zero()),
        }
    }

    /// Expire entries not read for `timeout`.
    pub fn idle(timeout: Duration) -> Self {
        Self::new(Some(timeout), None)
    }

    /// Expire entries `timeout` after admission, regardless of reads.
    pub fn live(timeout: Duration) -> Self {
        Self::new(None, Some(timeout))
    }

    /// Builds bounds from millisecond counts; 0 disables a bound.
    pub fn from_millis(idle_millis: u64, live_millis: u64) -> Self {
        Self::new(
            Some(Duration::from_millis(idle_millis)),
            Some(Duration::from_millis(live_millis)),
        )
    }

    pub fn with_idle(self, timeout: Duration) -> Self {
        Self::new(Some(timeout), self.live)
    }

    pub fn with_live(self, timeout: Duration) -> Self {
        Self::new(self.idle, Some(timeout))
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle
    }

    pub fn live_timeout(&self) -> Option<Duration> {
        self.live
    }

    pub fn is_eternal(&self) -> bool {
        self.idle.is_none() && self.live.is_none()
    }

    /// `None` when eternal. A bound too large to represent as an `Instant`
    /// never fires and drops out of the `min`.
    pub fn deadline(&self, inserted_at: Instant, last_access: Instant) -> Option<Instant> {
        let idle = self.idle.and_then(|d| last_access.checked_add(d));
        let live = self.live.and_then(|d| inserted_at.checked_add(d));
        match (idle, live) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

// ---------------------------------------------------------------------------
// Records and wake-ups
// ---------------------------------------------------------------------------

/// Per-key expiry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryRecord {
    pub inserted_at: Instant,
    pub last_access: Instant,
    pub deadline: Instant,
    pub generation: u64,
}

#[derive(Debug)]
struct Wakeup<K> {
    at: Instant,
    generation: u64,
    key: K,
}

// Ordered by (at, generation); keys need not be comparable.
impl<K> PartialEq for Wakeup<K> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.generation == other.generation
    }
}

impl<K> Eq for Wakeup<K> {}

impl<K> PartialOrd for Wakeup<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Wakeup<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.generation).cmp(&(other.at, other.generation))
    }
}

// ---------------------------------------------------------------------------
// ExpiringStore
// ---------------------------------------------------------------------------

/// Wraps an eviction store with idle/live expiration.
pub struct ExpiringStore<K, V, S, C = SystemClock> {
    store: S,
    clock: C,
    expiration: Option<Expiration>,
    records: FxHashMap<K, ExpiryRecord>,
    timers: BinaryHeap<Reverse<Wakeup<K>>>,
    next_generation: u64,
    stats: CacheStats,
    _marker: PhantomData<fn() -> V>,
}

impl<K, V, S> ExpiringStore<K, V, S, SystemClock>
where
    K: Clone + Eq + Hash,
    S: EvictionStore<K, V>,
{
    /// Wraps `store` using the system clock.
    pub fn new(store: S, expiration: Expiration) -> Self {
        Self::with_clock(store, Some(expiration), SystemClock)
    }

    /// Pass-through wrapper that never expires anything.
    pub fn eternal(store: S) -> Self {
        Self::with_clock(store, None, SystemClock)
    }
}

impl<K, V, S, C> ExpiringStore<K, V, S, C>
where
    K: Clone + Eq + Hash,
    S: EvictionStore<K, V>,
    C: Clock,
{
    /// Wraps `store` with an explicit clock. An eternal `expiration` is the
    /// same as `None`.
    pub fn with_clock(store: S, expiration: Option<Expiration>, clock: C) -> Self {
        Self {
            store,
            clock,
            expiration: expiration.filter(|e| !e.is_eternal()),
            records: FxHashMap::default(),
            timers: BinaryHeap::new(),
            next_generation: 0,
            stats: CacheStats::default(),
            _marker: PhantomData,
        }
    }

    pub fn is_eternal(&self) -> bool {
        self.expiration.is_none()
    }

    pub fn expiration(&self) -> Option<Expiration> {
        self.expiration
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn deadline_of(&self, key: &K) -> Option<Instant> {
        self.records.get(key).map(|r| r.deadline)
    }

    pub fn generation_of(&self, key: &K) -> Option<u64> {
        self.records.get(key).map(|r| r.generation)
    }

    pub fn record_of(&self, key: &K) -> Option<ExpiryRecord> {
        self.records.get(key).copied()
    }

    /// Earliest queued wake-up. May belong to a stale generation.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.timers.peek().map(|Reverse(w)| w.at)
    }

    /// Number of queued wake-ups, stale ones included.
    pub fn pending_wakeups(&self) -> usize {
        self.timers.len()
    }

    /// Services every wake-up that is due and returns how many entries
    /// expired.
    pub fn purge_expired(&mut self) -> usize {
        if self.expiration.is_none() {
            return 0;
        }

        let now = self.clock.now();
        let mut expired = 0;
        while let Some(Reverse(next)) = self.timers.peek() {
            if next.at > now {
                break;
            }
            let Some(Reverse(wakeup)) = self.timers.pop() else {
                break;
            };

            let Some(record) = self.records.get(&wakeup.key) else {
                continue;
            };
            if record.generation != wakeup.generation {
                continue;
            }
            if !self.store.contains(&wakeup.key) {
                // evicted behind our back (e.g. a segment promotion)
                self.records.remove(&wakeup.key);
                continue;
            }

            if record.deadline <= now {
                self.records.remove(&wakeup.key);
                self.store.remove(&wakeup.key);
                self.stats.expirations += 1;
                expired += 1;
                trace!(generation = wakeup.generation, "entry expired");
            } else {
                let at = record.deadline;
                self.timers.push(Reverse(Wakeup { at, ..wakeup }));
            }
        }
        expired
    }

    fn is_expired(&self, key: &K, now: Instant) -> bool {
        self.records.get(key).is_some_and(|r| r.deadline <= now)
    }

    fn maybe_compact(&mut self) {
        if self.timers.len() <= self.records.len() * COMPACT_FACTOR + COMPACT_SLACK {
            return;
        }
        let stale = self.timers.len() - self.records.len();
        self.timers = self
            .records
            .iter()
            .map(|(key, r)| {
                Reverse(Wakeup {
                    at: r.deadline,
                    generation: r.generation,
                    key: key.clone(),
                })
            })
            .collect();
        trace!(stale, "compacted wake-up queue");
    }
}

impl<K, V, S, C> EvictionStore<K, V> for ExpiringStore<K, V, S, C>
where
    K: Clone + Eq + Hash,
    S: EvictionStore<K, V>,
    C: Clock,
{
    fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let now = self.clock.now();
        let deadline = self.expiration.and_then(|e| e.deadline(now, now));

        self.stats.inserts += 1;
        let evicted = self.store.insert(key.clone(), value);
        if let Some((victim, _)) = &evicted {
            self.records.remove(victim);
            self.stats.evictions += 1;
            trace!("entry evicted by capacity");
        }

        let Some(deadline) = deadline else {
            // unbounded admission; any earlier generation's wake-up goes stale
            self.records.remove(&key);
            return evicted;
        };
        self.next_generation += 1;
        let generation = self.next_generation;
        self.records.insert(
            key.clone(),
            ExpiryRecord {
                inserted_at: now,
                last_access: now,
                deadline,
                generation,
            },
        );
        self.timers.push(Reverse(Wakeup {
            at: deadline,
            generation,
            key,
        }));
        self.maybe_compact();
        evicted
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if let Some(expiration) = self.expiration {
            let now = self.clock.now();
            match self.records.get_mut(key) {
                Some(record) if record.deadline <= now => {
                    self.records.remove(key);
                    self.stats.misses += 1;
                    if self.store.remove(key).is_some() {
                        self.stats.expirations += 1;
                        trace!("entry expired on read");
                    }
                    return None;
                },
                Some(record) => {
                    record.last_access = now;
                    match expiration.deadline(record.inserted_at, now) {
                        Some(deadline) => record.deadline = deadline,
                        None => {
                            self.records.remove(key);
                        },
                    }
                },
                None => {},
            }
        }

        match self.store.get(key) {
            Some(value) => {
                self.stats.hits += 1;
                Some(value)
            },
            None => {
                self.records.remove(key);
                self.stats.misses += 1;
                None
            },
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.records.remove(key);
        self.store.remove(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.store.contains(key) && !self.is_expired(key, self.clock.now())
    }

    fn clear(&mut self) {
        self.store.clear();
        self.records.clear();
        self.timers.clear();
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn capacity(&self) -> usize {
        self.store.capacity()
    }

    fn keys(&self, oldest_first: bool) -> Vec<K> {
        let keys = self.store.keys(oldest_first);
        if self.expiration.is_none() {
            return keys;
        }
        let now = self.clock.now();
        keys.into_iter()
            .filter(|key| !self.is_expired(key, now))
            .collect()
    }
}

impl<K, V, S, C> fmt::Debug for ExpiringStore<K, V, S, C>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("store", &self.store)
            .field("expiration", &self.expiration)
            .field("records", &self.records.len())
            .field("pending_wakeups", &self.timers.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
