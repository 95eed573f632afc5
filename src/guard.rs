//! Thread-safe cache handle with a background expiry reaper.
//!
//! [`SharedCache`] is a cloneable handle to one [`ExpiringStore`] behind one
//! `parking_lot::Mutex`. Every public operation takes that lock, services any
//! wake-ups that are already due, and then runs, so an expiry and an
//! application call on the same key are always strictly ordered.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │  SharedCache<K, V, S, C>    (clone = another Arc to the same Handle) │
//!   │        │                                                             │
//!   │        ▼                                                             │
//!   │  Handle ──────────────► reaper: Option<JoinHandle<()>>               │
//!   │        │                      │                                      │
//!   │        ▼                      │ owns Arc<Shared>                     │
//!   │  Shared ◄─────────────────────┘                                      │
//!   │   ├── state: Mutex<State { store: ExpiringStore, shutdown }>         │
//!   │   └── wakeup: Condvar                                                │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   reaper loop:
//!     lock → shutdown? stop : purge_expired()
//!          → wait_for(next_wakeup - now)  or  wait() when the queue is empty
//!     insert() notifies the condvar so a nearer deadline is picked up
//! ```
//!
//! Dropping the last handle sets `shutdown`, wakes the reaper, and joins it.
//! Eternal caches never start a reaper.
//!
//! ## Example Usage
//!
//! ```
//! use std::thread;
//!
//! use stashkit::guard::SharedCache;
//! use stashkit::policy::lru::LruCache;
//!
//! let cache = SharedCache::new(LruCache::try_new(64).unwrap());
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let cache = cache.clone();
//!         thread::spawn(move || {
//!             for i in 0..100u64 {
//!                 cache.insert(t * 1000 + i, i);
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//! assert_eq!(cache.len(), 64);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::builder::PolicyStore;
use crate::clock::{Clock, SystemClock};
use crate::expire::{Expiration, ExpiringStore};
use crate::stats::CacheStats;
use crate::traits::EvictionStore;

const REAPER_THREAD_NAME: &str = "stashkit-reaper";

struct State<K, V, S, C> {
    store: ExpiringStore<K, V, S, C>,
    shutdown: bool,
}

struct Shared<K, V, S, C> {
    state: Mutex<State<K, V, S, C>>,
    wakeup: Condvar,
}

struct Handle<K, V, S, C> {
    shared: Arc<Shared<K, V, S, C>>,
    reaper: Option<JoinHandle<()>>,
}

impl<K, V, S, C> Drop for Handle<K, V, S, C> {
    fn drop(&mut self) {
        let Some(reaper) = self.reaper.take() else {
            return;
        };
        self.shared.state.lock().shutdown = true;
        self.shared.wakeup.notify_all();
        if reaper.join().is_err() {
            warn!("cache reaper thread panicked");
        }
    }
}

/// Cloneable, thread-safe cache handle. All clones share one instance.
pub struct SharedCache<K, V, S = PolicyStore<K, V>, C = SystemClock> {
    handle: Arc<Handle<K, V, S, C>>,
}

impl<K, V, S, C> Clone for SharedCache<K, V, S, C> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<K, V, S> SharedCache<K, V, S, SystemClock>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
    S: EvictionStore<K, V> + Send + 'static,
{
    /// Shares `store` without expiration.
    pub fn new(store: S) -> Self {
        Self::from_store(ExpiringStore::eternal(store))
    }

    /// Shares `store` with idle/live expiration on the system clock.
    pub fn expiring(store: S, expiration: Expiration) -> Self {
        Self::from_store(ExpiringStore::new(store, expiration))
    }
}

impl<K, V, S, C> SharedCache<K, V, S, C>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
    S: EvictionStore<K, V> + Send + 'static,
    C: Clock,
{
    pub fn with_clock(store: S, expiration: Option<Expiration>, clock: C) -> Self {
        Self::from_store(ExpiringStore::with_clock(store, expiration, clock))
    }

    /// Shares an already-built expiring store, starting a reaper unless it is
    /// eternal.
    pub fn from_store(store: ExpiringStore<K, V, S, C>) -> Self {
        let eternal = store.is_eternal();
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                store,
                shutdown: false,
            }),
            wakeup: Condvar::new(),
        });

        let reaper = if eternal {
            None
        } else {
            spawn_reaper(Arc::clone(&shared))
        };

        Self {
            handle: Arc::new(Handle { shared, reaper }),
        }
    }

    fn locked<R>(&self, f: impl FnOnce(&mut ExpiringStore<K, V, S, C>) -> R) -> R {
        let mut state = self.handle.shared.state.lock();
        state.store.purge_expired();
        f(&mut state.store)
    }

    /// Inserts or updates `key`, returning the entry evicted for room.
    pub fn insert(&self, key: K, value: V) -> Option<(K, V)> {
        let evicted = self.locked(|store| store.insert(key, value));
        if self.handle.reaper.is_some() {
            self.handle.shared.wakeup.notify_one();
        }
        evicted
    }

    /// Returns a clone of the value for `key`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.locked(|store| store.get(key).cloned())
    }

    /// Returns the cached value or inserts the one produced by `init`.
    ///
    /// `init` runs while the cache lock is held and must not call back into
    /// this cache.
    pub fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        let value = self.locked(|store| {
            if let Some(value) = store.get(&key) {
                return value.clone();
            }
            let value = init();
            store.insert(key, value.clone());
            value
        });
        if self.handle.reaper.is_some() {
            self.handle.shared.wakeup.notify_one();
        }
        value
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.locked(|store| store.remove(key))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.locked(|store| store.contains(key))
    }

    pub fn clear(&self) {
        self.locked(|store| store.clear());
    }

    pub fn len(&self) -> usize {
        self.locked(|store| store.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.locked(|store| store.capacity())
    }

    pub fn keys(&self, oldest_first: bool) -> Vec<K> {
        self.locked(|store| store.keys(oldest_first))
    }

    /// Runs a purge now and returns how many entries expired.
    pub fn purge_expired(&self) -> usize {
        self.handle.shared.state.lock().store.purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.locked(|store| store.stats())
    }

    pub fn is_eternal(&self) -> bool {
        self.handle.shared.state.lock().store.is_eternal()
    }

    pub fn expiration(&self) -> Option<Expiration> {
        self.handle.shared.state.lock().store.expiration()
    }

    /// Read access to the wrapped policy store under the cache lock.
    ///
    /// Unlike the other operations this does not purge first, so the view
    /// may still hold entries whose deadline has passed.
    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(self.handle.shared.state.lock().store.inner())
    }

    /// `true` when both handles refer to the same cache instance.
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }

    pub fn has_reaper(&self) -> bool {
        self.handle.reaper.is_some()
    }
}

impl<K, V, S, C> fmt::Debug for SharedCache<K, V, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCache")
            .field("reaper", &self.handle.reaper.is_some())
            .field("handles", &Arc::strong_count(&self.handle))
            .finish_non_exhaustive()
    }
}

fn spawn_reaper<K, V, S, C>(shared: Arc<Shared<K, V, S, C>>) -> Option<JoinHandle<()>>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
    S: EvictionStore<K, V> + Send + 'static,
    C: Clock,
{
    let spawned = thread::Builder::new()
        .name(REAPER_THREAD_NAME.to_string())
        .spawn(move || run_reaper(shared));

    match spawned {
        Ok(handle) => Some(handle),
        Err(error) => {
            warn!(%error, "failed to spawn cache reaper; expiring on access only");
            None
        },
    }
}

fn run_reaper<K, V, S, C>(shared: Arc<Shared<K, V, S, C>>)
where
    K: Clone + Eq + Hash,
    S: EvictionStore<K, V>,
    C: Clock,
{
    debug!("cache reaper started");
    let mut state = shared.state.lock();
    while !state.shutdown {
        state.store.purge_expired();
        match state.store.next_wakeup() {
            Some(at) => {
                let timeout = at.saturating_duration_since(state.store.now());
                shared.wakeup.wait_for(&mut state, timeout);
            },
            None => shared.wakeup.wait(&mut state),
        }
    }
    debug!("cache reaper stopped");
}
