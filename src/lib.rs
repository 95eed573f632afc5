//! stashkit: bounded in-memory caches with pluggable eviction and expiry.
//!
//! Four eviction policies (LRU, FIFO, LFU, two-segment) share the
//! [`EvictionStore`](traits::EvictionStore) interface. Any of them can be
//! wrapped in [`ExpiringStore`](expire::ExpiringStore) for idle/live
//! timeouts, shared across threads with [`SharedCache`](guard::SharedCache),
//! and published by name through [`Registry`](registry::Registry).
//!
//! ```
//! use std::time::Duration;
//!
//! use stashkit::prelude::*;
//!
//! let cache = CacheConfig::two_segment("pages", 64, 256)
//!     .with_idle_timeout(Duration::from_secs(30))
//!     .build::<u64, Vec<u8>>()
//!     .unwrap();
//! cache.insert(7, vec![1, 2, 3]);
//! assert_eq!(cache.get(&7), Some(vec![1, 2, 3]));
//! ```

pub mod builder;
pub mod clock;
pub mod config;
pub mod ds;
pub mod error;
pub mod expire;
pub mod guard;
pub mod policy;
pub mod prelude;
pub mod registry;
pub mod stats;
pub mod traits;

pub use crate::ds::{IndexedMinHeap, IntrusiveList, SlotArena, SlotId};
pub use crate::policy::fifo::FifoCache;
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::two_segment::{Segment, TwoSegmentCache};
