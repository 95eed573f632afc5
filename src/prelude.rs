pub use crate::builder::{CacheBuilder, CachePolicy, PolicyStore};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{CacheConfig, PolicyKind};
pub use crate::error::ConfigError;
pub use crate::expire::{Expiration, ExpiringStore};
pub use crate::guard::SharedCache;
pub use crate::policy::fifo::FifoCache;
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::two_segment::{Segment, TwoSegmentCache};
pub use crate::registry::{RegisterError, Registry};
pub use crate::stats::CacheStats;
pub use crate::traits::EvictionStore;
