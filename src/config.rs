//! Cache configuration records.
//!
//! [`CacheConfig`] is the serializable description of one named cache: which
//! policy, how big, and which timeouts. It is what the
//! [`Registry`](crate::registry::Registry) consumes.
//!
//! ## Fields
//!
//! | Field                 | Type            | Default | Notes                                  |
//! |-----------------------|-----------------|---------|----------------------------------------|
//! | `name`                | `String`        | -       | unique within a registry               |
//! | `policy`              | `PolicyKind`    | -       | `lru`, `fifo`, `lfu`, `two-segment`    |
//! | `capacity`            | `usize`         | -       | > 0; probation size for two-segment    |
//! | `protected_capacity`  | `Option<usize>` | `None`  | required for two-segment               |
//! | `eternal`             | `bool`          | `false` | ignores both timeouts                  |
//! | `idle_timeout_millis` | `u64`           | `0`     | 0 disables the idle bound              |
//! | `live_timeout_millis` | `u64`           | `0`     | 0 disables the live bound              |
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//!
//! use stashkit::config::{CacheConfig, PolicyKind};
//!
//! let config = CacheConfig::lru("sessions", 1_000)
//!     .with_idle_timeout(Duration::from_secs(300))
//!     .with_live_timeout(Duration::from_secs(3_600));
//! assert_eq!(config.policy, PolicyKind::Lru);
//! assert!(config.validate().is_ok());
//!
//! let cache = config.build::<String, Vec<u8>>().unwrap();
//! assert!(!cache.is_eternal());
//! ```

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::builder::{CacheBuilder, CachePolicy};
use crate::error::ConfigError;
use crate::expire::Expiration;
use crate::guard::SharedCache;

// ---------------------------------------------------------------------------
// PolicyKind
// ---------------------------------------------------------------------------

/// Eviction policy name as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PolicyKind {
    Lru,
    Fifo,
    Lfu,
    TwoSegment,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Fifo => "fifo",
            PolicyKind::Lfu => "lfu",
            PolicyKind::TwoSegment => "two-segment",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    /// Case-insensitive; `two_segment` and `2q` are accepted aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(PolicyKind::Lru),
            "fifo" => Ok(PolicyKind::Fifo),
            "lfu" => Ok(PolicyKind::Lfu),
            "two-segment" | "two_segment" | "2q" => Ok(PolicyKind::TwoSegment),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for PolicyKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PolicyKind> for String {
    fn from(kind: PolicyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Configuration for one named cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Registry name.
    pub name: String,

    pub policy: PolicyKind,

    /// Entry bound; for two-segment caches, the probation segment size.
    pub capacity: usize,

    /// Protected segment size, two-segment only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected_capacity: Option<usize>,

    /// Never expire, whatever the timeouts say.
    #[serde(default)]
    pub eternal: bool,

    #[serde(default)]
    pub idle_timeout_millis: u64,

    #[serde(default)]
    pub live_timeout_millis: u64,
}

impl CacheConfig {
    pub fn new(name: impl Into<String>, policy: PolicyKind, capacity: usize) -> Self {
        Self {
            name: name.into(),
            policy,
            capacity,
            protected_capacity: None,
            eternal: false,
            idle_timeout_millis: 0,
            live_timeout_millis: 0,
        }
    }

    /// Quick preset for an LRU cache.
    pub fn lru(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, PolicyKind::Lru, capacity)
    }

    pub fn fifo(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, PolicyKind::Fifo, capacity)
    }

    pub fn lfu(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, PolicyKind::Lfu, capacity)
    }

    /// Quick preset for a two-segment cache.
    pub fn two_segment(
        name: impl Into<String>,
        probation_capacity: usize,
        protected_capacity: usize,
    ) -> Self {
        Self {
            protected_capacity: Some(protected_capacity),
            ..Self::new(name, PolicyKind::TwoSegment, probation_capacity)
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_millis = duration_to_millis(timeout);
        self
    }

    pub fn with_live_timeout(mut self, timeout: Duration) -> Self {
        self.live_timeout_millis = duration_to_millis(timeout);
        self
    }

    /// Disables expiration regardless of the configured timeouts.
    pub fn eternal(mut self) -> Self {
        self.eternal = true;
        self
    }

    /// Checks capacities and segment sizes.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroCapacity`] for a zero `capacity` or
    ///   `protected_capacity`
    /// - [`ConfigError::MissingProtectedCapacity`] for a two-segment config
    ///   without `protected_capacity`
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache_policy().map(|_| ())
    }

    /// Translates the record into a builder policy, validating it.
    pub fn cache_policy(&self) -> Result<CachePolicy, ConfigError> {
        ConfigError::require_positive("capacity", self.capacity)?;
        let policy = match self.policy {
            PolicyKind::Lru => CachePolicy::Lru,
            PolicyKind::Fifo => CachePolicy::Fifo,
            PolicyKind::Lfu => CachePolicy::Lfu,
            PolicyKind::TwoSegment => {
                let protected = self
                    .protected_capacity
                    .ok_or(ConfigError::MissingProtectedCapacity)?;
                CachePolicy::TwoSegment {
                    protected_capacity: ConfigError::require_positive(
                        "protected_capacity",
                        protected,
                    )?,
                }
            },
        };
        Ok(policy)
    }

    /// Effective expiration; `None` when eternal or both timeouts are 0.
    pub fn expiration(&self) -> Option<Expiration> {
        if self.eternal {
            return None;
        }
        let expiration = Expiration::from_millis(self.idle_timeout_millis, self.live_timeout_millis);
        (!expiration.is_eternal()).then_some(expiration)
    }

    /// Builds the shared cache this record describes.
    pub fn build<K, V>(&self) -> Result<SharedCache<K, V>, ConfigError>
    where
        K: Clone + Eq + Hash + Send + 'static,
        V: Send + 'static,
    {
        let store = CacheBuilder::new(self.capacity).try_build::<K, V>(self.cache_policy()?)?;
        Ok(match self.expiration() {
            Some(expiration) => SharedCache::expiring(store, expiration),
            None => SharedCache::new(store),
        })
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
