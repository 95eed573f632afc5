//! Named cache registry.
//!
//! Maps unique names to [`SharedCache`] handles of arbitrary key/value types.
//! A process-wide instance is available through [`Registry::global`]; it
//! starts empty and is only filled by explicit registration.
//!
//! ```text
//!   Registry
//!   └── RwLock<FxHashMap<String, Registered>>
//!                                 ├── policy: PolicyKind
//!                                 └── cache:  Box<dyn Any + Send + Sync>
//!                                             (a SharedCache<K, V>)
//! ```
//!
//! The registry lock is never held while a cache lock is taken by callers;
//! lookups clone the handle out and release it.
//!
//! ## Example
//!
//! ```
//! use stashkit::config::CacheConfig;
//! use stashkit::registry::{RegisterError, Registry};
//!
//! let registry = Registry::new();
//! let users = registry
//!     .register::<u64, String>(&CacheConfig::lru("users", 100))
//!     .unwrap();
//! users.insert(1, "ada".to_string());
//!
//! let again = registry.register::<u64, String>(&CacheConfig::fifo("users", 5));
//! let Err(RegisterError::DuplicateName { existing: Some(existing), .. }) = again else {
//!     panic!("expected duplicate");
//! };
//! assert!(existing.same_instance(&users));
//! assert_eq!(existing.capacity(), 100);
//! ```

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::{CacheConfig, PolicyKind};
use crate::error::ConfigError;
use crate::guard::SharedCache;

// ---------------------------------------------------------------------------
// RegisterError
// ---------------------------------------------------------------------------

/// Error returned by [`Registry::register`].
pub enum RegisterError<K, V> {
    /// The name is taken. `existing` holds the registered cache when its
    /// key/value types match the request.
    DuplicateName {
        name: String,
        existing: Option<SharedCache<K, V>>,
    },
    /// The configuration was rejected.
    Config(ConfigError),
}

impl<K, V> RegisterError<K, V> {
    pub fn existing(&self) -> Option<&SharedCache<K, V>> {
        match self {
            RegisterError::DuplicateName { existing, .. } => existing.as_ref(),
            RegisterError::Config(_) => None,
        }
    }

    pub fn into_existing(self) -> Option<SharedCache<K, V>> {
        match self {
            RegisterError::DuplicateName { existing, .. } => existing,
            RegisterError::Config(_) => None,
        }
    }
}

impl<K, V> From<ConfigError> for RegisterError<K, V> {
    fn from(err: ConfigError) -> Self {
        RegisterError::Config(err)
    }
}

impl<K, V> fmt::Display for RegisterError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::DuplicateName { name, .. } => {
                write!(f, "a cache named {name:?} is already registered")
            },
            RegisterError::Config(err) => write!(f, "invalid cache configuration: {err}"),
        }
    }
}

impl<K, V> fmt::Debug for RegisterError<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::DuplicateName { name, existing } => f
                .debug_struct("DuplicateName")
                .field("name", name)
                .field("existing", &existing.is_some())
                .finish(),
            RegisterError::Config(err) => f.debug_tuple("Config").field(err).finish(),
        }
    }
}

impl<K, V> Error for RegisterError<K, V> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegisterError::Config(err) => Some(err),
            RegisterError::DuplicateName { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct Registered {
    policy: PolicyKind,
    cache: Box<dyn Any + Send + Sync>,
}

/// Name-to-cache map.
#[derive(Default)]
pub struct Registry {
    caches: RwLock<FxHashMap<String, Registered>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created empty on first use.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Builds the cache `config` describes and stores it under `config.name`.
    ///
    /// # Errors
    ///
    /// - [`RegisterError::DuplicateName`] if the name is taken; the existing
    ///   entry is left untouched and returned when its types match.
    /// - [`RegisterError::Config`] if `config` is invalid.
    pub fn register<K, V>(&self, config: &CacheConfig) -> Result<SharedCache<K, V>, RegisterError<K, V>>
    where
        K: Clone + Eq + Hash + Send + 'static,
        V: Send + 'static,
    {
        let mut caches = self.caches.write();
        if let Some(registered) = caches.get(&config.name) {
            debug!(name = %config.name, "cache name already registered");
            return Err(RegisterError::DuplicateName {
                name: config.name.clone(),
                existing: registered.cache.downcast_ref::<SharedCache<K, V>>().cloned(),
            });
        }

        let cache = config.build::<K, V>()?;
        caches.insert(
            config.name.clone(),
            Registered {
                policy: config.policy,
                cache: Box::new(cache.clone()),
            },
        );
        debug!(
            name = %config.name,
            policy = %config.policy,
            capacity = config.capacity,
            "registered cache"
        );
        Ok(cache)
    }

    /// Looks up `name`. `None` if absent or registered with other types.
    pub fn get<K, V>(&self, name: &str) -> Option<SharedCache<K, V>>
    where
        K: 'static,
        V: 'static,
    {
        self.caches
            .read()
            .get(name)?
            .cache
            .downcast_ref::<SharedCache<K, V>>()
            .cloned()
    }

    pub fn policy_of(&self, name: &str) -> Option<PolicyKind> {
        self.caches.read().get(name).map(|r| r.policy)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Forgets `name`. Outstanding handles keep working.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.caches.write().remove(name).is_some();
        if removed {
            debug!(name, "unregistered cache");
        }
        removed
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        let cache = registry
            .register::<String, u32>(&CacheConfig::lfu("counts", 8))
            .unwrap();
        cache.insert("a".into(), 1);

        let found = registry.get::<String, u32>("counts").unwrap();
        assert!(found.same_instance(&cache));
        assert_eq!(found.get(&"a".to_string()), Some(1));
        assert_eq!(registry.policy_of("counts"), Some(PolicyKind::Lfu));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn wrong_types_are_not_returned() {
        let registry = Registry::new();
        registry
            .register::<u32, u32>(&CacheConfig::lru("ints", 2))
            .unwrap();

        assert!(registry.get::<String, u32>("ints").is_none());
        let err = registry
            .register::<String, u32>(&CacheConfig::lru("ints", 2))
            .unwrap_err();
        assert!(matches!(err, RegisterError::DuplicateName { existing: None, .. }));
    }

    #[test]
    fn config_errors_leave_registry_empty() {
        let registry = Registry::new();
        let err = registry
            .register::<u8, u8>(&CacheConfig::fifo("bad", 0))
            .unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Config(ConfigError::ZeroCapacity { .. })
        ));
        assert!(err.existing().is_none());
        assert!(err.source().is_some());
        assert!(!registry.contains("bad"));
    }

    #[test]
    fn unregister_keeps_handles_usable() {
        let registry = Registry::new();
        let cache = registry
            .register::<u8, u8>(&CacheConfig::lru("tmp", 2))
            .unwrap();
        cache.insert(1, 1);

        assert!(registry.unregister("tmp"));
        assert!(!registry.unregister("tmp"));
        assert_eq!(cache.get(&1), Some(1));

        // the name is free again
        let fresh = registry
            .register::<u8, u8>(&CacheConfig::lru("tmp", 2))
            .unwrap();
        assert!(!fresh.same_instance(&cache));
        assert!(fresh.is_empty());
    }

    #[test]
    fn names_are_sorted() {
        let registry = Registry::new();
        for name in ["b", "c", "a"] {
            registry
                .register::<u8, u8>(&CacheConfig::lru(name, 1))
                .unwrap();
        }
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn error_display_is_readable() {
        let err: RegisterError<u8, u8> = RegisterError::DuplicateName {
            name: "users".into(),
            existing: None,
        };
        assert_eq!(err.to_string(), "a cache named \"users\" is already registered");
        assert!(format!("{err:?}").contains("DuplicateName"));
    }
}
