//! Error types for the stashkit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (zero capacity, unknown policy name, missing segment capacity).
//!
//! Steady-state cache operations never fail: a miss is `None`, and removing an
//! absent key is a no-op. Errors only surface at construction time.
//!
//! ## Example Usage
//!
//! ```
//! use stashkit::error::ConfigError;
//! use stashkit::policy::lru::LruCache;
//!
//! let cache: Result<LruCache<String, i32>, ConfigError> = LruCache::try_new(100);
//! assert!(cache.is_ok());
//!
//! let bad = LruCache::<String, i32>::try_new(0);
//! assert_eq!(bad.unwrap_err(), ConfigError::ZeroCapacity { field: "capacity" });
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`LruCache::try_new`](crate::policy::lru::LruCache::try_new),
/// [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build) and
/// [`CacheConfig::validate`](crate::config::CacheConfig::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A capacity parameter was zero.
    #[error("{field} must be greater than zero")]
    ZeroCapacity { field: &'static str },

    /// The policy name did not match any known eviction policy.
    #[error("unknown eviction policy: {0:?}")]
    UnknownPolicy(String),

    /// A two-segment cache was configured without a protected capacity.
    #[error("two-segment policy requires protected_capacity")]
    MissingProtectedCapacity,
}

impl ConfigError {
    /// Returns `Ok(value)` when `value > 0`, otherwise a `ZeroCapacity` error
    /// naming `field`.
    #[inline]
    pub(crate) fn require_positive(field: &'static str, value: usize) -> Result<usize, Self> {
        if value == 0 {
            Err(Self::ZeroCapacity { field })
        } else {
            Ok(value)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_names_the_field() {
        let err = ConfigError::ZeroCapacity {
            field: "protected_capacity",
        };
        assert_eq!(
            err.to_string(),
            "protected_capacity must be greater than zero"
        );
    }

    #[test]
    fn unknown_policy_quotes_the_input() {
        let err = ConfigError::UnknownPolicy("arc".into());
        assert_eq!(err.to_string(), "unknown eviction policy: \"arc\"");
    }

    #[test]
    fn require_positive_accepts_nonzero() {
        assert_eq!(ConfigError::require_positive("capacity", 3), Ok(3));
        assert_eq!(
            ConfigError::require_positive("capacity", 0),
            Err(ConfigError::ZeroCapacity { field: "capacity" })
        );
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<ConfigError>();
    }
}
