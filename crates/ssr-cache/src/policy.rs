//! Response cache policy.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ssr_core::SsrConfig;

const DEFAULT_TTL: Duration = Duration::from_secs(60);
const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(n) => n,
    None => unreachable!(),
};

/// Decides when a rendered response may be read from or written to the cache.
///
/// Personalised responses are never shared: requests from authenticated users
/// bypass the cache in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCachePolicy {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// Time-to-live for cached responses.
    pub ttl: Duration,
    /// Maximum number of cached responses.
    pub capacity: NonZeroUsize,
}

impl Default for ResponseCachePolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ResponseCachePolicy {
    /// Create a disabled policy.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create an enabled policy with the given TTL.
    pub fn enabled(ttl: Duration) -> Self {
        Self {
            enabled: true,
            ttl,
            ..Default::default()
        }
    }

    /// Build the policy from configuration.
    pub fn from_config(config: &SsrConfig) -> Self {
        Self {
            enabled: config.use_cache,
            ttl: config.cache_ttl(),
            capacity: NonZeroUsize::new(config.cache_capacity).unwrap_or(DEFAULT_CAPACITY),
        }
    }

    /// Set the capacity.
    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Whether a cached response may be served.
    pub fn allows_lookup(&self, authenticated: bool) -> bool {
        self.enabled && !authenticated
    }

    /// Whether a freshly rendered response may be stored.
    pub fn allows_store(&self, authenticated: bool, found_error: bool) -> bool {
        self.enabled && !authenticated && !found_error
    }
}
