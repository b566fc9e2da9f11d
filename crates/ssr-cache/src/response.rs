//! Rendered response storage.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use ssr_core::RenderResult;
use thiserror::Error;

use crate::key::CacheKey;
use crate::policy::ResponseCachePolicy;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Served from cache.
    Hit,
    /// Looked up but not found or expired.
    Miss,
    /// Cache not consulted (disabled or authenticated request).
    Bypass,
}

impl CacheStatus {
    /// Whether the response came from the cache.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
        }
    }
}

/// Errors raised by a cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend storage failed.
    #[error("Store operation failed: {0}")]
    Storage(String),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Storage for rendered responses.
#[async_trait]
pub trait ResponseCacheBackend: Send + Sync {
    /// Fetch a live entry.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<RenderResult>>;

    /// Store an entry, replacing any previous one.
    async fn set(&self, key: &CacheKey, value: RenderResult) -> CacheResult<()>;
}

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *lock(&self.offset, "advance") += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *lock(&self.offset, "now")
    }
}

#[derive(Debug, Clone)]
struct Entry {
    stored_at: Instant,
    value: RenderResult,
}

/// Bounded in-memory response cache with a fixed time-to-live.
///
/// Least recently used entries are evicted at capacity. Expired entries are
/// dropped when read.
pub struct LruResponseCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl LruResponseCache {
    /// Create a cache holding at most `capacity` entries for `ttl` each.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a cache sized by a policy.
    pub fn from_policy(policy: &ResponseCachePolicy) -> Self {
        Self::new(policy.capacity, policy.ttl)
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        lock(&self.entries, "len").len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time-to-live applied to entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for LruResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruResponseCache")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[async_trait]
impl ResponseCacheBackend for LruResponseCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<RenderResult>> {
        let now = self.clock.now();
        let mut entries = lock(&self.entries, "get");

        let expired = match entries.peek(key.as_str()) {
            Some(entry) => now.saturating_duration_since(entry.stored_at) > self.ttl,
            None => return Ok(None),
        };
        if expired {
            entries.pop(key.as_str());
            tracing::debug!(key = %key, "Evicted expired response");
            return Ok(None);
        }

        Ok(entries.get(key.as_str()).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &CacheKey, value: RenderResult) -> CacheResult<()> {
        let entry = Entry {
            stored_at: self.clock.now(),
            value,
        };
        lock(&self.entries, "set").put(key.as_str().to_string(), entry);
        Ok(())
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(
                op,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                "Recovered from poisoned cache lock"
            );
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use ssr_core::HeadCollector;

    use super::*;

    fn result(markup: &str) -> RenderResult {
        RenderResult::assemble(markup.to_string(), &HeadCollector::new(), Vec::new())
    }

    fn cache(capacity: usize, clock: Arc<ManualClock>) -> LruResponseCache {
        LruResponseCache::new(NonZeroUsize::new(capacity).unwrap(), Duration::from_secs(60))
            .with_clock(clock)
    }

    // === Expiry Tests ===

    #[tokio::test]
    async fn test_entry_lives_for_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(10, clock.clone());
        let key = CacheKey::new("se-mobile-/products-chrome");

        cache.set(&key, result("<div>1</div>")).await.unwrap();

        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.get(&key).await.unwrap(), Some(result("<div>1</div>")));

        clock.advance(Duration::from_secs(31));
        assert_eq!(cache.get(&key).await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_resets_age() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(10, clock.clone());
        let key = CacheKey::new("/");

        cache.set(&key, result("old")).await.unwrap();
        clock.advance(Duration::from_secs(50));
        cache.set(&key, result("new")).await.unwrap();
        clock.advance(Duration::from_secs(50));

        assert_eq!(cache.get(&key).await.unwrap(), Some(result("new")));
    }

    // === Capacity Tests ===

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(2, clock);
        let a = CacheKey::new("a");
        let b = CacheKey::new("b");
        let c = CacheKey::new("c");

        cache.set(&a, result("a")).await.unwrap();
        cache.set(&b, result("b")).await.unwrap();
        // Touch `a` so `b` becomes the eviction candidate.
        cache.get(&a).await.unwrap();
        cache.set(&c, result("c")).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a).await.unwrap().is_some());
        assert!(cache.get(&b).await.unwrap().is_none());
        assert!(cache.get(&c).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sized_by_policy() {
        let policy = ResponseCachePolicy::enabled(Duration::from_secs(5))
            .with_capacity(NonZeroUsize::new(1).unwrap());
        let cache = LruResponseCache::from_policy(&policy);

        cache.set(&CacheKey::new("a"), result("a")).await.unwrap();
        cache.set(&CacheKey::new("b"), result("b")).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(CacheStatus::Hit.to_string(), "HIT");
        assert_eq!(CacheStatus::Bypass.to_string(), "BYPASS");
        assert!(!CacheStatus::Miss.is_hit());
    }
}
