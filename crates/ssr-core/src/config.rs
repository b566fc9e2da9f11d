//! Render and cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_CACHE_CAPACITY: usize = 500;

/// Render pass limit applied unless configured otherwise.
pub const DEFAULT_MAX_RENDER_PASSES: usize = 50;

const DEFAULT_CACHE_HIT_HEADER: &str = "x-l";

/// Configuration for the render orchestrator.
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrConfig {
    /// Enable response cache reads and writes.
    pub use_cache: bool,
    /// Response cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached responses.
    pub cache_capacity: usize,
    /// Upper bound on render loop passes. `None` disables the guard.
    pub max_render_passes: Option<usize>,
    /// Extra request headers forwarded to fetch actions.
    pub forwarded_headers: Vec<String>,
    /// Response header signalling whether the result came from the cache.
    pub cache_hit_header: String,
}

impl Default for SsrConfig {
    fn default() -> Self {
        Self {
            use_cache: false,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_render_passes: Some(DEFAULT_MAX_RENDER_PASSES),
            forwarded_headers: Vec::new(),
            cache_hit_header: DEFAULT_CACHE_HIT_HEADER.to_string(),
        }
    }
}

impl SsrConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_render_passes == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_render_passes",
                reason: "must allow at least one pass".to_string(),
            });
        }
        if http::HeaderName::from_bytes(self.cache_hit_header.as_bytes()).is_err() {
            return Err(ConfigError::Invalid {
                field: "cache_hit_header",
                reason: format!("'{}' is not a valid header name", self.cache_hit_header),
            });
        }
        Ok(())
    }

    /// Response cache time-to-live.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Enable or disable the cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Set the render pass limit.
    pub fn with_max_render_passes(mut self, passes: Option<usize>) -> Self {
        self.max_render_passes = passes;
        self
    }
}
