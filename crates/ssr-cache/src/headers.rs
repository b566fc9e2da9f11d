//! Cache status response header.

use http::header::{HeaderName, HeaderValue};
use ssr_core::{ConfigError, RequestContext, SsrConfig};

use crate::response::CacheStatus;

/// Default name of the hit/miss header.
pub const CACHE_HIT_HEADER: &str = "x-l";

/// Writes the cache outcome onto the response: `1` for a hit, `0` otherwise.
#[derive(Debug, Clone)]
pub struct CacheMarker {
    header: HeaderName,
}

impl Default for CacheMarker {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(CACHE_HIT_HEADER),
        }
    }
}

impl CacheMarker {
    /// Marker using the configured header name.
    pub fn from_config(config: &SsrConfig) -> Result<Self, ConfigError> {
        let header =
            HeaderName::from_bytes(config.cache_hit_header.as_bytes()).map_err(|e| ConfigError::Invalid {
                field: "cache_hit_header",
                reason: e.to_string(),
            })?;
        Ok(Self { header })
    }

    /// Header name written.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Header value for `status`.
    pub fn value(status: CacheStatus) -> HeaderValue {
        if status.is_hit() {
            HeaderValue::from_static("1")
        } else {
            HeaderValue::from_static("0")
        }
    }

    /// Set the header on the response.
    pub fn apply(&self, ctx: &mut RequestContext, status: CacheStatus) {
        ctx.set_header(self.header.clone(), Self::value(status));
    }
}
