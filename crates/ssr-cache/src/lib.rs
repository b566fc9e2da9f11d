//! Response caching for the server-side render orchestrator.
//!
//! This crate provides:
//! - `CacheKeyBuilder` - Request identity keys (locale, device, url, browser)
//! - `normalize_url` - Stable, sanitised URL component for keys
//! - `ResponseCachePolicy` - When a response may be read from or written to the cache
//! - `LruResponseCache` - Bounded, time-expiring in-memory cache
//! - `CacheMarker` - Response header reporting hit or miss
//!
//! # Example
//!
//! ```ignore
//! use ssr_cache::{CacheKeyBuilder, KeyContext};
//!
//! let key = CacheKeyBuilder::store_default().build(&KeyContext {
//!     locale: Some("se"),
//!     url: "/products",
//!     state: &state,
//! });
//! assert_eq!(key.as_str(), "se-mobile-/products-chrome");
//! ```

mod headers;
mod key;
mod policy;
mod response;

pub use headers::*;
pub use key::*;
pub use policy::*;
pub use response::*;
