//! Core abstractions for the server-side render orchestrator.
//!
//! This crate provides the fundamental types shared by every stage:
//! - `RequestContext` - Inbound request plus response side effects
//! - `SsrConfig` - Render and cache configuration
//! - `HeadCollector` - Per-render document head accumulator
//! - `BundleManifest` - Module to asset resolution
//! - `RenderResult` - The assembled (and cacheable) render output
//! - `LifecyclePhase` - Render lifecycle tracking

mod bundle;
mod config;
mod context;
mod error;
mod head;
mod lifecycle;
mod result;

pub use bundle::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use head::*;
pub use lifecycle::*;
pub use result::*;
