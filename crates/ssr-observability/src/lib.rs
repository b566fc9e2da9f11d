//! Render logging for the server-side render orchestrator.
//!
//! This crate provides:
//! - `RenderLogger` - The logging seam used by the render pipeline
//! - `TracingLogger` - Default logger emitting `tracing` events
//! - `StructuredLogger` - JSON or human-readable lines with request context
//! - `MemoryLogger` - Captures entries for assertions

mod logging;
mod render;

pub use logging::*;
pub use render::*;

// Re-export RequestId and TimingContext from ssr-core for convenience
pub use ssr_core::{RequestId, TimingContext};
