//! Error types shared across the render pipeline.

use thiserror::Error;

/// Errors returned to the caller of a render.
///
/// Everything else that goes wrong while rendering is absorbed into the
/// response status and the logger.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Caching was requested without a key for the request.
    #[error("cache cannot be enabled without a cache key for the request")]
    MissingCacheKey,

    /// The render loop kept discovering new actions past the pass limit.
    #[error("render loop did not settle after {passes} passes")]
    RenderLoopLimit { passes: usize },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A view failed to render.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The view reported a render failure.
    #[error("render failed: {0}")]
    Render(String),

    /// Any other failure raised while rendering.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ViewError {
    /// Create a render failure with a message.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The bundle manifest could not be parsed.
    #[error("invalid bundle manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised while mutating the request context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A header value contained characters not allowed in HTTP headers.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}
