//! Request context with response side effects.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use http::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use http::StatusCode;

use crate::error::ContextError;
use crate::lifecycle::TimingContext;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let id = format!(
            "{:x}-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            next_sequence()
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

fn next_sequence() -> u32 {
    static SEQUENCE: AtomicU32 = AtomicU32::new(0);
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request cookies.
pub type Cookies = HashMap<String, String>;

/// Response side of the context, mutated while rendering.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    /// Response status. The HTTP layer reads it after rendering.
    pub status: StatusCode,
    /// Response headers set during rendering.
    pub headers: HeaderMap,
    /// Redirect target, if a redirect was requested.
    pub redirect: Option<String>,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            redirect: None,
        }
    }
}

/// Per-request context handed to the renderer.
///
/// Lives for exactly one inbound request and is borrowed, never retained,
/// by the render call.
#[derive(Debug)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// Request URL (path and query).
    pub url: String,
    /// Request headers. Lookups are case-insensitive.
    pub headers: HeaderMap,
    /// Request cookies.
    pub cookies: Cookies,
    /// Request locale (e.g. "se").
    pub locale: Option<String>,
    /// Authenticated user from session state.
    pub user: Option<String>,
    /// Timing context for observability.
    pub timing: TimingContext,
    response: ResponseParts,
}

impl RequestContext {
    /// Create a new request context for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::generate(),
            url: url.into(),
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
            locale: None,
            user: None,
            timing: TimingContext::new(),
            response: ResponseParts::default(),
        }
    }

    /// Add a request header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a request cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Set the request locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Mark the request as made by an authenticated user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Get a request header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }

    /// Whether the requester is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Current response status.
    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.status = status;
    }

    /// Set a response header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers.insert(name, value);
    }

    /// Get a response header value set during rendering.
    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request a redirect to `location` (302 Found).
    pub fn redirect(&mut self, location: &str) -> Result<(), ContextError> {
        let value = HeaderValue::from_str(location)?;
        self.response.headers.insert(LOCATION, value);
        self.response.status = StatusCode::FOUND;
        self.response.redirect = Some(location.to_string());
        Ok(())
    }

    /// Response side effects accumulated so far.
    pub fn response(&self) -> &ResponseParts {
        &self.response
    }
}
