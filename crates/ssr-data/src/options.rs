//! Request headers forwarded to fetch actions.
//!
//! Actions call back into the same backend the page is rendered for, so
//! they need the caller's session cookies and identifying headers.

use http::header::{HeaderMap, HeaderName, COOKIE, HOST, USER_AGENT};

/// Options passed through to downstream fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Headers to send with downstream requests.
    pub headers: HeaderMap,
}

impl FetchOptions {
    /// Forward the whole request header set unchanged.
    pub fn forward_all(headers: &HeaderMap) -> Self {
        Self {
            headers: headers.clone(),
        }
    }

    /// Forward `cookie`, `user-agent`, `host`, every header whose name
    /// contains `x-`, and any names listed in `extra`.
    pub fn forward_selected(headers: &HeaderMap, extra: &[String]) -> Self {
        let mut forwarded = HeaderMap::new();

        for (name, value) in headers {
            if is_forwarded(name, extra) {
                forwarded.append(name.clone(), value.clone());
            }
        }

        Self { headers: forwarded }
    }

    /// Get a forwarded header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

fn is_forwarded(name: &HeaderName, extra: &[String]) -> bool {
    *name == COOKIE
        || *name == USER_AGENT
        || *name == HOST
        || name.as_str().contains("x-")
        || extra.iter().any(|e| e.eq_ignore_ascii_case(name.as_str()))
}
