//! Structured render log lines.
//!
//! Every diagnostic the render pipeline raises carries [`LogFields`]: the
//! loop pass it happened in, the action key involved, the cache outcome and
//! so on. [`StructuredLogger`] writes them as one JSON object (or one
//! `key=value` line) per event, tagged with the request they belong to.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use ssr_core::{RequestContext, RequestId};

/// Severity of a render diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Progress notes: cache outcome, pass counts.
    Debug,
    /// Failed actions, renders and cache operations.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Error => "ERROR",
        })
    }
}

/// Render-specific context attached to a log line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogFields {
    /// Loop pass, starting at 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<usize>,
    /// Registry key of the action involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Cache outcome (`HIT`, `MISS`, `BYPASS`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
    /// Response cache key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Actions registered so far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<usize>,
    /// Modules captured by the final pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<usize>,
}

impl LogFields {
    /// No fields.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pass(mut self, pass: usize) -> Self {
        self.pass = Some(pass);
        self
    }

    pub fn with_action(mut self, key: impl Into<String>) -> Self {
        self.action = Some(key.into());
        self
    }

    pub fn with_cache(mut self, status: impl fmt::Display) -> Self {
        self.cache = Some(status.to_string());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_registered(mut self, count: usize) -> Self {
        self.registered = Some(count);
        self
    }

    pub fn with_modules(mut self, count: usize) -> Self {
        self.modules = Some(count);
        self
    }

    /// Set fields as `name=value` pairs, in declaration order.
    pub fn pairs(&self) -> Vec<String> {
        let mut pairs = Vec::new();
        if let Some(pass) = self.pass {
            pairs.push(format!("pass={}", pass));
        }
        if let Some(action) = &self.action {
            pairs.push(format!("action={}", action));
        }
        if let Some(cache) = &self.cache {
            pairs.push(format!("cache={}", cache));
        }
        if let Some(key) = &self.key {
            pairs.push(format!("key={}", key));
        }
        if let Some(registered) = self.registered {
            pairs.push(format!("registered={}", registered));
        }
        if let Some(modules) = self.modules {
            pairs.push(format!("modules={}", modules));
        }
        pairs
    }
}

/// One written line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub request_id: String,
    pub url: String,
    #[serde(flatten)]
    pub fields: LogFields,
    /// Rendered error, for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Microseconds since the logger was created.
    pub elapsed_us: u64,
}

impl LogEntry {
    /// One JSON object. Falls back to the bare message if serialisation fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// `[LEVEL] message url | pass=2 action=product:42 error=...`
    pub fn to_human(&self) -> String {
        let mut line = format!("[{}] {} {}", self.level, self.message, self.url);
        let mut pairs = self.fields.pairs();
        if let Some(error) = &self.error {
            pairs.push(format!("error={}", error));
        }
        if !pairs.is_empty() {
            line.push_str(" | ");
            line.push_str(&pairs.join(" "));
        }
        line
    }
}

/// Output format for [`StructuredLogger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Human,
}

/// Writes render diagnostics for one request to stderr.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    request_id: RequestId,
    url: String,
    started: Instant,
    min_level: LogLevel,
    format: LogFormat,
}

impl StructuredLogger {
    /// Logger tagged with `request`'s id and URL. Drops debug lines by default.
    pub fn for_request(request: &RequestContext) -> Self {
        Self {
            request_id: request.request_id.clone(),
            url: request.url.clone(),
            started: Instant::now(),
            min_level: LogLevel::Error,
            format: LogFormat::Json,
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// The entry a call would write, or `None` below the minimum level.
    pub fn entry(&self, level: LogLevel, message: &str, fields: &LogFields, error: Option<String>) -> Option<LogEntry> {
        if level < self.min_level {
            return None;
        }
        Some(LogEntry {
            level,
            message: message.to_string(),
            request_id: self.request_id.to_string(),
            url: self.url.clone(),
            fields: fields.clone(),
            error,
            elapsed_us: self.started.elapsed().as_micros() as u64,
        })
    }

    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Json => entry.to_json(),
            LogFormat::Human => entry.to_human(),
        }
    }

    pub(crate) fn write(&self, level: LogLevel, message: &str, fields: &LogFields, error: Option<String>) {
        if let Some(entry) = self.entry(level, message, fields, error) {
            eprintln!("{}", self.format_entry(&entry));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> StructuredLogger {
        let mut request = RequestContext::new("/products");
        request.request_id = RequestId::from_string("req-1");
        StructuredLogger::for_request(&request)
    }

    // === Entry Tests ===

    #[test]
    fn test_entry_carries_request() {
        let entry = logger()
            .entry(LogLevel::Error, "final", &LogFields::new(), None)
            .unwrap();

        assert_eq!(entry.request_id, "req-1");
        assert_eq!(entry.url, "/products");
    }

    #[test]
    fn test_debug_dropped_by_default() {
        let fields = LogFields::new();
        assert!(logger().entry(LogLevel::Debug, "render pass", &fields, None).is_none());

        let verbose = logger().with_min_level(LogLevel::Debug);
        assert!(verbose.entry(LogLevel::Debug, "render pass", &fields, None).is_some());
    }

    // === Format Tests ===

    #[test]
    fn test_json_flattens_fields() {
        let fields = LogFields::new().with_pass(2).with_action("product:42");
        let entry = logger()
            .entry(LogLevel::Error, "action", &fields, Some("upstream".into()))
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&entry.to_json()).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["pass"], 2);
        assert_eq!(json["action"], "product:42");
        assert_eq!(json["error"], "upstream");
        assert!(json.get("cache").is_none());
    }

    #[test]
    fn test_human_line() {
        let fields = LogFields::new().with_cache("HIT").with_key("se-mobile-/-chrome");
        let logger = logger().with_min_level(LogLevel::Debug).with_format(LogFormat::Human);
        let entry = logger.entry(LogLevel::Debug, "cache lookup", &fields, None).unwrap();

        assert_eq!(
            logger.format_entry(&entry),
            "[DEBUG] cache lookup /products | cache=HIT key=se-mobile-/-chrome"
        );
    }
}
