//! Logger used by the render pipeline.

use std::sync::{Mutex, MutexGuard};

use crate::logging::{LogFields, LogLevel, StructuredLogger};

/// Sink for render pipeline diagnostics.
///
/// `verbose` carries progress notes (cache outcome, pass counts); `error`
/// carries failures together with where they happened (`"while loop"`,
/// `"final"`, `"action"`, `"cache lookup"`, `"cache store"`). The pass,
/// action key and cache key travel in `fields`.
pub trait RenderLogger: Send + Sync {
    /// Log a diagnostic message.
    fn verbose(&self, message: &str, fields: &LogFields);

    /// Log a failure.
    fn error(&self, message: &str, error: &dyn std::error::Error, fields: &LogFields);
}

/// Emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RenderLogger for TracingLogger {
    fn verbose(&self, message: &str, fields: &LogFields) {
        tracing::debug!(
            target: "ssr",
            pass = ?fields.pass,
            action = ?fields.action,
            cache = ?fields.cache,
            key = ?fields.key,
            registered = ?fields.registered,
            modules = ?fields.modules,
            "{}",
            message
        );
    }

    fn error(&self, message: &str, error: &dyn std::error::Error, fields: &LogFields) {
        tracing::error!(
            target: "ssr",
            error = %error,
            pass = ?fields.pass,
            action = ?fields.action,
            key = ?fields.key,
            "{}",
            message
        );
    }
}

impl RenderLogger for StructuredLogger {
    fn verbose(&self, message: &str, fields: &LogFields) {
        self.write(LogLevel::Debug, message, fields, None);
    }

    fn error(&self, message: &str, error: &dyn std::error::Error, fields: &LogFields) {
        self.write(LogLevel::Error, message, fields, Some(error.to_string()));
    }
}

/// A log line captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLog {
    /// `Debug` for verbose lines, `Error` for failures.
    pub level: LogLevel,
    /// Message passed by the caller.
    pub message: String,
    /// Rendered error, for failures.
    pub error: Option<String>,
    /// Structured context.
    pub fields: LogFields,
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<CapturedLog>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines in order.
    pub fn entries(&self) -> Vec<CapturedLog> {
        lock(&self.entries).clone()
    }

    /// Captured failures.
    pub fn errors(&self) -> Vec<CapturedLog> {
        lock(&self.entries)
            .iter()
            .filter(|e| e.level == LogLevel::Error)
            .cloned()
            .collect()
    }

    /// Messages of captured verbose lines.
    pub fn verbose_messages(&self) -> Vec<String> {
        lock(&self.entries)
            .iter()
            .filter(|e| e.level == LogLevel::Debug)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Drop everything captured so far.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    fn push(&self, entry: CapturedLog) {
        lock(&self.entries).push(entry);
    }
}

impl RenderLogger for MemoryLogger {
    fn verbose(&self, message: &str, fields: &LogFields) {
        self.push(CapturedLog {
            level: LogLevel::Debug,
            message: message.to_string(),
            error: None,
            fields: fields.clone(),
        });
    }

    fn error(&self, message: &str, error: &dyn std::error::Error, fields: &LogFields) {
        self.push(CapturedLog {
            level: LogLevel::Error,
            message: message.to_string(),
            error: Some(error.to_string()),
            fields: fields.clone(),
        });
    }
}

fn lock(mutex: &Mutex<Vec<CapturedLog>>) -> MutexGuard<'_, Vec<CapturedLog>> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ssr_core::RequestContext;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream unavailable")]
    struct Upstream;

    // === Memory Logger Tests ===

    #[test]
    fn test_memory_logger_captures_in_order() {
        let logger = MemoryLogger::new();

        logger.verbose("cache lookup", &LogFields::new().with_cache("MISS"));
        logger.error("action", &Upstream, &LogFields::new().with_pass(1).with_action("product:42"));
        logger.verbose("final pass", &LogFields::new().with_pass(3));

        let entries = logger.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].error.as_deref(), Some("upstream unavailable"));
        assert_eq!(entries[1].fields.action.as_deref(), Some("product:42"));
        assert_eq!(logger.verbose_messages(), vec!["cache lookup", "final pass"]);
        assert_eq!(logger.errors().len(), 1);
    }

    #[test]
    fn test_clear() {
        let logger = MemoryLogger::new();
        logger.verbose("x", &LogFields::new());
        logger.clear();
        assert!(logger.entries().is_empty());
    }

    // === Structured Logger Tests ===

    #[test]
    fn test_loggers_are_object_safe() {
        let request = RequestContext::new("/");
        let loggers: Vec<Arc<dyn RenderLogger>> = vec![
            Arc::new(TracingLogger),
            Arc::new(MemoryLogger::new()),
            Arc::new(StructuredLogger::for_request(&request)),
        ];
        for logger in loggers {
            logger.verbose("ok", &LogFields::new());
            logger.error("final", &Upstream, &LogFields::new().with_pass(1));
        }
    }
}
