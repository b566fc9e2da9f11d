//! Markup fallback for failed render passes.

use ssr_core::HeadCollector;

/// Keeps the output of the most recent successful pass.
///
/// A failed pass never overwrites it, so the request can still return the
/// best markup produced so far.
#[derive(Debug, Clone, Default)]
pub struct MarkupFallback {
    markup: Option<String>,
    head: HeadCollector,
}

impl MarkupFallback {
    /// Create an empty fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful pass.
    pub fn record(&mut self, markup: String, head: HeadCollector) {
        self.markup = Some(markup);
        self.head = head;
    }

    /// Markup and head of the last successful pass. Markup is empty if no
    /// pass ever succeeded.
    pub fn into_parts(self) -> (String, HeadCollector) {
        (self.markup.unwrap_or_default(), self.head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_when_nothing_succeeded() {
        let (markup, head) = MarkupFallback::new().into_parts();
        assert_eq!(markup, "");
        assert_eq!(head.title(), None);
    }

    #[test]
    fn test_latest_success_wins() {
        let mut fallback = MarkupFallback::new();
        let mut head = HeadCollector::new();
        head.set_title("Second");

        fallback.record("<p>1</p>".to_string(), HeadCollector::new());
        fallback.record("<p>2</p>".to_string(), head);

        let (markup, head) = fallback.into_parts();
        assert_eq!(markup, "<p>2</p>");
        assert_eq!(head.title(), Some("Second"));
    }
}
