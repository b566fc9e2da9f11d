//! Assembled render output.

use serde::{Deserialize, Serialize};

use crate::bundle::BundleDescriptor;
use crate::head::HeadCollector;

/// The output of a render, and the shape stored in the response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    /// Rendered markup.
    pub markup: String,
    /// Client bundles needed by the page.
    pub bundles: Vec<BundleDescriptor>,
    /// Serialized `<title>` tag.
    pub title: String,
    /// Serialized `<link>` tags.
    pub link: String,
    /// Serialized `<meta>` tags.
    pub meta: String,
    /// Final application state, for stores that hydrate on the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_state: Option<serde_json::Value>,
}

impl RenderResult {
    /// Assemble a result from markup, head tags and bundles.
    pub fn assemble(markup: String, head: &HeadCollector, bundles: Vec<BundleDescriptor>) -> Self {
        Self {
            markup,
            bundles,
            title: head.title_html(),
            link: head.link_html(),
            meta: head.meta_html(),
            app_state: None,
        }
    }

    /// Attach a state snapshot.
    pub fn with_app_state(mut self, state: serde_json::Value) -> Self {
        self.app_state = Some(state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_serializes_head() {
        let mut head = HeadCollector::new();
        head.set_title("Products");
        head.add_link("canonical", "/products");

        let result = RenderResult::assemble("<div/>".to_string(), &head, Vec::new());

        assert_eq!(result.title, "<title>Products</title>");
        assert_eq!(result.link, r#"<link rel="canonical" href="/products">"#);
        assert_eq!(result.meta, "");
        assert!(result.app_state.is_none());
    }

    #[test]
    fn test_app_state_omitted_from_json_when_absent() {
        let result = RenderResult::assemble(String::new(), &HeadCollector::new(), Vec::new());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("appState").is_none());

        let with_state = result.with_app_state(serde_json::json!({ "cart": [] }));
        let json = serde_json::to_value(&with_state).unwrap();
        assert_eq!(json["appState"], serde_json::json!({ "cart": [] }));
    }
}
