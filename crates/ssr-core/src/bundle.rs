//! Resolution of lazily loaded modules to client asset bundles.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bundle identifier as emitted by the bundler (numeric or named chunk id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleId {
    Number(u64),
    Name(String),
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Name(s) => write!(f, "{}", s),
        }
    }
}

/// A client asset required by the rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDescriptor {
    /// Chunk id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BundleId>,
    /// Chunk name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Asset file name.
    pub file: String,
    /// Public URL of the asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,
}

impl BundleDescriptor {
    /// Create a descriptor for a file.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            id: None,
            name: None,
            file: file.into(),
            public_path: None,
        }
    }

    /// Set the chunk id.
    pub fn with_id(mut self, id: BundleId) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether this asset is a script (source maps and styles are not).
    pub fn is_script(&self) -> bool {
        self.file.ends_with(".js")
    }
}

/// Maps module identifiers captured during the final render to assets.
pub trait BundleManifest: Send + Sync {
    /// Resolve modules to their assets, in module order.
    fn resolve(&self, modules: &[String]) -> Vec<BundleDescriptor>;
}

/// Manifest in the loadable stats format: `{ "<module>": [descriptor, ...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadableManifest {
    modules: HashMap<String, Vec<BundleDescriptor>>,
}

impl LoadableManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from its JSON stats document.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Register the assets for a module.
    pub fn with_module(mut self, module: impl Into<String>, bundles: Vec<BundleDescriptor>) -> Self {
        self.modules.insert(module.into(), bundles);
        self
    }
}

impl BundleManifest for LoadableManifest {
    fn resolve(&self, modules: &[String]) -> Vec<BundleDescriptor> {
        modules
            .iter()
            .filter_map(|m| self.modules.get(m))
            .flatten()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str = r#"{
        "ProductPage": [
            { "id": 3, "name": "./src/ProductPage.js", "file": "productpage.abc123.js", "publicPath": "/dist/productpage.abc123.js" },
            { "id": 3, "name": "./src/ProductPage.js", "file": "productpage.abc123.js.map", "publicPath": "/dist/productpage.abc123.js.map" }
        ],
        "Cart": [
            { "id": "cart", "file": "cart.js" }
        ]
    }"#;

    #[test]
    fn test_parse_loadable_stats() {
        let manifest = LoadableManifest::from_json(STATS).unwrap();
        let bundles = manifest.resolve(&["ProductPage".to_string()]);

        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].id, Some(BundleId::Number(3)));
        assert_eq!(bundles[0].public_path.as_deref(), Some("/dist/productpage.abc123.js"));
    }

    #[test]
    fn test_resolve_preserves_module_order_and_skips_unknown() {
        let manifest = LoadableManifest::from_json(STATS).unwrap();
        let bundles = manifest.resolve(&[
            "Cart".to_string(),
            "Unknown".to_string(),
            "ProductPage".to_string(),
        ]);

        let files: Vec<&str> = bundles.iter().map(|b| b.file.as_str()).collect();
        assert_eq!(
            files,
            vec!["cart.js", "productpage.abc123.js", "productpage.abc123.js.map"]
        );
        assert_eq!(bundles[0].id, Some(BundleId::Name("cart".to_string())));
    }

    #[test]
    fn test_is_script() {
        assert!(BundleDescriptor::new("a.js").is_script());
        assert!(!BundleDescriptor::new("a.js.map").is_script());
        assert!(!BundleDescriptor::new("a.css").is_script());
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(matches!(
            LoadableManifest::from_json("[1, 2]"),
            Err(ConfigError::Manifest(_))
        ));
    }
}
