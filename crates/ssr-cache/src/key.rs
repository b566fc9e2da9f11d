//! Cache key composition.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters left unescaped when re-encoding a URL (URI, not component,
/// semantics: `/`, `?`, `&` and friends survive).
const URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

const DEFAULT_SEPARATOR: &str = "-";

/// A cache key uniquely identifying a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// The computed key string.
    key: String,
    /// Components that make up the key (for debugging).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<String>,
}

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            components: Vec::new(),
        }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Get the key components (for debugging).
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Device class used for cache variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    /// Read the device class from `settings.mobile` in the application state.
    pub fn from_state(state: &Value) -> Self {
        match state.pointer("/settings/mobile").and_then(Value::as_bool) {
            Some(true) => Self::Mobile,
            _ => Self::Desktop,
        }
    }

    /// Key segment for this class.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased browser name from `settings.userAgent.browser.name`.
pub fn browser_name(state: &Value) -> String {
    state
        .pointer("/settings/userAgent/browser/name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

/// Normalise a request URL for use in a cache key.
///
/// Decodes twice (double-encoded input), drops every character outside
/// `[-a-zA-Z0-9/)=?&_%:\s]`, then re-encodes.
pub fn normalize_url(url: &str) -> String {
    let once = percent_decode_str(url).decode_utf8_lossy();
    let twice = percent_decode_str(&once).decode_utf8_lossy();
    let safe: String = twice.chars().filter(|c| is_key_safe(*c)).collect();
    utf8_percent_encode(&safe, URI).to_string()
}

fn is_key_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '/' | ')' | '=' | '?' | '&' | '_' | '%' | ':')
        || c.is_whitespace()
}

/// Inputs available when deriving a key.
#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    /// Request locale.
    pub locale: Option<&'a str>,
    /// Raw request URL.
    pub url: &'a str,
    /// Application state.
    pub state: &'a Value,
}

/// Component of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyComponent {
    /// Request locale.
    Locale,
    /// Device class from state.
    Device,
    /// Normalised request URL.
    Url,
    /// Browser name from state.
    Browser,
    /// Custom static value.
    Custom(String),
}

/// Builder for composing cache keys.
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    components: Vec<KeyComponent>,
    separator: String,
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl CacheKeyBuilder {
    /// Create a new cache key builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key used by store renders: `locale-device-url-browser`.
    pub fn store_default() -> Self {
        Self::new().locale().device().url().browser()
    }

    /// Set the component separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Include the request locale.
    pub fn locale(mut self) -> Self {
        self.components.push(KeyComponent::Locale);
        self
    }

    /// Include the device class.
    pub fn device(mut self) -> Self {
        self.components.push(KeyComponent::Device);
        self
    }

    /// Include the normalised URL.
    pub fn url(mut self) -> Self {
        self.components.push(KeyComponent::Url);
        self
    }

    /// Include the browser name.
    pub fn browser(mut self) -> Self {
        self.components.push(KeyComponent::Browser);
        self
    }

    /// Include a custom static value.
    pub fn custom(mut self, value: impl Into<String>) -> Self {
        self.components.push(KeyComponent::Custom(value.into()));
        self
    }

    /// Build the cache key from context. Missing values become empty segments.
    pub fn build(&self, ctx: &KeyContext<'_>) -> CacheKey {
        let mut parts = Vec::with_capacity(self.components.len());
        let mut component_descs = Vec::with_capacity(self.components.len());

        for component in &self.components {
            let (part, desc) = match component {
                KeyComponent::Locale => {
                    let locale = ctx.locale.unwrap_or_default().to_string();
                    let desc = format!("locale:{}", locale);
                    (locale, desc)
                }
                KeyComponent::Device => {
                    let device = DeviceClass::from_state(ctx.state);
                    (device.to_string(), format!("device:{}", device))
                }
                KeyComponent::Url => {
                    let url = normalize_url(ctx.url);
                    let desc = format!("url:{}", url);
                    (url, desc)
                }
                KeyComponent::Browser => {
                    let browser = browser_name(ctx.state);
                    let desc = format!("browser:{}", browser);
                    (browser, desc)
                }
                KeyComponent::Custom(value) => (value.clone(), format!("custom:{}", value)),
            };
            parts.push(part);
            component_descs.push(desc);
        }

        CacheKey {
            key: parts.join(&self.separator),
            components: component_descs,
        }
    }
}
