//! Document head metadata collected during a render.

/// A `<meta>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    /// Attribute name, usually `name` or `property`.
    pub attribute: String,
    /// Attribute value.
    pub key: String,
    /// Tag content.
    pub content: String,
}

/// A `<link>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTag {
    /// Link relation (e.g. "canonical", "stylesheet").
    pub rel: String,
    /// Link target.
    pub href: String,
}

/// Per-render accumulator for head tags emitted by views.
///
/// Each render pass gets a fresh collector, so concurrent requests never
/// see each other's tags.
#[derive(Debug, Clone, Default)]
pub struct HeadCollector {
    title: Option<String>,
    meta: Vec<MetaTag>,
    links: Vec<LinkTag>,
}

impl HeadCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page title. The last view to set it wins.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Add a `<meta name=...>` tag.
    pub fn add_meta(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.meta.push(MetaTag {
            attribute: "name".to_string(),
            key: name.into(),
            content: content.into(),
        });
    }

    /// Add a `<meta property=...>` tag (Open Graph style).
    pub fn add_meta_property(&mut self, property: impl Into<String>, content: impl Into<String>) {
        self.meta.push(MetaTag {
            attribute: "property".to_string(),
            key: property.into(),
            content: content.into(),
        });
    }

    /// Add a `<link>` tag.
    pub fn add_link(&mut self, rel: impl Into<String>, href: impl Into<String>) {
        self.links.push(LinkTag {
            rel: rel.into(),
            href: href.into(),
        });
    }

    /// The collected title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Render the title tag, or an empty string when no title was set.
    pub fn title_html(&self) -> String {
        self.title
            .as_ref()
            .map(|t| format!("<title>{}</title>", escape(t)))
            .unwrap_or_default()
    }

    /// Render all meta tags.
    pub fn meta_html(&self) -> String {
        self.meta
            .iter()
            .map(|m| {
                format!(
                    r#"<meta {}="{}" content="{}">"#,
                    m.attribute,
                    escape(&m.key),
                    escape(&m.content)
                )
            })
            .collect()
    }

    /// Render all link tags.
    pub fn link_html(&self) -> String {
        self.links
            .iter()
            .map(|l| format!(r#"<link rel="{}" href="{}">"#, escape(&l.rel), escape(&l.href)))
            .collect()
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
