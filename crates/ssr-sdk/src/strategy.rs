//! Render strategies.
//!
//! A strategy decides what differs between deployments of the renderer:
//! what fetch actions receive, how the cache key is derived, which bundles
//! reach the page and whether application state is shipped with it.

use std::collections::HashSet;

use serde_json::Value;
use ssr_cache::{CacheKey, CacheKeyBuilder, KeyContext};
use ssr_core::{BundleDescriptor, RenderResult, RequestContext};
use ssr_data::{CombinedReducer, FetchOptions, Store};

/// Per-request inputs the renderer hands to a strategy.
#[derive(Debug, Default)]
pub struct DispatchInput<'a> {
    /// Headers forwarded to actions on top of the strategy's own set.
    pub forwarded_headers: &'a [String],
    /// State this request starts from, in place of the strategy's default.
    pub app_state: Option<Value>,
}

/// Variant-specific parts of a render.
pub trait RenderStrategy: Send + Sync {
    /// Context handed to every fetch action.
    type Context: Clone + Send + Sync + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Build the dispatch context for one request.
    fn dispatch_context(&self, request: &RequestContext, input: DispatchInput<'_>) -> Self::Context;

    /// Key identifying this request's response, if one can be derived.
    fn cache_key(&self, request: &RequestContext, cx: &Self::Context) -> Option<CacheKey>;

    /// Narrow the bundles resolved from the captured modules.
    fn select_bundles(&self, bundles: Vec<BundleDescriptor>) -> Vec<BundleDescriptor>;

    /// Last touches on the assembled result.
    fn finish(&self, result: RenderResult, _cx: &Self::Context) -> RenderResult {
        result
    }
}

/// What fetch actions receive under [`SimpleStrategy`].
#[derive(Debug, Clone)]
pub struct SimpleContext {
    /// Caller-supplied arguments.
    pub arguments: Value,
    /// Every request header, for actions calling back into the site.
    pub fetch_options: FetchOptions,
}

/// No state container: the caller supplies the cache key and the action
/// arguments, every request header is forwarded and only script bundles are
/// kept.
#[derive(Debug, Clone, Default)]
pub struct SimpleStrategy {
    cache_key: Option<String>,
    arguments: Value,
}

impl SimpleStrategy {
    /// Create a strategy without key or arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache the response under `key`. Required when caching is enabled.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Arguments passed to every fetch action.
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }
}

impl RenderStrategy for SimpleStrategy {
    type Context = SimpleContext;

    fn name(&self) -> &'static str {
        "simple"
    }

    /// Per-request state replaces the configured arguments. Every header is
    /// forwarded already, so extra header names change nothing.
    fn dispatch_context(&self, request: &RequestContext, input: DispatchInput<'_>) -> SimpleContext {
        SimpleContext {
            arguments: input.app_state.unwrap_or_else(|| self.arguments.clone()),
            fetch_options: FetchOptions::forward_all(&request.headers),
        }
    }

    fn cache_key(&self, _request: &RequestContext, _cx: &SimpleContext) -> Option<CacheKey> {
        self.cache_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| CacheKey::new(key))
    }

    fn select_bundles(&self, bundles: Vec<BundleDescriptor>) -> Vec<BundleDescriptor> {
        bundles.into_iter().filter(BundleDescriptor::is_script).collect()
    }
}

/// What fetch actions receive under [`StoreStrategy`].
#[derive(Debug, Clone)]
pub struct StoreContext {
    /// Store for this request; dispatch to it and read state from it.
    pub store: Store,
    /// Cookies, user agent, host and `x-` headers from the request.
    pub fetch_options: FetchOptions,
}

/// State container per request: key derived from locale, device, URL and
/// browser, restricted header forwarding, bundles deduplicated by id and the
/// final state shipped with the result.
#[derive(Debug, Clone)]
pub struct StoreStrategy {
    reducer: CombinedReducer,
    preloaded: Value,
    key_builder: CacheKeyBuilder,
    forwarded_headers: Vec<String>,
}

impl StoreStrategy {
    /// Create a strategy whose store starts from `preloaded` unless a request
    /// brings its own state.
    pub fn new(reducer: CombinedReducer, preloaded: Value) -> Self {
        Self {
            reducer,
            preloaded,
            key_builder: CacheKeyBuilder::store_default(),
            forwarded_headers: Vec::new(),
        }
    }

    /// Derive keys with a different builder.
    pub fn with_key_builder(mut self, builder: CacheKeyBuilder) -> Self {
        self.key_builder = builder;
        self
    }

    /// Forward these headers in addition to the default set.
    pub fn with_forwarded_headers(mut self, headers: Vec<String>) -> Self {
        self.forwarded_headers = headers;
        self
    }
}

impl RenderStrategy for StoreStrategy {
    type Context = StoreContext;

    fn name(&self) -> &'static str {
        "store"
    }

    fn dispatch_context(&self, request: &RequestContext, input: DispatchInput<'_>) -> StoreContext {
        let preloaded = input.app_state.unwrap_or_else(|| self.preloaded.clone());
        let forwarded = [self.forwarded_headers.as_slice(), input.forwarded_headers].concat();
        StoreContext {
            store: Store::new(self.reducer.clone(), preloaded),
            fetch_options: FetchOptions::forward_selected(&request.headers, &forwarded),
        }
    }

    fn cache_key(&self, request: &RequestContext, cx: &StoreContext) -> Option<CacheKey> {
        let key = cx.store.select(|state| {
            self.key_builder.build(&KeyContext {
                locale: request.locale.as_deref(),
                url: &request.url,
                state,
            })
        });
        Some(key)
    }

    fn select_bundles(&self, bundles: Vec<BundleDescriptor>) -> Vec<BundleDescriptor> {
        let mut seen = HashSet::new();
        bundles
            .into_iter()
            .filter(|bundle| {
                let identity = match &bundle.id {
                    Some(id) => id.to_string(),
                    None => bundle.file.clone(),
                };
                seen.insert(identity)
            })
            .collect()
    }

    fn finish(&self, result: RenderResult, cx: &StoreContext) -> RenderResult {
        result.with_app_state(cx.store.state())
    }
}

#[cfg(test)]
mod tests {
    use http::header::{HeaderName, HeaderValue};
    use serde_json::json;
    use ssr_core::BundleId;
    use ssr_data::Action;

    use super::*;

    fn request() -> RequestContext {
        RequestContext::new("/products")
            .with_locale("se")
            .with_header(HeaderName::from_static("cookie"), HeaderValue::from_static("sid=1"))
            .with_header(HeaderName::from_static("accept"), HeaderValue::from_static("text/html"))
            .with_header(HeaderName::from_static("x-site-id"), HeaderValue::from_static("site"))
    }

    // === Simple Strategy Tests ===

    #[test]
    fn test_simple_forwards_every_header() {
        let strategy = SimpleStrategy::new().with_arguments(json!({ "api": "https://api" }));
        let cx = strategy.dispatch_context(&request(), DispatchInput::default());

        assert_eq!(cx.arguments["api"], "https://api");
        assert_eq!(cx.fetch_options.header("accept"), Some("text/html"));
        assert_eq!(cx.fetch_options.header("cookie"), Some("sid=1"));
    }

    #[test]
    fn test_simple_request_state_replaces_arguments() {
        let strategy = SimpleStrategy::new().with_arguments(json!({ "api": "https://api" }));
        let input = DispatchInput {
            app_state: Some(json!({ "api": "https://staging" })),
            ..DispatchInput::default()
        };
        let cx = strategy.dispatch_context(&request(), input);

        assert_eq!(cx.arguments["api"], "https://staging");
    }

    #[test]
    fn test_simple_key_is_caller_supplied() {
        let request = request();
        let keyed = SimpleStrategy::new().with_cache_key("home");
        let cx = keyed.dispatch_context(&request, DispatchInput::default());
        assert_eq!(keyed.cache_key(&request, &cx), Some(CacheKey::new("home")));

        let empty = SimpleStrategy::new().with_cache_key("");
        assert_eq!(empty.cache_key(&request, &cx), None);
    }

    #[test]
    fn test_simple_keeps_only_scripts() {
        let bundles = vec![
            BundleDescriptor::new("productpage.abc123.js"),
            BundleDescriptor::new("productpage.abc123.js.map"),
            BundleDescriptor::new("productpage.abc123.css"),
        ];
        let kept = SimpleStrategy::new().select_bundles(bundles);

        let files: Vec<&str> = kept.iter().map(|b| b.file.as_str()).collect();
        assert_eq!(files, vec!["productpage.abc123.js"]);
    }

    // === Store Strategy Tests ===

    fn store_strategy() -> StoreStrategy {
        let reducer = CombinedReducer::new().with_slice("products", |state: &Value, action: &Action| {
            match action.kind.as_str() {
                "products/loaded" => action.payload.clone(),
                _ if state.is_null() => json!([]),
                _ => state.clone(),
            }
        });
        StoreStrategy::new(
            reducer,
            json!({
                "settings": {
                    "mobile": true,
                    "userAgent": { "browser": { "name": "Chrome" } }
                }
            }),
        )
    }

    #[test]
    fn test_store_key_from_request_and_state() {
        let strategy = store_strategy();
        let request = request();
        let cx = strategy.dispatch_context(&request, DispatchInput::default());

        let key = strategy.cache_key(&request, &cx).unwrap();
        assert_eq!(key.as_str(), "se-mobile-/products-chrome");
    }

    #[test]
    fn test_store_forwards_selected_headers() {
        let strategy = store_strategy();
        let cx = strategy.dispatch_context(&request(), DispatchInput::default());

        assert_eq!(cx.fetch_options.header("cookie"), Some("sid=1"));
        assert_eq!(cx.fetch_options.header("x-site-id"), Some("site"));
        assert_eq!(cx.fetch_options.header("accept"), None);
    }

    #[test]
    fn test_store_forwards_renderer_headers() {
        let strategy = store_strategy().with_forwarded_headers(vec!["accept".to_string()]);
        let request = request().with_header(
            HeaderName::from_static("accept-language"),
            HeaderValue::from_static("sv"),
        );
        let forwarded = vec!["Accept-Language".to_string()];
        let cx = strategy.dispatch_context(
            &request,
            DispatchInput {
                forwarded_headers: &forwarded,
                app_state: None,
            },
        );

        assert_eq!(cx.fetch_options.header("accept"), Some("text/html"));
        assert_eq!(cx.fetch_options.header("accept-language"), Some("sv"));
    }

    #[test]
    fn test_request_state_replaces_preloaded() {
        let strategy = store_strategy();
        let request = request();
        let cx = strategy.dispatch_context(
            &request,
            DispatchInput {
                app_state: Some(json!({ "settings": { "mobile": false } })),
                ..DispatchInput::default()
            },
        );

        assert_eq!(cx.store.state()["settings"]["mobile"], json!(false));
        let key = strategy.cache_key(&request, &cx).unwrap();
        assert_eq!(key.as_str(), "se-desktop-/products-");
    }

    #[test]
    fn test_each_request_gets_a_fresh_store() {
        let strategy = store_strategy();
        let first = strategy.dispatch_context(&request(), DispatchInput::default());
        first
            .store
            .dispatch(Action::new("products/loaded").with_payload(json!(["shoe"])));
        let second = strategy.dispatch_context(&request(), DispatchInput::default());

        assert_eq!(second.store.state()["products"], json!([]));
        assert_eq!(second.store.state()["settings"]["mobile"], json!(true));
    }

    #[test]
    fn test_store_dedupes_by_id() {
        let bundles = vec![
            BundleDescriptor::new("vendor.js").with_id(BundleId::Number(1)),
            BundleDescriptor::new("vendor.js").with_id(BundleId::Number(1)),
            BundleDescriptor::new("vendor.js.map").with_id(BundleId::Number(2)),
            BundleDescriptor::new("page.js"),
        ];
        let kept = store_strategy().select_bundles(bundles);

        let files: Vec<&str> = kept.iter().map(|b| b.file.as_str()).collect();
        assert_eq!(files, vec!["vendor.js", "vendor.js.map", "page.js"]);
    }

    #[test]
    fn test_store_result_carries_state() {
        let strategy = store_strategy();
        let cx = strategy.dispatch_context(&request(), DispatchInput::default());
        let result = strategy.finish(
            RenderResult::assemble(String::new(), &ssr_core::HeadCollector::new(), Vec::new()),
            &cx,
        );

        assert_eq!(result.app_state.unwrap()["products"], json!([]));
    }
}
