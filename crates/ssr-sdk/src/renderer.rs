//! The render entry point.

use std::sync::Arc;

use serde_json::Value;
use ssr_cache::{CacheKey, CacheMarker, CacheStatus, LruResponseCache, ResponseCacheBackend, ResponseCachePolicy};
use ssr_core::{BundleManifest, LifecyclePhase, RenderError, RenderResult, RequestContext, SsrConfig, DEFAULT_MAX_RENDER_PASSES};
use ssr_data::{ActionCaller, ImmediateCaller};
use ssr_executor::{RenderLoop, ResultHandler, View};
use ssr_observability::{LogFields, RenderLogger, TracingLogger};

use crate::strategy::{DispatchInput, RenderStrategy};

/// Everything a render needs besides the strategy.
///
/// Every collaborator is shared, so options can be cloned per request while
/// the response cache stays common to all of them.
pub struct RenderOptions<C> {
    view: Arc<dyn View<C>>,
    policy: ResponseCachePolicy,
    cache: Arc<dyn ResponseCacheBackend>,
    marker: CacheMarker,
    manifest: Option<Arc<dyn BundleManifest>>,
    logger: Arc<dyn RenderLogger>,
    caller: Arc<dyn ActionCaller<C>>,
    result_handler: Option<ResultHandler>,
    max_passes: Option<usize>,
    forwarded_headers: Vec<String>,
}

impl<C> RenderOptions<C>
where
    C: Send + Sync + 'static,
{
    /// Options rendering `view` with caching disabled.
    pub fn new(view: Arc<dyn View<C>>) -> Self {
        let policy = ResponseCachePolicy::none();
        Self {
            view,
            cache: Arc::new(LruResponseCache::from_policy(&policy)),
            policy,
            marker: CacheMarker::default(),
            manifest: None,
            logger: Arc::new(TracingLogger),
            caller: Arc::new(ImmediateCaller),
            result_handler: None,
            max_passes: Some(DEFAULT_MAX_RENDER_PASSES),
            forwarded_headers: Vec::new(),
        }
    }

    /// Options built from configuration.
    pub fn from_config(view: Arc<dyn View<C>>, config: &SsrConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let policy = ResponseCachePolicy::from_config(config);
        Ok(Self {
            cache: Arc::new(LruResponseCache::from_policy(&policy)),
            policy,
            marker: CacheMarker::from_config(config)?,
            max_passes: config.max_render_passes,
            forwarded_headers: config.forwarded_headers.clone(),
            ..Self::new(view)
        })
    }
}

impl<C> RenderOptions<C> {
    /// Enable or disable caching.
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.policy.enabled = enabled;
        self
    }

    /// Replace the cache policy.
    pub fn with_policy(mut self, policy: ResponseCachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Store responses in `cache`. Share one backend between requests.
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCacheBackend>) -> Self {
        self.cache = cache;
        self
    }

    /// Resolve bundles for captured modules through `manifest`.
    pub fn with_manifest(mut self, manifest: Arc<dyn BundleManifest>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Send diagnostics to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn RenderLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Invoke actions through `caller`.
    pub fn with_caller(mut self, caller: Arc<dyn ActionCaller<C>>) -> Self {
        self.caller = caller;
        self
    }

    /// Pass every action output through `handler`.
    pub fn with_result_handler(mut self, handler: ResultHandler) -> Self {
        self.result_handler = Some(handler);
        self
    }

    /// Bound the render loop. `None` removes the bound.
    pub fn with_max_passes(mut self, max_passes: Option<usize>) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Forward these request headers to actions in addition to the strategy's.
    pub fn with_forwarded_headers(mut self, headers: Vec<String>) -> Self {
        self.forwarded_headers = headers;
        self
    }

    /// The cache policy in effect.
    pub fn policy(&self) -> &ResponseCachePolicy {
        &self.policy
    }
}

impl<C> Clone for RenderOptions<C> {
    fn clone(&self) -> Self {
        Self {
            view: Arc::clone(&self.view),
            policy: self.policy.clone(),
            cache: Arc::clone(&self.cache),
            marker: self.marker.clone(),
            manifest: self.manifest.clone(),
            logger: Arc::clone(&self.logger),
            caller: Arc::clone(&self.caller),
            result_handler: self.result_handler.clone(),
            max_passes: self.max_passes,
            forwarded_headers: self.forwarded_headers.clone(),
        }
    }
}

/// Renders requests with a strategy.
pub struct Renderer<S: RenderStrategy> {
    strategy: S,
    options: RenderOptions<S::Context>,
}

impl<S: RenderStrategy> Renderer<S> {
    /// Create a renderer.
    pub fn new(strategy: S, options: RenderOptions<S::Context>) -> Self {
        Self { strategy, options }
    }

    /// The strategy in use.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Render one request.
    ///
    /// Serves from the cache when possible, otherwise runs the render loop,
    /// assembles the result and stores it if the request was anonymous and
    /// nothing failed. Failures inside the loop only show up in the response
    /// status and the logger; the errors returned here are a missing cache key
    /// and a loop that never settles.
    pub async fn render(&self, request: &mut RequestContext) -> Result<RenderResult, RenderError> {
        self.render_request(request, None).await
    }

    /// Render one request starting from `app_state` instead of the
    /// strategy's default state.
    pub async fn render_with_state(
        &self,
        request: &mut RequestContext,
        app_state: Value,
    ) -> Result<RenderResult, RenderError> {
        self.render_request(request, Some(app_state)).await
    }

    async fn render_request(
        &self,
        request: &mut RequestContext,
        app_state: Option<Value>,
    ) -> Result<RenderResult, RenderError> {
        let options = &self.options;
        let input = DispatchInput {
            forwarded_headers: &options.forwarded_headers,
            app_state,
        };
        let cx = self.strategy.dispatch_context(request, input);
        let key = self.strategy.cache_key(request, &cx);
        if options.policy.enabled && key.is_none() {
            return Err(RenderError::MissingCacheKey);
        }

        let authenticated = request.is_authenticated();

        request.timing.mark_phase_start(&LifecyclePhase::CacheLookup);
        let (status, cached) = self.lookup(key.as_ref(), authenticated).await;
        request.timing.mark_phase_end(&LifecyclePhase::CacheLookup);

        options.marker.apply(request, status);
        let mut fields = LogFields::new().with_cache(status);
        if let Some(key) = &key {
            fields = fields.with_key(key.as_str());
        }
        options.logger.verbose(&format!("{} cache lookup", self.strategy.name()), &fields);
        if let Some(hit) = cached {
            return Ok(hit);
        }

        let outcome = RenderLoop::new(
            options.view.as_ref(),
            &cx,
            options.caller.as_ref(),
            options.logger.as_ref(),
        )
        .with_result_handler(options.result_handler.as_ref())
        .with_max_passes(options.max_passes)
        .run(request)
        .await?;

        request.timing.mark_phase_start(&LifecyclePhase::Completion);
        let bundles = match &options.manifest {
            Some(manifest) => self.strategy.select_bundles(manifest.resolve(&outcome.modules)),
            None => Vec::new(),
        };
        let result = self
            .strategy
            .finish(RenderResult::assemble(outcome.markup, &outcome.head, bundles), &cx);

        if let Some(key) = key {
            if options.policy.allows_store(authenticated, outcome.found_error) {
                let fields = LogFields::new().with_key(key.as_str());
                match options.cache.set(&key, result.clone()).await {
                    Ok(()) => options.logger.verbose("cache store", &fields),
                    Err(error) => options.logger.error("cache store", &error, &fields),
                }
            }
        }
        request.timing.mark_phase_end(&LifecyclePhase::Completion);

        Ok(result)
    }

    async fn lookup(&self, key: Option<&CacheKey>, authenticated: bool) -> (CacheStatus, Option<RenderResult>) {
        let options = &self.options;
        let key = match key {
            Some(key) if options.policy.allows_lookup(authenticated) => key,
            _ => return (CacheStatus::Bypass, None),
        };

        match options.cache.get(key).await {
            Ok(Some(hit)) => (CacheStatus::Hit, Some(hit)),
            Ok(None) => (CacheStatus::Miss, None),
            Err(error) => {
                options.logger.error("cache lookup", &error, &LogFields::new().with_key(key.as_str()));
                (CacheStatus::Miss, None)
            }
        }
    }
}
