//! Views and the per-pass render scope.

use std::sync::Arc;

use futures::future::BoxFuture;
use ssr_core::{HeadCollector, RequestContext, ViewError};
use ssr_data::{FetchAction, FetchRegistrar};

/// A renderable component tree.
///
/// Rendering is synchronous and must be repeatable: the render loop calls
/// `render` once per pass, each time against whatever state the resolved
/// actions have produced so far.
pub trait View<C>: Send + Sync {
    /// Render the tree into markup.
    fn render(&self, scope: &mut RenderScope<'_, C>) -> Result<String, ViewError>;

    /// Load lazily split code before the first pass.
    fn preload(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

impl<C, V> View<C> for Arc<V>
where
    V: View<C> + ?Sized,
{
    fn render(&self, scope: &mut RenderScope<'_, C>) -> Result<String, ViewError> {
        (**self).render(scope)
    }

    fn preload(&self) -> BoxFuture<'_, ()> {
        (**self).preload()
    }
}

/// Everything a view can reach while rendering one pass.
///
/// Passed down the tree explicitly so nested components can register fetch
/// dependencies, set head tags and report lazily loaded modules without any
/// process-wide state.
pub struct RenderScope<'a, C> {
    cx: &'a C,
    request: &'a mut RequestContext,
    registrar: &'a mut dyn FetchRegistrar<C>,
    head: &'a mut HeadCollector,
    modules: Option<&'a mut Vec<String>>,
}

impl<'a, C> RenderScope<'a, C> {
    /// Create a scope without module capture.
    pub fn new(
        cx: &'a C,
        request: &'a mut RequestContext,
        registrar: &'a mut dyn FetchRegistrar<C>,
        head: &'a mut HeadCollector,
    ) -> Self {
        Self {
            cx,
            request,
            registrar,
            head,
            modules: None,
        }
    }

    /// Record every module reported during this pass into `modules`.
    pub fn capturing_modules(mut self, modules: &'a mut Vec<String>) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Dispatch context shared with fetch actions.
    pub fn context(&self) -> &C {
        self.cx
    }

    /// The request being rendered.
    pub fn request(&self) -> &RequestContext {
        &*self.request
    }

    /// Mutable access for response side effects (status, redirect).
    pub fn request_mut(&mut self) -> &mut RequestContext {
        &mut *self.request
    }

    /// Register a data dependency under `name` and optional `id`.
    pub fn register_fetch(&mut self, action: Arc<dyn FetchAction<C>>, name: &str, id: Option<&str>) {
        self.registrar.register(action, name, id);
    }

    /// Head tags for this pass.
    pub fn head(&mut self) -> &mut HeadCollector {
        &mut *self.head
    }

    /// Report that a lazily loaded module was rendered.
    ///
    /// Ignored unless this pass captures modules.
    pub fn report_module(&mut self, module: impl Into<String>) {
        if let Some(modules) = self.modules.as_deref_mut() {
            modules.push(module.into());
        }
    }
}
