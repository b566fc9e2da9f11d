//! The fixed-point render loop.
//!
//! Rendering discovers data dependencies; resolving them changes state;
//! rendering again under the new state may discover more. The loop
//! alternates the two until a render registers nothing new, then performs
//! one final pass with module capture enabled.

use std::sync::Arc;

use http::StatusCode;
use ssr_core::{HeadCollector, LifecyclePhase, RenderError, RequestContext, ViewError, DEFAULT_MAX_RENDER_PASSES};
use ssr_data::{ActionCaller, ActionOutput, FetchError, PendingActions};
use ssr_observability::{LogFields, RenderLogger};

use crate::fallback::MarkupFallback;
use crate::view::{RenderScope, View};

/// Hook receiving each action's output once it has resolved.
///
/// An error counts as a failure of that action.
pub type ResultHandler = Arc<dyn Fn(ActionOutput, &mut RequestContext) -> Result<(), FetchError> + Send + Sync>;

/// An action that completed, and the pass it completed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    /// Loop pass, starting at 1.
    pub pass: usize,
    /// Registry key.
    pub key: String,
}

/// What the loop produced.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Final markup (or the last successful loop markup).
    pub markup: String,
    /// Head tags of the pass the markup came from.
    pub head: HeadCollector,
    /// Modules reported during the final pass.
    pub modules: Vec<String>,
    /// Whether any action or render failed.
    pub found_error: bool,
    /// Number of loop passes, excluding the final pass.
    pub passes: usize,
    /// Actions in the order they resolved.
    pub resolved: Vec<ResolvedAction>,
}

/// Drives one request's render to a fixed point.
pub struct RenderLoop<'a, C> {
    view: &'a dyn View<C>,
    cx: &'a C,
    caller: &'a dyn ActionCaller<C>,
    logger: &'a dyn RenderLogger,
    on_result: Option<&'a ResultHandler>,
    max_passes: Option<usize>,
}

impl<'a, C> RenderLoop<'a, C>
where
    C: Send + Sync,
{
    /// Create a loop rendering `view` with actions dispatched against `cx`.
    pub fn new(
        view: &'a dyn View<C>,
        cx: &'a C,
        caller: &'a dyn ActionCaller<C>,
        logger: &'a dyn RenderLogger,
    ) -> Self {
        Self {
            view,
            cx,
            caller,
            logger,
            on_result: None,
            max_passes: Some(DEFAULT_MAX_RENDER_PASSES),
        }
    }

    /// Pass every resolved action's output through `handler`.
    pub fn with_result_handler(mut self, handler: Option<&'a ResultHandler>) -> Self {
        self.on_result = handler;
        self
    }

    /// Bound the number of loop passes. `None` removes the bound.
    pub fn with_max_passes(mut self, max_passes: Option<usize>) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Run the loop and the final pass.
    ///
    /// Action and render failures are absorbed into the response status and
    /// the logger. The only error returned is [`RenderError::RenderLoopLimit`].
    pub async fn run(&self, request: &mut RequestContext) -> Result<RenderOutcome, RenderError> {
        let mut actions = PendingActions::new();
        let mut fallback = MarkupFallback::new();
        let mut resolved = Vec::new();
        let mut previous_len: Option<usize> = None;
        let mut found_error = false;
        let mut passes = 0;

        self.view.preload().await;

        while previous_len.map_or(true, |prev| actions.len() > prev) {
            if let Some(limit) = self.max_passes {
                if passes >= limit {
                    return Err(RenderError::RenderLoopLimit { passes });
                }
            }
            passes += 1;

            let phase = LifecyclePhase::ActionPass(passes);
            request.timing.mark_phase_start(&phase);
            let outcome = self.resolve_pending(&mut actions, request, passes, &mut resolved).await;
            request.timing.mark_phase_end(&phase);

            if let Err((key, error)) = outcome {
                request.set_status(error.response_status());
                found_error = true;
                if !error.is_not_found() {
                    let fields = LogFields::new().with_pass(passes).with_action(key);
                    self.logger.error("action", &error, &fields);
                }
            }

            previous_len = Some(actions.len());

            let phase = LifecyclePhase::RenderPass(passes);
            request.timing.mark_phase_start(&phase);
            let mut head = HeadCollector::new();
            let rendered = {
                let mut scope = RenderScope::new(self.cx, request, &mut actions, &mut head);
                self.view.render(&mut scope)
            };
            request.timing.mark_phase_end(&phase);

            match rendered {
                Ok(markup) => fallback.record(markup, head),
                Err(error) => self.render_failed(request, "while loop", passes, &error, &mut found_error),
            }

            self.logger.verbose(
                "render pass",
                &LogFields::new().with_pass(passes).with_registered(actions.len()),
            );
        }

        let phase = LifecyclePhase::FinalRender;
        request.timing.mark_phase_start(&phase);
        let mut modules = Vec::new();
        let mut head = HeadCollector::new();
        let rendered = {
            let mut scope = RenderScope::new(self.cx, request, &mut actions, &mut head)
                .capturing_modules(&mut modules);
            self.view.render(&mut scope)
        };
        request.timing.mark_phase_end(&phase);

        match rendered {
            Ok(markup) => fallback.record(markup, head),
            Err(error) => self.render_failed(request, "final", passes, &error, &mut found_error),
        }

        self.logger.verbose(
            "final pass",
            &LogFields::new().with_pass(passes).with_modules(modules.len()),
        );

        let (markup, head) = fallback.into_parts();
        Ok(RenderOutcome {
            markup,
            head,
            modules,
            found_error,
            passes,
            resolved,
        })
    }

    /// Resolve every unresolved action in registration order.
    ///
    /// Stops at the first failure, returning the failing key with the error.
    async fn resolve_pending(
        &self,
        actions: &mut PendingActions<C>,
        request: &mut RequestContext,
        pass: usize,
        resolved: &mut Vec<ResolvedAction>,
    ) -> Result<(), (String, FetchError)> {
        for index in 0..actions.len() {
            let Some(pending) = actions.get(index) else {
                continue;
            };
            if pending.is_resolved() {
                continue;
            }
            let action = Arc::clone(pending.action());
            let key = pending.key().to_string();

            let output = match self.caller.call(action.as_ref(), self.cx).await {
                Ok(output) => output,
                Err(error) => return Err((key, error)),
            };
            actions.mark_resolved(index);
            resolved.push(ResolvedAction {
                pass,
                key: key.clone(),
            });

            if let Some(handler) = self.on_result {
                if let Err(error) = handler(output, request) {
                    return Err((key, error));
                }
            }
        }
        Ok(())
    }

    fn render_failed(
        &self,
        request: &mut RequestContext,
        stage: &str,
        pass: usize,
        error: &ViewError,
        found_error: &mut bool,
    ) {
        request.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        *found_error = true;
        self.logger.error(stage, error, &LogFields::new().with_pass(pass));
    }
}
