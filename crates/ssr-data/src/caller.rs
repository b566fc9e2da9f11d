//! Action invocation wrappers.

use async_trait::async_trait;

use crate::action::{ActionOutput, FetchAction, FetchError};

/// Invokes a registered action.
///
/// Substitute your own to batch, defer or instrument action execution.
#[async_trait]
pub trait ActionCaller<C>: Send + Sync {
    /// Invoke `action` against the dispatch context.
    async fn call(&self, action: &dyn FetchAction<C>, cx: &C) -> Result<ActionOutput, FetchError>;
}

/// Runs the action directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateCaller;

#[async_trait]
impl<C> ActionCaller<C> for ImmediateCaller
where
    C: Send + Sync,
{
    async fn call(&self, action: &dyn FetchAction<C>, cx: &C) -> Result<ActionOutput, FetchError> {
        action.run(cx).await
    }
}
