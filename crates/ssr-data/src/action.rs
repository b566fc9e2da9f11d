//! Fetch actions and their errors.

use std::future::Future;

use async_trait::async_trait;
use http::StatusCode;

/// Value produced by a resolved action.
pub type ActionOutput = serde_json::Value;

/// Error type for fetch actions.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: StatusCode, url: String },

    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    /// Create an error carrying a response status.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a 404 error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    /// The status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The status to put on the response: the carried status, or 500.
    pub fn response_status(&self) -> StatusCode {
        self.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Whether this is a "not found", which is expected noise and not logged.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// An asynchronous data dependency registered by a view while rendering.
///
/// `C` is the dispatch context handed to the action: a store handle plus
/// forwarded headers, or caller-supplied arguments.
#[async_trait]
pub trait FetchAction<C>: Send + Sync {
    /// Run the action against the dispatch context.
    async fn run(&self, cx: &C) -> Result<ActionOutput, FetchError>;
}

/// A fetch action backed by a closure taking an owned copy of the context.
pub struct FnAction<F>(F);

/// Wrap a closure as a fetch action.
///
/// ```ignore
/// let action = action_fn(|cx: StoreContext| async move {
///     cx.store.dispatch(Action::new("products/loaded"));
///     Ok(serde_json::Value::Null)
/// });
/// ```
pub fn action_fn<F>(f: F) -> FnAction<F> {
    FnAction(f)
}

#[async_trait]
impl<C, F, Fut> FetchAction<C> for FnAction<F>
where
    C: Clone + Send + Sync + 'static,
    F: Fn(C) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ActionOutput, FetchError>> + Send + 'static,
{
    async fn run(&self, cx: &C) -> Result<ActionOutput, FetchError> {
        (self.0)(cx.clone()).await
    }
}
