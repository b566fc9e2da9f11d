//! Pending-action registry.
//!
//! Views register their data dependencies through a [`FetchRegistrar`]
//! while rendering. On the server the registrar is [`PendingActions`], an
//! explicit per-request accumulator that the render loop resolves between
//! passes. In the browser the registrar is [`ClientRegistrar`], which runs
//! each action as soon as it is registered.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::action::FetchAction;
use crate::caller::{ActionCaller, ImmediateCaller};

/// Compute the registry key for an action: `name` or `name:id`.
pub fn action_key(name: &str, id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => format!("{}:{}", name, id),
        _ => name.to_string(),
    }
}

/// Capability handed to views for registering fetch dependencies.
pub trait FetchRegistrar<C>: Send {
    /// Register `action` under `name` and optional `id`.
    fn register(&mut self, action: Arc<dyn FetchAction<C>>, name: &str, id: Option<&str>);
}

/// An action discovered during rendering.
pub struct PendingAction<C> {
    action: Arc<dyn FetchAction<C>>,
    key: String,
    resolved: bool,
}

impl<C> PendingAction<C> {
    /// Registry key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the action has completed successfully.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// The action itself.
    pub fn action(&self) -> &Arc<dyn FetchAction<C>> {
        &self.action
    }
}

impl<C> std::fmt::Debug for PendingAction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAction")
            .field("key", &self.key)
            .field("resolved", &self.resolved)
            .finish()
    }
}

/// Per-request list of pending actions.
///
/// Grows monotonically; the first registration of a key wins and later
/// registrations of the same key are ignored.
pub struct PendingActions<C> {
    actions: Vec<PendingAction<C>>,
}

impl<C> PendingActions<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether an action with `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.actions.iter().any(|a| a.key == key)
    }

    /// Registry keys in registration order.
    pub fn keys(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.key.as_str()).collect()
    }

    /// Get the action at `index`.
    pub fn get(&self, index: usize) -> Option<&PendingAction<C>> {
        self.actions.get(index)
    }

    /// Iterate in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingAction<C>> {
        self.actions.iter()
    }

    /// Mark the action at `index` resolved.
    ///
    /// Returns `false` if it was already resolved or does not exist.
    pub fn mark_resolved(&mut self, index: usize) -> bool {
        match self.actions.get_mut(index) {
            Some(action) if !action.resolved => {
                action.resolved = true;
                true
            }
            _ => false,
        }
    }
}

impl<C> Default for PendingActions<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for PendingActions<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.actions.iter()).finish()
    }
}

impl<C> FetchRegistrar<C> for PendingActions<C>
where
    C: Send + Sync,
{
    fn register(&mut self, action: Arc<dyn FetchAction<C>>, name: &str, id: Option<&str>) {
        let key = action_key(name, id);
        if self.contains(&key) {
            return;
        }
        self.actions.push(PendingAction {
            action,
            key,
            resolved: false,
        });
    }
}

/// Runs detached tasks for the client registrar.
pub trait Spawner: Send + Sync {
    /// Run `task` to completion in the background.
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawns onto the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

/// Client-side registrar: every registration invokes the action at once.
///
/// Nothing is recorded and nothing is deduplicated; the browser re-renders
/// on its own when the store changes.
pub struct ClientRegistrar<C> {
    cx: C,
    caller: Arc<dyn ActionCaller<C>>,
    spawner: Arc<dyn Spawner>,
}

impl<C> ClientRegistrar<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Create a registrar invoking actions directly.
    pub fn new(cx: C, spawner: Arc<dyn Spawner>) -> Self {
        Self {
            cx,
            caller: Arc::new(ImmediateCaller),
            spawner,
        }
    }

    /// Replace the action caller.
    pub fn with_caller(mut self, caller: Arc<dyn ActionCaller<C>>) -> Self {
        self.caller = caller;
        self
    }
}

impl<C> FetchRegistrar<C> for ClientRegistrar<C>
where
    C: Clone + Send + Sync + 'static,
{
    fn register(&mut self, action: Arc<dyn FetchAction<C>>, name: &str, id: Option<&str>) {
        let key = action_key(name, id);
        let cx = self.cx.clone();
        let caller = Arc::clone(&self.caller);

        self.spawner.spawn(Box::pin(async move {
            if let Err(error) = caller.call(action.as_ref(), &cx).await {
                tracing::warn!(action = %key, %error, "client fetch action failed");
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::action::{action_fn, ActionOutput, FetchError};

    fn noop() -> Arc<dyn FetchAction<()>> {
        Arc::new(action_fn(|_: ()| async { Ok::<_, FetchError>(ActionOutput::Null) }))
    }

    #[derive(Default)]
    struct QueueSpawner {
        tasks: Mutex<Vec<BoxFuture<'static, ()>>>,
    }

    impl Spawner for QueueSpawner {
        fn spawn(&self, task: BoxFuture<'static, ()>) {
            self.tasks.lock().unwrap().push(task);
        }
    }

    impl QueueSpawner {
        async fn drain(&self) {
            let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
            futures::future::join_all(tasks).await;
        }
    }

    // === Key Tests ===

    #[test]
    fn test_action_key() {
        assert_eq!(action_key("products", None), "products");
        assert_eq!(action_key("product", Some("42")), "product:42");
        assert_eq!(action_key("product", Some("")), "product");
    }

    // === PendingActions Tests ===

    #[test]
    fn test_register_appends_unresolved() {
        let mut actions = PendingActions::new();
        actions.register(noop(), "products", None);
        actions.register(noop(), "product", Some("1"));

        assert_eq!(actions.keys(), vec!["products", "product:1"]);
        assert!(!actions.get(0).unwrap().is_resolved());
        assert!(!actions.get(1).unwrap().is_resolved());
    }

    #[test]
    fn test_duplicate_key_is_coalesced() {
        let first_runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&first_runs);
        let first: Arc<dyn FetchAction<()>> = Arc::new(action_fn(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FetchError>(ActionOutput::Null) }
        }));

        let mut actions = PendingActions::new();
        actions.register(Arc::clone(&first), "product", Some("7"));
        actions.register(noop(), "product", Some("7"));

        assert_eq!(actions.len(), 1);
        assert!(Arc::ptr_eq(actions.get(0).unwrap().action(), &first));
    }

    #[test]
    fn test_mark_resolved_only_once() {
        let mut actions = PendingActions::new();
        actions.register(noop(), "a", None);

        assert!(actions.mark_resolved(0));
        assert!(!actions.mark_resolved(0));
        assert!(!actions.mark_resolved(5));
        assert!(actions.get(0).unwrap().is_resolved());
    }

    // === ClientRegistrar Tests ===

    #[tokio::test]
    async fn test_client_registrar_invokes_on_register() {
        let runs = Arc::new(AtomicUsize::new(0));
        let spawner = Arc::new(QueueSpawner::default());
        let mut registrar = ClientRegistrar::new((), spawner.clone());

        for _ in 0..2 {
            let counter = Arc::clone(&runs);
            registrar.register(
                Arc::new(action_fn(move |_: ()| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, FetchError>(ActionOutput::Null) }
                })),
                "same",
                None,
            );
        }
        spawner.drain().await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_registrar_swallows_failures() {
        let spawner = Arc::new(QueueSpawner::default());
        let mut registrar = ClientRegistrar::new((), spawner.clone());

        registrar.register(
            Arc::new(action_fn(|_: ()| async { Err::<ActionOutput, _>(FetchError::not_found("missing")) })),
            "broken",
            None,
        );
        spawner.drain().await;
    }

    #[tokio::test]
    async fn test_tokio_spawner_runs_task() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        TokioSpawner.spawn(Box::pin(async move {
            let _ = tx.send(1);
        }));
        assert_eq!(rx.await.unwrap(), 1);
    }
}
