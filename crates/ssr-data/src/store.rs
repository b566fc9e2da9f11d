//! State container with combined reducers.
//!
//! Application state is a JSON object whose top-level keys are slices. Each
//! slice is owned by one reducer; [`CombinedReducer`] folds them into the
//! root reducer the [`Store`] dispatches through.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action type dispatched once when a store is created.
pub const INIT_ACTION: &str = "@@ssr/INIT";

/// An action dispatched to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Action payload.
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    /// Create an action without payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Computes the next value of one state slice.
pub trait Reducer: Send + Sync {
    /// Reduce `action` into the next slice state. `state` is `Null` for a
    /// slice that has not been initialised yet.
    fn reduce(&self, state: &Value, action: &Action) -> Value;
}

impl<F> Reducer for F
where
    F: Fn(&Value, &Action) -> Value + Send + Sync,
{
    fn reduce(&self, state: &Value, action: &Action) -> Value {
        self(state, action)
    }
}

/// Root reducer built from per-slice reducers.
#[derive(Clone, Default)]
pub struct CombinedReducer {
    slices: BTreeMap<String, Arc<dyn Reducer>>,
}

impl CombinedReducer {
    /// Create an empty root reducer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the reducer for a slice.
    pub fn with_slice(mut self, name: impl Into<String>, reducer: impl Reducer + 'static) -> Self {
        self.slices.insert(name.into(), Arc::new(reducer));
        self
    }

    /// Slice names handled by this reducer.
    pub fn slice_names(&self) -> Vec<&str> {
        self.slices.keys().map(|k| k.as_str()).collect()
    }

    /// Reduce the root state. Keys without a reducer are carried over.
    pub fn reduce(&self, state: &Value, action: &Action) -> Value {
        let mut next = match state {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        for (name, reducer) in &self.slices {
            let current = next.get(name).cloned().unwrap_or(Value::Null);
            next.insert(name.clone(), reducer.reduce(&current, action));
        }

        Value::Object(next)
    }
}

impl std::fmt::Debug for CombinedReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("slices", &self.slice_names())
            .finish()
    }
}

/// Shared handle to the application state.
///
/// Cloning the store clones the handle, not the state.
#[derive(Clone, Debug)]
pub struct Store {
    state: Arc<RwLock<Value>>,
    reducer: Arc<CombinedReducer>,
}

impl Store {
    /// Create a store from a root reducer and preloaded state.
    pub fn new(reducer: CombinedReducer, preloaded: Value) -> Self {
        let initial = reducer.reduce(&preloaded, &Action::new(INIT_ACTION));
        Self {
            state: Arc::new(RwLock::new(initial)),
            reducer: Arc::new(reducer),
        }
    }

    /// Dispatch an action through the root reducer.
    pub fn dispatch(&self, action: Action) {
        let mut state = write_state(&self.state);
        let next = self.reducer.reduce(&state, &action);
        *state = next;
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Value {
        read_state(&self.state).clone()
    }

    /// Read part of the state without cloning all of it.
    pub fn select<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&read_state(&self.state))
    }
}

fn read_state(lock: &RwLock<Value>) -> RwLockReadGuard<'_, Value> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(lock_kind = "rwlock.read", "Recovered from poisoned store lock");
            poisoned.into_inner()
        }
    }
}

fn write_state(lock: &RwLock<Value>) -> RwLockWriteGuard<'_, Value> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(lock_kind = "rwlock.write", "Recovered from poisoned store lock");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn counter(state: &Value, action: &Action) -> Value {
        let count = state.as_i64().unwrap_or(0);
        match action.kind.as_str() {
            "increment" => json!(count + 1),
            _ => json!(count),
        }
    }

    fn products(state: &Value, action: &Action) -> Value {
        match action.kind.as_str() {
            "products/loaded" => action.payload.clone(),
            _ if state.is_null() => json!([]),
            _ => state.clone(),
        }
    }

    fn reducer() -> CombinedReducer {
        CombinedReducer::new()
            .with_slice("counter", counter)
            .with_slice("products", products)
    }

    #[test]
    fn test_store_initializes_slices() {
        let store = Store::new(reducer(), Value::Null);
        assert_eq!(store.state(), json!({ "counter": 0, "products": [] }));
    }

    #[test]
    fn test_preloaded_state_is_kept() {
        let store = Store::new(
            reducer(),
            json!({ "counter": 5, "settings": { "mobile": true } }),
        );

        assert_eq!(store.select(|s| s["counter"].clone()), json!(5));
        assert_eq!(store.select(|s| s["settings"]["mobile"].clone()), json!(true));
    }

    #[test]
    fn test_dispatch_updates_each_slice() {
        let store = Store::new(reducer(), Value::Null);

        store.dispatch(Action::new("increment"));
        store.dispatch(Action::new("products/loaded").with_payload(json!(["shoe"])));

        assert_eq!(store.state(), json!({ "counter": 1, "products": ["shoe"] }));
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::new(reducer(), Value::Null);
        let handle = store.clone();

        handle.dispatch(Action::new("increment"));
        assert_eq!(store.select(|s| s["counter"].clone()), json!(1));
    }

    #[test]
    fn test_action_json_shape() {
        let action: Action = serde_json::from_value(json!({ "type": "increment" })).unwrap();
        assert_eq!(action, Action::new("increment"));
    }
}
