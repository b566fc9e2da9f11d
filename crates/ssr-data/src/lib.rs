//! Fetch actions, the pending-action registry and the state store.
//!
//! This crate provides:
//! - `FetchAction` - Asynchronous data dependency registered by a view
//! - `PendingActions` - Per-request registry (server flavor)
//! - `ClientRegistrar` - Invoke-on-register registry (client flavor)
//! - `ActionCaller` - Substitutable action invocation wrapper
//! - `FetchOptions` - Request headers forwarded to actions
//! - `Store` - State container with combined reducers

mod action;
mod caller;
mod options;
mod registry;
mod store;

pub use action::*;
pub use caller::*;
pub use options::*;
pub use registry::*;
pub use store::*;
