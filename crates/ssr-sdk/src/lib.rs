//! Public SDK for the server-side render orchestrator.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use ssr_sdk::prelude::*;
//!
//! struct App;
//!
//! impl View<StoreContext> for App {
//!     fn render(&self, scope: &mut RenderScope<'_, StoreContext>) -> Result<String, ViewError> {
//!         scope.head().set_title("Shop");
//!         scope.register_fetch(load_products(), "products", None);
//!         Ok(format!("<main>{}</main>", scope.context().store.state()["products"]))
//!     }
//! }
//!
//! let options = RenderOptions::from_config(Arc::new(App), &config)?.with_cache(shared_cache);
//! let renderer = Renderer::new(StoreStrategy::new(reducer, initial_state), options);
//! let result = renderer.render(&mut request).await?;
//! ```

mod renderer;
mod strategy;

pub use renderer::*;
pub use strategy::*;

pub use ssr_cache;
pub use ssr_core;
pub use ssr_data;
pub use ssr_executor;
pub use ssr_observability;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::renderer::*;
    pub use crate::strategy::*;
    pub use ssr_cache::*;
    pub use ssr_core::*;
    pub use ssr_data::*;
    pub use ssr_executor::*;
    pub use ssr_observability::*;
}
