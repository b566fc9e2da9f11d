//! Fixed-point render loop.
//!
//! This crate drives rendering until the set of data dependencies settles:
//! - `View` / `RenderScope` - Render traversal with fetch registration, head and module capture
//! - `RenderLoop` - Resolve pending actions and re-render until no new ones appear
//! - `MarkupFallback` - Best markup available when a pass fails

mod fallback;
mod fixed_point;
mod view;

pub use fallback::*;
pub use fixed_point::*;
pub use view::*;
