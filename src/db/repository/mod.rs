//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per aggregate. All public functions are re-exported
//! here so callers use `crate::db::` paths.

mod document;
mod office;
mod resolution;
mod stamp;
mod user;

pub use document::*;
pub use office::*;
pub use resolution::*;
pub use stamp::*;
pub use user::*;
