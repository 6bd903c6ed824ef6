//! Adapters from callback-style functions to deferred factories.
//!
//! [`wrap`] and friends adapt a single function; [`OpRegistry`] adapts a
//! named collection, with each entry explicitly declared deferred or
//! synchronous passthrough.

mod registry;
mod wrap;

pub use registry::OpRegistry;
pub use wrap::{wrap, wrap2, wrap_arg, wrap_capped};
