//! Bulk helpers built on the core: `for_each` and `map` over a sequence of
//! adapted calls, each running in a dedicated bounded or unbounded context.
//!
//! These are pure consumers of the core contract — no new concurrency logic.
//! The `*_deferred` variants are for use inside an existing context and
//! settle a [`Deferred`](crate::deferred::Deferred) when the inner run
//! completes; the `try_*` variants block the calling thread until then.

mod each;
mod map;

pub use each::{for_each, for_each_deferred, try_for_each};
pub use map::{map, map_deferred, try_map};
