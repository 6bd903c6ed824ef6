//! Deferred results: write-once outcome containers with a blocking read.
//!
//! A [`Deferred`] represents one pending callback-based operation. Its
//! producer side is split off as a [`Completer`], the typed replacement for
//! the trailing err-first completion callback: the wrapped operation settles
//! it exactly once with `resolve`, `reject`, or `settle`.

#[allow(clippy::module_inception)]
mod deferred;
mod state;

pub use deferred::{Completer, Deferred};
pub use state::DeferredState;
