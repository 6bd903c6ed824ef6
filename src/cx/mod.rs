//! The explicit per-run context handle.
//!
//! Every run body receives a `&Cx` and threads it into every core operation
//! that needs "the calling context": `Deferred::start`, `wait`, adapter
//! closures. There is no thread-local or global current-context lookup
//! anywhere in the crate — the context is always an explicit parameter.

use crate::config::RunOptions;
use crate::flow::Flow;
use crate::strand::{StrandCore, StrandId, Waiter};
use core::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Handle to the strand executing a run body, plus the optionally attached
/// flow and the run's options.
///
/// `Cx` is deliberately `!Send`: it is created on the strand's thread and
/// never leaves it, so a `wait` can only ever suspend the strand actually
/// executing the call.
pub struct Cx {
    core: Arc<StrandCore>,
    flow: Option<Arc<Flow>>,
    options: RunOptions,
    _not_send: PhantomData<*const ()>,
}

impl Cx {
    pub(crate) fn new(core: Arc<StrandCore>, flow: Option<Arc<Flow>>, options: RunOptions) -> Self {
        Self {
            core,
            flow,
            options,
            _not_send: PhantomData,
        }
    }

    /// Identity of the strand this context belongs to.
    #[must_use]
    pub fn strand_id(&self) -> StrandId {
        self.core.id()
    }

    /// The strand's name, as used for thread naming and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// The flow attached to this run, or `None` when unbounded.
    ///
    /// Nested code can inspect admission state through
    /// [`Flow::stats`](crate::flow::Flow::stats).
    #[must_use]
    pub fn flow(&self) -> Option<&Arc<Flow>> {
        self.flow.as_ref()
    }

    /// The options this run was started with.
    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Creates a standalone context with no flow attached, for unit-testing
    /// code that takes a `&Cx`.
    ///
    /// Operations started through it run inline (unbounded semantics);
    /// `wait` works for operations that settle synchronously. Suspending on
    /// an unsettled deferred would park the test thread with nothing to
    /// resume it.
    #[must_use]
    pub fn for_testing() -> Self {
        Self::new(
            Arc::new(StrandCore::new("test-cx".to_string())),
            None,
            RunOptions::default(),
        )
    }

    pub(crate) fn flow_arc(&self) -> Option<Arc<Flow>> {
        self.flow.clone()
    }

    pub(crate) fn waiter(&self) -> Waiter {
        Waiter::new(Arc::clone(&self.core))
    }

    pub(crate) fn suspend(&self) {
        self.core.suspend();
    }

    pub(crate) fn suspend_timeout(&self, timeout: Duration) -> bool {
        self.core.suspend_timeout(timeout)
    }

    pub(crate) fn finish_resume(&self) {
        self.core.finish_resume();
    }
}

impl fmt::Debug for Cx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cx")
            .field("strand", &self.core.id())
            .field("bounded", &self.flow.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cx_is_unbounded() {
        let cx = Cx::for_testing();
        assert!(cx.flow().is_none());
        assert_eq!(cx.name(), "test-cx");
    }

    #[test]
    fn distinct_contexts_have_distinct_strands() {
        let a = Cx::for_testing();
        let b = Cx::for_testing();
        assert_ne!(a.strand_id(), b.strand_id());
    }
}
