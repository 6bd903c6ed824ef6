//! Strand identity and the suspend/resume handshake core.
//!
//! A strand is an OS thread driven through two batons:
//!
//! - `resume`: given by whoever wants the strand to run; taken by the strand
//!   when it starts and each time it wakes from a suspension.
//! - `yield_back`: given by the strand when it suspends or completes; taken
//!   by whoever last resumed it (the run caller at start, a settling
//!   completer thereafter).
//!
//! At most one participant executes application code at any instant: every
//! giver parks right after handing over, and every taker runs only once it
//! holds a token. A resumption returns control to exactly the context that
//! handed it out, matching coroutine semantics without a native suspend
//! primitive. Yield tokens can briefly be outstanding in pairs — a completer
//! that settles between waiter registration and the strand's park has already
//! deposited the resume, so the strand's suspend and its completion both
//! yield before the parked takers get scheduled; the cells count tokens to
//! keep both handoffs intact.

use super::park::Baton;
use crate::tracing_compat::trace;
use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_STRAND_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque strand identity, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrandId(u64);

impl StrandId {
    pub(crate) fn next() -> Self {
        Self(NEXT_STRAND_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "strand-{}", self.0)
    }
}

/// Shared handshake state of one strand.
#[derive(Debug)]
pub(crate) struct StrandCore {
    id: StrandId,
    name: String,
    resume: Baton,
    yield_back: Baton,
}

impl StrandCore {
    pub(crate) fn new(name: String) -> Self {
        Self {
            id: StrandId::next(),
            name,
            resume: Baton::new(),
            yield_back: Baton::new(),
        }
    }

    /// Creates a core whose name is `prefix` plus its own fresh id.
    pub(crate) fn with_prefix(prefix: &str) -> Self {
        let id = StrandId::next();
        Self {
            id,
            name: format!("{prefix}-{}", id.get()),
            resume: Baton::new(),
            yield_back: Baton::new(),
        }
    }

    pub(crate) fn id(&self) -> StrandId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Called on the strand thread at startup: parks until the run caller
    /// hands over the baton.
    pub(crate) fn wait_for_start(&self) {
        self.resume.take();
        trace!(strand = %self.id, name = %self.name, "strand started");
    }

    /// Called by the run caller after spawning: hands the baton to the strand
    /// and parks until the strand first suspends or completes.
    pub(crate) fn start_and_wait_for_yield(&self) {
        self.resume.give();
        self.yield_back.take();
    }

    /// Suspends the strand: hands the baton back to the last resumer and
    /// parks until someone resumes this strand.
    ///
    /// Must only be called on the strand's own thread.
    pub(crate) fn suspend(&self) {
        trace!(strand = %self.id, "suspending");
        self.yield_back.give();
        self.resume.take();
        trace!(strand = %self.id, "resumed");
    }

    /// Like [`suspend`](Self::suspend) but gives up waiting for a resumption
    /// after `timeout`. Returns `true` if resumed, `false` on timeout.
    ///
    /// On timeout the strand self-resumes without a baton; the caller must
    /// reconcile the handshake (see `Deferred::wait_timeout`).
    pub(crate) fn suspend_timeout(&self, timeout: Duration) -> bool {
        trace!(strand = %self.id, timeout_ms = timeout.as_millis() as u64, "suspending with timeout");
        self.yield_back.give();
        let resumed = self.resume.take_timeout(timeout);
        trace!(strand = %self.id, resumed, "bounded suspension ended");
        resumed
    }

    /// Consumes a resume baton that is known to be in flight.
    ///
    /// Used when a bounded suspension timed out but a settling completer won
    /// the race for the waiter slot and has already (or is about to) hand a
    /// baton over: the strand must honor that handoff instead of detaching.
    pub(crate) fn finish_resume(&self) {
        self.resume.take();
    }

    /// Called on the strand thread after the body finished: hands the baton
    /// back to the last resumer.
    pub(crate) fn complete(&self) {
        trace!(strand = %self.id, "strand completed");
        self.yield_back.give();
    }
}

/// Resumption handle for the single context suspended on a deferred.
///
/// Resuming transfers control into the strand and parks the resuming thread
/// until the strand suspends again or completes.
#[derive(Debug, Clone)]
pub(crate) struct Waiter {
    core: Arc<StrandCore>,
}

impl Waiter {
    pub(crate) fn new(core: Arc<StrandCore>) -> Self {
        Self { core }
    }

    pub(crate) fn strand_id(&self) -> StrandId {
        self.core.id()
    }

    /// Wakes the suspended strand and parks until it yields back.
    pub(crate) fn resume(&self) {
        trace!(strand = %self.core.id(), "resuming waiter");
        self.core.resume.give();
        self.core.yield_back.take();
    }
}
