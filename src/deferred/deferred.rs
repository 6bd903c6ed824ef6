//! Deferred results and their producer-side completers.

use super::state::DeferredState;
use crate::cx::Cx;
use crate::error::{panic_payload_text, Error, ErrorKind, Result};
use crate::flow::Flow;
use crate::strand::Waiter;
use crate::tracing_compat::{debug, trace, warn};
use core::fmt;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

struct Inner<T> {
    state: DeferredState<T>,
    waiter: Option<Waiter>,
    flow: Option<Arc<Flow>>,
    double_settles: u32,
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().expect("deferred state poisoned")
    }
}

/// The consumer handle for one callback-based operation's eventual outcome.
///
/// Created by [`Deferred::start`], one per invocation of an adapted call.
/// Reading the outcome with [`wait`](Deferred::wait) either returns it
/// immediately (the operation already settled) or suspends the calling
/// strand until the completion callback fires.
///
/// `T: Clone` so a terminal result can be handed out on every read: waiting
/// twice on a settled deferred yields the same value (or raises the same
/// error) without suspending.
pub struct Deferred<T> {
    shared: Arc<Shared<T>>,
}

/// The producer handle: the typed stand-in for the trailing completion
/// callback of the err-first convention.
///
/// Exactly one settle wins; later attempts are dropped with a diagnostic.
/// Clonable so the wrapped operation can hand it to whatever thread finishes
/// the work.
pub struct Completer<T> {
    shared: Arc<Shared<T>>,
    stale: Arc<AtomicBool>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            stale: Arc::clone(&self.stale),
        }
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Creates a deferred result and arranges for `op` to start.
    ///
    /// If the context carries a flow, the start is admitted to it and happens
    /// when a slot frees up (FIFO). Otherwise `op` runs immediately, inline,
    /// before this returns.
    ///
    /// `op` receives the [`Completer`] and must settle it exactly once, from
    /// any thread. A panic inside `op` rejects the deferred with
    /// [`ErrorKind::OpPanicked`] and marks every outstanding completer clone
    /// stale, so a callback scheduled before the panic cannot settle later.
    pub fn start<F>(cx: &Cx, op: F) -> Self
    where
        F: FnOnce(Completer<T>) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: DeferredState::Pending,
                waiter: None,
                flow: cx.flow_arc(),
                double_settles: 0,
            }),
        });
        let deferred = Self {
            shared: Arc::clone(&shared),
        };
        let completer = Completer {
            shared,
            stale: Arc::new(AtomicBool::new(false)),
        };
        match cx.flow_arc() {
            Some(flow) => flow.admit(Box::new(move || Self::launch(op, &completer))),
            None => Self::launch(op, &completer),
        }
        deferred
    }

    /// Runs the underlying operation, isolating panics.
    fn launch<F>(op: F, completer: &Completer<T>)
    where
        F: FnOnce(Completer<T>),
    {
        {
            let mut inner = completer.shared.lock();
            if matches!(inner.state, DeferredState::Pending) {
                inner.state = DeferredState::Running;
            }
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| op(completer.clone()))) {
            let text = panic_payload_text(payload.as_ref());
            warn!(panic = %text, "wrapped operation panicked before settling");
            // Stale-callback guard: clones stashed before the unwind must not
            // be able to settle after this rejection.
            completer.stale.store(true, Ordering::Release);
            completer.settle_unchecked(Err(Error::op_panicked(text)));
        }
    }

    /// Blocking read: returns the settled value or raises the stored error.
    ///
    /// If the deferred is already terminal this is a synchronous fast path —
    /// no suspension. Otherwise the calling strand is recorded as the single
    /// waiter and suspended; the completion callback resumes exactly this
    /// strand.
    ///
    /// A second `wait` while one strand is already suspended on this deferred
    /// is unsupported and returns [`ErrorKind::WaiterConflict`]; the first
    /// waiter is unaffected.
    pub fn wait(&self, cx: &Cx) -> Result<T> {
        loop {
            if let Some(outcome) = self.try_read(cx)? {
                return outcome;
            }
            trace!(strand = %cx.strand_id(), "waiting on unsettled deferred");
            cx.suspend();
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`, returning
    /// [`ErrorKind::WaitTimeout`] without consuming the eventual result; a
    /// later `wait` can still retrieve it. The waiter registration is
    /// withdrawn on timeout.
    ///
    /// After a timeout the strand runs detached from the strict one-active
    /// alternation until the next resumption cycle; the deferred and flow
    /// state stay consistent regardless.
    pub fn wait_timeout(&self, cx: &Cx, timeout: Duration) -> Result<T> {
        loop {
            if let Some(outcome) = self.try_read(cx)? {
                return outcome;
            }
            trace!(
                strand = %cx.strand_id(),
                timeout_ms = timeout.as_millis() as u64,
                "bounded wait on unsettled deferred"
            );
            if cx.suspend_timeout(timeout) {
                continue;
            }
            let withdrew = {
                let mut inner = self.shared.lock();
                if inner.waiter.is_some() {
                    inner.waiter = None;
                    true
                } else {
                    false
                }
            };
            if withdrew {
                return Err(Error::new(ErrorKind::WaitTimeout)
                    .with_message(format!("deferred not settled within {timeout:?}")));
            }
            // A settling completer claimed the waiter slot first; its resume
            // baton is in flight and must be consumed to keep the handshake
            // balanced. The state is terminal once it lands.
            cx.finish_resume();
        }
    }

    /// Terminal fast path; registers the caller as waiter when not terminal.
    ///
    /// Returns `Ok(Some(..))` with the outcome, `Ok(None)` after registering
    /// (caller must suspend), or `Err(WaiterConflict)`.
    fn try_read(&self, cx: &Cx) -> Result<Option<Result<T>>> {
        let mut inner = self.shared.lock();
        match &inner.state {
            DeferredState::Resolved(value) => Ok(Some(Ok(value.clone()))),
            DeferredState::Rejected(error) => Ok(Some(Err(error
                .clone()
                .with_await_site(Backtrace::capture())))),
            DeferredState::Pending | DeferredState::Running => {
                if let Some(existing) = &inner.waiter {
                    return Err(Error::new(ErrorKind::WaiterConflict).with_message(format!(
                        "{} is already suspended on this deferred",
                        existing.strand_id()
                    )));
                }
                inner.waiter = Some(cx.waiter());
                Ok(None)
            }
        }
    }

    /// Returns true once the deferred reached a terminal state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.shared.lock().state.is_terminal()
    }

    /// Short state name for diagnostics.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.shared.lock().state.name()
    }

    /// How many settle attempts were dropped after the first one won.
    #[must_use]
    pub fn double_settle_count(&self) -> u32 {
        self.shared.lock().double_settles
    }
}

impl<T: Clone + Send + 'static> Completer<T> {
    /// Settles with a value. Returns false if the deferred was already
    /// terminal or this completer is stale.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with an error, capturing the rejection-site backtrace.
    /// Returns false if the deferred was already terminal or this completer
    /// is stale.
    pub fn reject(&self, error: impl Into<Error>) -> bool {
        self.settle(Err(error.into()))
    }

    /// Settles with an err-first outcome collapsed to a `Result`.
    pub fn settle(&self, result: Result<T>) -> bool {
        if self.stale.load(Ordering::Acquire) {
            warn!("settle via stale completer ignored");
            return false;
        }
        self.settle_unchecked(result)
    }

    /// Returns true once the deferred reached a terminal state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.shared.lock().state.is_terminal()
    }

    /// The terminal-state transition: first settle wins, then the owning
    /// flow's slot is released, then the waiter (if any) is resumed.
    fn settle_unchecked(&self, result: Result<T>) -> bool {
        let outcome = if result.is_ok() { "resolved" } else { "rejected" };
        let (waiter, flow) = {
            let mut inner = self.shared.lock();
            if inner.state.is_terminal() {
                inner.double_settles += 1;
                warn!(
                    state = inner.state.name(),
                    attempted = outcome,
                    dropped = inner.double_settles,
                    "completion callback fired more than once; first settle wins"
                );
                return false;
            }
            inner.state = match result {
                Ok(value) => DeferredState::Resolved(value),
                Err(error) => DeferredState::Rejected(error.with_origin(Backtrace::capture())),
            };
            debug!(outcome, "deferred settled");
            (inner.waiter.take(), inner.flow.take())
        };
        // Release before resume so the freed slot is dispatchable even while
        // the resumed waiter runs.
        if let Some(flow) = flow {
            flow.release();
        }
        if let Some(waiter) = waiter {
            waiter.resume();
        }
        true
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("Deferred")
            .field("state", &inner.state.name())
            .field("has_waiter", &inner.waiter.is_some())
            .finish()
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("state", &self.shared.lock().state.name())
            .field("stale", &self.stale.load(Ordering::Acquire))
            .finish()
    }
}
