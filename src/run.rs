//! Entry points: start a strand, optionally attach a flow, run a body.
//!
//! `run` family calls never suspend their caller: each returns once the body
//! either completes or reaches its first suspension point. The returned
//! [`RunHandle`] retrieves the body's outcome.
//!
//! Nested runs are independent: a `run_bounded` inside another run's body
//! gets its own strand and its own flow, so exhausting the outer flow's
//! limit never blocks inner admissions.

use crate::config::RunOptions;
use crate::cx::Cx;
use crate::error::{panic_payload_text, Error, ErrorKind, Result};
use crate::flow::{Flow, Limit};
use crate::strand::{StrandCore, StrandId};
use crate::tracing_compat::{debug, trace, warn};
use core::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

/// Starts an unbounded run: operations created in `body` start immediately.
///
/// Returns once `body` completes or first suspends.
///
/// # Panics
///
/// Panics if the strand thread cannot be spawned; use [`run_with`] to handle
/// that case explicitly.
pub fn run<R, F>(body: F) -> RunHandle<R>
where
    F: FnOnce(&Cx) -> R + Send + 'static,
    R: Send + 'static,
{
    run_with(RunOptions::default(), body).unwrap_or_else(|e| panic!("failed to start run: {e}"))
}

/// Starts a bounded run: at most `limit` operations run concurrently.
///
/// A limit of `0` means unbounded, mirroring the "omitted or invalid"
/// convention of the callback-style originals.
///
/// # Panics
///
/// Panics if the strand thread cannot be spawned; use [`run_with`] to handle
/// that case explicitly.
pub fn run_bounded<R, F>(limit: impl Into<Limit>, body: F) -> RunHandle<R>
where
    F: FnOnce(&Cx) -> R + Send + 'static,
    R: Send + 'static,
{
    run_with(RunOptions::default().limit(limit), body)
        .unwrap_or_else(|e| panic!("failed to start run: {e}"))
}

/// Starts a run with full [`RunOptions`].
///
/// Creates a strand (a named OS thread), attaches a [`Flow`] when the limit
/// is bounded, and hands control to `body` immediately. From the caller's
/// point of view this is synchronous: it returns once `body` completes or
/// reaches its first suspension point.
pub fn run_with<R, F>(options: RunOptions, body: F) -> Result<RunHandle<R>>
where
    F: FnOnce(&Cx) -> R + Send + 'static,
    R: Send + 'static,
{
    let flow = match options.limit {
        Limit::Bounded(_) => Some(Arc::new(Flow::new(options.limit))),
        Limit::Unbounded => None,
    };
    let core = Arc::new(StrandCore::with_prefix(&options.name_prefix));
    let completion = Arc::new(Completion::new());

    let mut builder = thread::Builder::new().name(core.name().to_string());
    if let Some(bytes) = options.stack_size {
        builder = builder.stack_size(bytes);
    }

    debug!(strand = %core.id(), limit = %options.limit, "starting run");
    let spawn_result = builder.spawn({
        let core = Arc::clone(&core);
        let completion = Arc::clone(&completion);
        move || {
            core.wait_for_start();
            let cx = Cx::new(Arc::clone(&core), flow, options);
            let outcome = catch_unwind(AssertUnwindSafe(|| body(&cx)));
            let outcome = outcome.map_err(|payload| {
                let text = panic_payload_text(payload.as_ref());
                warn!(strand = %core.id(), panic = %text, "run body panicked");
                Error::body_panicked(text)
            });
            completion.store(outcome);
            core.complete();
        }
    });
    spawn_result.map_err(|e| {
        Error::internal("failed to spawn strand thread").with_source(e)
    })?;

    // Hand the baton to the strand; parks until its first suspension or
    // completion.
    core.start_and_wait_for_yield();
    trace!(strand = %core.id(), "run returned to caller");

    Ok(RunHandle {
        id: core.id(),
        completion,
    })
}

/// Handle to a started run.
///
/// The run keeps executing whether or not the handle is kept; dropping it
/// without joining simply abandons the outcome.
pub struct RunHandle<R> {
    id: StrandId,
    completion: Arc<Completion<R>>,
}

impl<R> RunHandle<R> {
    /// Identity of the run's strand.
    #[must_use]
    pub fn strand_id(&self) -> StrandId {
        self.id
    }

    /// Returns true once the body has finished (normally or by panic).
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completion.is_done()
    }

    /// Parks the caller until the body finishes and returns its outcome.
    ///
    /// A body panic is reported as [`ErrorKind::BodyPanicked`]. If the
    /// outcome was already taken by a successful
    /// [`join_timeout`](Self::join_timeout), this reports an internal error.
    pub fn join(self) -> Result<R> {
        self.completion.take_blocking(None)
    }

    /// Like [`join`](Self::join) but gives up after `timeout`, returning
    /// [`ErrorKind::WaitTimeout`]. The outcome stays available, so the
    /// handle can be joined again later.
    pub fn join_timeout(&self, timeout: Duration) -> Result<R> {
        self.completion.take_blocking(Some(timeout))
    }
}

impl<R> fmt::Debug for RunHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("strand", &self.id)
            .field("done", &self.is_done())
            .finish()
    }
}

enum CompletionSlot<R> {
    Pending,
    Done(Result<R>),
    Taken,
}

/// One-shot outcome cell shared between the strand thread and the handle.
struct Completion<R> {
    slot: Mutex<CompletionSlot<R>>,
    cv: Condvar,
}

impl<R> Completion<R> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(CompletionSlot::Pending),
            cv: Condvar::new(),
        }
    }

    fn store(&self, outcome: Result<R>) {
        let mut slot = self.slot.lock().expect("completion slot poisoned");
        *slot = CompletionSlot::Done(outcome);
        drop(slot);
        self.cv.notify_all();
    }

    fn is_done(&self) -> bool {
        !matches!(
            *self.slot.lock().expect("completion slot poisoned"),
            CompletionSlot::Pending
        )
    }

    fn take_blocking(&self, timeout: Option<Duration>) -> Result<R> {
        let deadline = timeout.map(|t| std::time::Instant::now() + t);
        let mut slot = self.slot.lock().expect("completion slot poisoned");
        loop {
            match std::mem::replace(&mut *slot, CompletionSlot::Taken) {
                CompletionSlot::Done(outcome) => return outcome,
                CompletionSlot::Taken => {
                    return Err(Error::internal("run outcome already taken"));
                }
                CompletionSlot::Pending => {
                    *slot = CompletionSlot::Pending;
                    slot = match deadline {
                        None => self.cv.wait(slot).expect("completion slot poisoned"),
                        Some(deadline) => {
                            let Some(remaining) =
                                deadline.checked_duration_since(std::time::Instant::now())
                            else {
                                return Err(Error::new(ErrorKind::WaitTimeout)
                                    .with_message("run body did not finish in time"));
                            };
                            self.cv
                                .wait_timeout(slot, remaining)
                                .expect("completion slot poisoned")
                                .0
                        }
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    #[test]
    fn straight_through_body_completes_before_run_returns() {
        init_test_logging();
        let handle = run(|_cx| 7);
        assert!(handle.is_done());
        assert_eq!(handle.join().expect("join failed"), 7);
    }

    #[test]
    fn body_panic_is_reported_by_join() {
        init_test_logging();
        let handle = run::<(), _>(|_cx| panic!("kaboom"));
        let err = handle.join().expect_err("expected error");
        assert_eq!(err.kind(), ErrorKind::BodyPanicked);
        assert_eq!(err.message(), Some("kaboom"));
    }

    #[test]
    fn join_timeout_leaves_outcome_for_later_join() {
        init_test_logging();
        let handle = run(|cx| {
            let slow = crate::deferred::Deferred::start(cx, |completer| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(60));
                    completer.resolve("slow");
                });
            });
            slow.wait(cx).expect("wait failed")
        });
        assert!(!handle.is_done());
        let err = handle
            .join_timeout(Duration::from_millis(5))
            .expect_err("expected timeout");
        assert_eq!(err.kind(), ErrorKind::WaitTimeout);
        assert_eq!(handle.join().expect("join failed"), "slow");
    }

    #[test]
    fn run_with_propagates_options() {
        init_test_logging();
        let options = RunOptions::default().limit(3_usize).name_prefix("opt");
        let handle = run_with(options, |cx| {
            let flow = cx.flow().expect("bounded run must carry a flow");
            (flow.limit(), cx.name().starts_with("opt-"))
        })
        .expect("run_with failed");
        let (limit, named) = handle.join().expect("join failed");
        assert_eq!(limit, Limit::from(3));
        assert!(named);
    }
}
