//! Counting parking cell used by the strand handshake.
//!
//! A [`Baton`] holds "go" tokens. `give` deposits a token and wakes a parked
//! taker; `take` parks until a token is available and consumes one. The
//! suspend/resume protocol normally circulates a single baton, which is what
//! keeps at most one strand in a run tree active at a time — but the cell
//! itself must count: when a completer settles in the window between waiter
//! registration and the strand's park, the resume token is already deposited,
//! so the strand's suspend-then-complete sequence deposits two yields before
//! either parked taker (the run caller and the resuming completer thread) is
//! scheduled to consume the first. A boolean cell would coalesce them and
//! strand one taker forever.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A counting handoff cell built on `Mutex` + `Condvar`.
///
/// Spurious condvar wakeups are absorbed by re-checking the token count.
#[derive(Debug)]
pub(crate) struct Baton {
    tokens: Mutex<usize>,
    cv: Condvar,
}

impl Baton {
    /// Creates an empty baton (no tokens deposited).
    pub(crate) fn new() -> Self {
        Self {
            tokens: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    /// Deposits a token and wakes a parked taker, if any.
    pub(crate) fn give(&self) {
        let mut tokens = self.tokens.lock().expect("baton lock poisoned");
        *tokens += 1;
        drop(tokens);
        self.cv.notify_one();
    }

    /// Parks the calling thread until a token is available, then consumes one.
    ///
    /// Returns immediately if a token was already deposited.
    pub(crate) fn take(&self) {
        let mut tokens = self.tokens.lock().expect("baton lock poisoned");
        while *tokens == 0 {
            tokens = self.cv.wait(tokens).expect("baton lock poisoned");
        }
        *tokens -= 1;
    }

    /// Like [`take`](Self::take) but gives up after `timeout`.
    ///
    /// Returns `true` if a token was consumed, `false` on timeout (tokens
    /// deposited later stay in the cell).
    pub(crate) fn take_timeout(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let mut tokens = self.tokens.lock().expect("baton lock poisoned");
        while *tokens == 0 {
            let Some(remaining) = deadline.checked_duration_since(std::time::Instant::now())
            else {
                return false;
            };
            let (guard, result) = self
                .cv
                .wait_timeout(tokens, remaining)
                .expect("baton lock poisoned");
            tokens = guard;
            if result.timed_out() && *tokens == 0 {
                return false;
            }
        }
        *tokens -= 1;
        true
    }
}
