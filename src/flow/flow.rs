//! The flow scheduler: FIFO admission control over pending operations.

use super::Limit;
use crate::tracing_compat::{trace, warn};
use core::fmt;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A queued operation start. Consumed exactly once by dispatch.
pub(crate) type PendingOp = Box<dyn FnOnce() + Send>;

/// Bounds the number of simultaneously running operations while accepting
/// unlimited requests.
///
/// Admission is eager: every [`admit`](Flow::admit) and
/// [`release`](Flow::release) runs the dispatch step, so the pending queue is
/// non-empty only while every slot is occupied. Dispatch pops in FIFO order;
/// growth is monotonic and release always drains, so no admitted operation
/// starves.
///
/// The internal lock is never held across a started operation's own code, so
/// operations may admit further operations re-entrantly.
pub struct Flow {
    limit: Limit,
    inner: Mutex<FlowInner>,
}

struct FlowInner {
    pending: VecDeque<PendingOp>,
    running: usize,
}

/// Point-in-time snapshot of a flow's admission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStats {
    /// The concurrency cap.
    pub limit: Limit,
    /// Operations started but not yet released.
    pub running: usize,
    /// Operations admitted but not yet started.
    pub pending: usize,
}

impl Flow {
    /// Creates a flow with the given cap. Flows are attached to a run by the
    /// entry point; there is no reason to construct one otherwise.
    pub(crate) fn new(limit: Limit) -> Self {
        Self {
            limit,
            inner: Mutex::new(FlowInner {
                pending: VecDeque::new(),
                running: 0,
            }),
        }
    }

    /// Returns the concurrency cap.
    #[must_use]
    pub const fn limit(&self) -> Limit {
        self.limit
    }

    /// Returns a snapshot of the admission state.
    #[must_use]
    pub fn stats(&self) -> FlowStats {
        let inner = self.lock();
        FlowStats {
            limit: self.limit,
            running: inner.running,
            pending: inner.pending.len(),
        }
    }

    /// Appends an operation to the pending queue, then dispatches.
    pub(crate) fn admit(&self, op: PendingOp) {
        let depth = {
            let mut inner = self.lock();
            inner.pending.push_back(op);
            inner.pending.len()
        };
        trace!(limit = %self.limit, pending = depth, "operation admitted");
        self.dispatch();
    }

    /// Frees the slot of a settled operation, then dispatches.
    ///
    /// Called exactly once per started operation, by the completion path.
    pub(crate) fn release(&self) {
        {
            let mut inner = self.lock();
            if inner.running == 0 {
                warn!("flow released with no running operations");
                return;
            }
            inner.running -= 1;
            trace!(limit = %self.limit, running = inner.running, "slot released");
        }
        self.dispatch();
    }

    /// Starts pending operations while slots are free, FIFO.
    ///
    /// The queue head is popped under the lock; the start itself runs outside
    /// it. Each pass re-acquires, so starts admitted re-entrantly by a
    /// running op are picked up in the same drain.
    fn dispatch(&self) {
        loop {
            let op = {
                let mut inner = self.lock();
                if !self.limit.admits(inner.running) || inner.pending.is_empty() {
                    break;
                }
                inner.running += 1;
                trace!(limit = %self.limit, running = inner.running, "starting operation");
                inner.pending.pop_front()
            };
            if let Some(op) = op {
                op();
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlowInner> {
        self.inner.lock().expect("flow state poisoned")
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("Flow")
            .field("limit", &self.limit)
            .field("running", &stats.running)
            .field("pending", &stats.pending)
            .finish()
    }
}
