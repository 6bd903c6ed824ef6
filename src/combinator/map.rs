//! Bulk mapping: collect one result per element, in input order.

use super::each::wait_all;
use crate::cx::Cx;
use crate::deferred::Deferred;
use crate::error::Result;
use crate::flow::Limit;
use crate::run::run_bounded;

/// Issues one adapted call per element inside a dedicated run, waits on all
/// of them, and reports the values — in input order — or the first error
/// through `done`.
///
/// Completion order of the underlying operations is unconstrained; the
/// result order is fixed by the input.
pub fn map<I, T, F, D>(limit: impl Into<Limit>, items: I, f: F, done: D)
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    T: Clone + Send + 'static,
    F: Fn(&Cx, I::Item) -> Deferred<T> + Send + 'static,
    D: FnOnce(Result<Vec<T>>) + Send + 'static,
{
    run_bounded(limit, move |cx| done(wait_all(cx, items, &f)));
}

/// Blocking convenience: like [`map`] but joins the dedicated run and
/// returns the collected values directly.
pub fn try_map<I, T, F>(limit: impl Into<Limit>, items: I, f: F) -> Result<Vec<T>>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    T: Clone + Send + 'static,
    F: Fn(&Cx, I::Item) -> Deferred<T> + Send + 'static,
{
    run_bounded(limit, move |cx| wait_all(cx, items, &f)).join()?
}

/// Callable inside an existing context: returns a deferred that settles with
/// the collected values when the dedicated inner run completes.
pub fn map_deferred<I, T, F>(
    cx: &Cx,
    limit: impl Into<Limit>,
    items: I,
    f: F,
) -> Deferred<Vec<T>>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    T: Clone + Send + 'static,
    F: Fn(&Cx, I::Item) -> Deferred<T> + Send + 'static,
{
    let limit = limit.into();
    Deferred::start(cx, move |completer| {
        map(limit, items, f, move |outcome| {
            completer.settle(outcome);
        });
    })
}
