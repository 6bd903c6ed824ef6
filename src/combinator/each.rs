//! Bulk iteration: issue one adapted call per element, wait on all.

use crate::cx::Cx;
use crate::deferred::Deferred;
use crate::error::Result;
use crate::flow::Limit;
use crate::run::run_bounded;

/// Issues one adapted call per element inside a dedicated run and waits on
/// all of them in admission order, reporting `Ok(())` or the first error
/// through `done`.
///
/// The run is bounded by `limit` (`0` or [`Limit::Unbounded`] for no cap).
/// Operations started before the first error still run to completion; there
/// is no cancellation.
pub fn for_each<I, T, F, D>(limit: impl Into<Limit>, items: I, f: F, done: D)
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    T: Clone + Send + 'static,
    F: Fn(&Cx, I::Item) -> Deferred<T> + Send + 'static,
    D: FnOnce(Result<()>) + Send + 'static,
{
    run_bounded(limit, move |cx| done(wait_all(cx, items, &f).map(|_| ())));
}

/// Blocking convenience: like [`for_each`] but joins the dedicated run and
/// returns the outcome directly.
pub fn try_for_each<I, T, F>(limit: impl Into<Limit>, items: I, f: F) -> Result<()>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    T: Clone + Send + 'static,
    F: Fn(&Cx, I::Item) -> Deferred<T> + Send + 'static,
{
    run_bounded(limit, move |cx| wait_all(cx, items, &f).map(|_| ())).join()?
}

/// Callable inside an existing context: returns a deferred that settles when
/// the dedicated inner run has waited on every element.
///
/// The returned deferred routes through the calling context like any other
/// adapted call, so the launch of the bulk operation itself is subject to
/// the outer flow's admission control.
pub fn for_each_deferred<I, T, F>(
    cx: &Cx,
    limit: impl Into<Limit>,
    items: I,
    f: F,
) -> Deferred<()>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
    T: Clone + Send + 'static,
    F: Fn(&Cx, I::Item) -> Deferred<T> + Send + 'static,
{
    let limit = limit.into();
    Deferred::start(cx, move |completer| {
        for_each(limit, items, f, move |outcome| {
            completer.settle(outcome);
        });
    })
}

/// Issues every call first (so they overlap up to the limit), then waits in
/// admission order, stopping at the first error.
pub(crate) fn wait_all<I, T, F>(cx: &Cx, items: I, f: &F) -> Result<Vec<T>>
where
    I: IntoIterator,
    T: Clone + Send + 'static,
    F: Fn(&Cx, I::Item) -> Deferred<T>,
{
    let deferreds: Vec<Deferred<T>> = items.into_iter().map(|item| f(cx, item)).collect();
    let mut values = Vec::with_capacity(deferreds.len());
    for deferred in &deferreds {
        values.push(deferred.wait(cx)?);
    }
    Ok(values)
}
