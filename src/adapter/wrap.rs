//! Function adapters: turn callback-accepting functions into deferred
//! factories.
//!
//! Each wrapper takes a function that receives a [`Completer`] (the typed
//! completion callback) and returns a closure that creates one [`Deferred`]
//! per call, routed through the calling context — bounded runs admit the
//! start to their flow, unbounded runs start it inline.

use crate::cx::Cx;
use crate::deferred::{Completer, Deferred};
use crate::tracing_compat::trace;

/// Wraps a no-argument callback-style function.
///
/// The returned factory creates one deferred per call.
pub fn wrap<T, F>(f: F) -> impl Fn(&Cx) -> Deferred<T>
where
    F: Fn(Completer<T>) + Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    move |cx| Deferred::start(cx, f.clone())
}

/// Wraps a one-argument callback-style function.
pub fn wrap_arg<A, T, F>(f: F) -> impl Fn(&Cx, A) -> Deferred<T>
where
    F: Fn(A, Completer<T>) + Clone + Send + 'static,
    A: Send + 'static,
    T: Clone + Send + 'static,
{
    move |cx, arg| {
        let f = f.clone();
        Deferred::start(cx, move |completer| f(arg, completer))
    }
}

/// Wraps a two-argument callback-style function.
pub fn wrap2<A, B, T, F>(f: F) -> impl Fn(&Cx, A, B) -> Deferred<T>
where
    F: Fn(A, B, Completer<T>) + Clone + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    T: Clone + Send + 'static,
{
    move |cx, a, b| {
        let f = f.clone();
        Deferred::start(cx, move |completer| f(a, b, completer))
    }
}

/// Wraps a slice-argument function, capping the argument list.
///
/// For callees sensitive to extra trailing arguments: the argument vector is
/// truncated to at most `cap` elements before the call. A `cap` of `0` is
/// coerced to `1`.
pub fn wrap_capped<A, T, F>(f: F, cap: usize) -> impl Fn(&Cx, Vec<A>) -> Deferred<T>
where
    F: Fn(Vec<A>, Completer<T>) + Clone + Send + 'static,
    A: Send + 'static,
    T: Clone + Send + 'static,
{
    let cap = cap.max(1);
    move |cx, mut args| {
        if args.len() > cap {
            trace!(given = args.len(), cap, "trimming trailing arguments");
            args.truncate(cap);
        }
        let f = f.clone();
        Deferred::start(cx, move |completer| f(args, completer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_creates_one_deferred_per_call() {
        let cx = Cx::for_testing();
        let ping = wrap(|completer: Completer<u8>| {
            completer.resolve(1);
        });
        let a = ping(&cx);
        let b = ping(&cx);
        assert_eq!(a.wait(&cx).unwrap(), 1);
        assert_eq!(b.wait(&cx).unwrap(), 1);
    }

    #[test]
    fn wrap_arg_passes_the_argument() {
        let cx = Cx::for_testing();
        let double = wrap_arg(|n: u32, completer: Completer<u32>| {
            completer.resolve(n * 2);
        });
        assert_eq!(double(&cx, 21).wait(&cx).unwrap(), 42);
    }

    #[test]
    fn wrap2_passes_both_arguments() {
        let cx = Cx::for_testing();
        let concat = wrap2(|a: String, b: String, completer: Completer<String>| {
            completer.resolve(format!("{a}{b}"));
        });
        assert_eq!(
            concat(&cx, "foo".into(), "bar".into()).wait(&cx).unwrap(),
            "foobar"
        );
    }

    #[test]
    fn wrap_capped_trims_extra_arguments() {
        let cx = Cx::for_testing();
        let first_two = wrap_capped(
            |args: Vec<i32>, completer: Completer<Vec<i32>>| {
                completer.resolve(args);
            },
            2,
        );
        assert_eq!(
            first_two(&cx, vec![1, 2, 3, 4]).wait(&cx).unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn wrap_capped_zero_cap_coerces_to_one() {
        let cx = Cx::for_testing();
        let head = wrap_capped(
            |args: Vec<i32>, completer: Completer<Vec<i32>>| {
                completer.resolve(args);
            },
            0,
        );
        assert_eq!(head(&cx, vec![9, 8, 7]).wait(&cx).unwrap(), vec![9]);
    }
}
