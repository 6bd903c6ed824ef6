//! Deferred/wait semantics: settle convention, fast-path idempotence,
//! first-settle-wins, panic isolation, waiter restrictions, bounded waits.

mod common;

use common::*;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use syncflow::{run, Completer, Deferred, ErrorKind};

#[test]
fn resolved_value_returns_from_wait() {
    init_test_logging();
    test_phase!("resolved_value_returns_from_wait");

    let handle = run(|cx| delayed_value(cx, Duration::from_millis(10), 42).wait(cx));
    assert_eq!(handle.join().expect("join failed").expect("wait failed"), 42);
    test_complete!("resolved_value_returns_from_wait");
}

#[test]
fn rejection_raises_from_wait_with_message() {
    init_test_logging();
    test_phase!("rejection_raises_from_wait_with_message");

    let handle = run(|cx| delayed_error::<u32>(cx, Duration::from_millis(10), "x").wait(cx));
    let err = handle.join().expect("join failed").expect_err("expected error");
    assert_eq!(err.kind(), ErrorKind::User);
    assert_eq!(err.message(), Some("x"));
    test_complete!("rejection_raises_from_wait_with_message");
}

#[test]
fn raised_errors_carry_stitched_traces() {
    init_test_logging();
    test_phase!("raised_errors_carry_stitched_traces");

    let handle = run(|cx| delayed_error::<u32>(cx, Duration::from_millis(10), "x").wait(cx));
    let err = handle.join().expect("join failed").expect_err("expected error");
    assert!(err.origin().is_some(), "rejection site must be captured");
    assert!(err.await_site().is_some(), "wait site must be captured");
    let rendered = format!("{err:#}");
    assert!(rendered.contains("origin:"));
    assert!(rendered.contains("awaited at:"));
    test_complete!("raised_errors_carry_stitched_traces");
}

#[test]
fn terminal_fast_path_is_idempotent() {
    init_test_logging();
    test_phase!("terminal_fast_path_is_idempotent");

    let handle = run(|cx| {
        let ok = delayed_value(cx, Duration::from_millis(10), 7);
        assert_eq!(ok.wait(cx).expect("wait failed"), 7);
        // Second read: same value, no suspension (the op settled long ago).
        assert_eq!(ok.wait(cx).expect("wait failed"), 7);

        let bad = delayed_error::<u32>(cx, Duration::from_millis(10), "x");
        let first = bad.wait(cx).expect_err("expected error");
        let second = bad.wait(cx).expect_err("expected error");
        assert_eq!(first.message(), second.message());
        assert_eq!(first.kind(), second.kind());
    });
    handle.join().expect("join failed");
    test_complete!("terminal_fast_path_is_idempotent");
}

#[test]
fn first_settle_wins_and_later_attempts_are_counted() {
    init_test_logging();
    test_phase!("first_settle_wins_and_later_attempts_are_counted");

    let handle = run(|cx| {
        let d = Deferred::start(cx, |completer: Completer<u32>| {
            assert!(completer.resolve(1));
            assert!(!completer.resolve(2), "second resolve must lose");
            assert!(!completer.reject("late"), "late reject must lose");
        });
        assert_eq!(d.wait(cx).expect("wait failed"), 1);
        assert_eq!(d.state_name(), "resolved");
        assert_eq!(d.double_settle_count(), 2);
    });
    handle.join().expect("join failed");
    test_complete!("first_settle_wins_and_later_attempts_are_counted");
}

#[test]
fn panicking_op_rejects_and_stales_its_completer() {
    init_test_logging();
    test_phase!("panicking_op_rejects_and_stales_its_completer");

    let escaped: Arc<Mutex<Option<Completer<u32>>>> = Arc::new(Mutex::new(None));
    let handle = run({
        let escaped = Arc::clone(&escaped);
        move |cx| {
            let d = Deferred::start(cx, {
                let escaped = Arc::clone(&escaped);
                move |completer: Completer<u32>| {
                    // Stash a clone the way a scheduled callback would hold one,
                    // then blow up before settling.
                    *escaped.lock().unwrap() = Some(completer.clone());
                    panic!("op exploded");
                }
            });
            let err = d.wait(cx).expect_err("expected error");
            assert_eq!(err.kind(), ErrorKind::OpPanicked);
            assert_eq!(err.message(), Some("op exploded"));
            d
        }
    });
    let d = handle.join().expect("join failed");

    // The completer that survived the unwind must not be able to settle.
    let stale = escaped.lock().unwrap().take().expect("completer not stashed");
    assert!(!stale.resolve(5));
    assert_eq!(d.state_name(), "rejected");
    test_complete!("panicking_op_rejects_and_stales_its_completer");
}

#[test]
fn second_concurrent_waiter_is_rejected() {
    init_test_logging();
    test_phase!("second_concurrent_waiter_is_rejected");

    let (tx, rx) = mpsc::channel();
    let first = run(move |cx| {
        let d = delayed_value(cx, Duration::from_millis(120), 5);
        tx.send(d.clone()).expect("send failed");
        d.wait(cx)
    });

    let d = rx.recv().expect("recv failed");
    // Give the first strand time to suspend on the deferred.
    thread::sleep(Duration::from_millis(30));
    let second = run(move |cx| d.wait(cx));
    let err = second
        .join()
        .expect("join failed")
        .expect_err("expected waiter conflict");
    assert_eq!(err.kind(), ErrorKind::WaiterConflict);

    // The first waiter is unaffected.
    assert_eq!(first.join().expect("join failed").expect("wait failed"), 5);
    test_complete!("second_concurrent_waiter_is_rejected");
}

#[test]
fn immediate_settle_races_the_wait_registration() {
    init_test_logging();
    test_phase!("immediate_settle_races_the_wait_registration");

    // An op that settles with no delay can fire between the strand
    // registering as waiter and actually parking, so its suspend and its
    // completion both yield before the run caller and the settling thread
    // consume their handoffs. Iterate to catch the window.
    for i in 0..200_u32 {
        let handle = run(move |cx| {
            let d = Deferred::start(cx, move |completer: Completer<u32>| {
                thread::spawn(move || {
                    completer.resolve(i);
                });
            });
            d.wait(cx)
        });
        assert_eq!(handle.join().expect("join failed").expect("wait failed"), i);
    }
    test_complete!("immediate_settle_races_the_wait_registration");
}

#[test]
fn bounded_wait_elapses_without_consuming_the_result() {
    init_test_logging();
    test_phase!("bounded_wait_elapses_without_consuming_the_result");

    let handle = run(|cx| {
        let d = delayed_value(cx, Duration::from_millis(80), 11);
        let err = d
            .wait_timeout(cx, Duration::from_millis(15))
            .expect_err("expected timeout");
        assert_eq!(err.kind(), ErrorKind::WaitTimeout);
        assert!(!d.is_settled());
        // The registration was withdrawn; a later unbounded wait still
        // retrieves the value.
        assert_eq!(d.wait(cx).expect("wait failed"), 11);
    });
    handle.join().expect("join failed");
    test_complete!("bounded_wait_elapses_without_consuming_the_result");
}

#[test]
fn bounded_wait_on_settled_deferred_is_immediate() {
    init_test_logging();
    test_phase!("bounded_wait_on_settled_deferred_is_immediate");

    let handle = run(|cx| {
        let d = Deferred::start(cx, |completer: Completer<&'static str>| {
            completer.resolve("ready");
        });
        assert_eq!(
            d.wait_timeout(cx, Duration::from_millis(1)).expect("wait failed"),
            "ready"
        );
    });
    handle.join().expect("join failed");
    test_complete!("bounded_wait_on_settled_deferred_is_immediate");
}

#[test]
fn empty_completion_resolves_unit() {
    init_test_logging();
    test_phase!("empty_completion_resolves_unit");

    let handle = run(|cx| {
        let d = Deferred::start(cx, |completer: Completer<()>| {
            thread::spawn(move || {
                completer.resolve(());
            });
        });
        d.wait(cx).expect("wait failed");
    });
    handle.join().expect("join failed");
    test_complete!("empty_completion_resolves_unit");
}

#[test]
fn tuple_payload_carries_multiple_values() {
    init_test_logging();
    test_phase!("tuple_payload_carries_multiple_values");

    let handle = run(|cx| {
        let d = Deferred::start(cx, |completer: Completer<(u32, &'static str)>| {
            thread::spawn(move || {
                completer.resolve((7, "seven"));
            });
        });
        d.wait(cx)
    });
    let (n, s) = handle.join().expect("join failed").expect("wait failed");
    assert_eq!((n, s), (7, "seven"));
    test_complete!("tuple_payload_carries_multiple_values");
}
