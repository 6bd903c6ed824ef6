#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use syncflow::{Completer, Cx, Deferred};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Starts a deferred whose op resolves with `value` on a timer thread.
pub fn delayed_value<T>(cx: &Cx, delay: Duration, value: T) -> Deferred<T>
where
    T: Clone + Send + 'static,
{
    Deferred::start(cx, move |completer| {
        thread::spawn(move || {
            thread::sleep(delay);
            completer.resolve(value);
        });
    })
}

/// Starts a deferred whose op rejects with `message` on a timer thread.
pub fn delayed_error<T>(cx: &Cx, delay: Duration, message: &'static str) -> Deferred<T>
where
    T: Clone + Send + 'static,
{
    Deferred::start(cx, move |completer| {
        thread::spawn(move || {
            thread::sleep(delay);
            completer.reject(message);
        });
    })
}

/// Tracks how many operations are in flight and the high-water mark.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks an operation started, updating the high-water mark.
    pub fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    /// Marks an operation finished.
    pub fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Starts a deferred that holds a gauge entry for `delay`, then resolves
/// with `value`.
pub fn gauged_op<T>(
    cx: &Cx,
    gauge: &Arc<ConcurrencyGauge>,
    delay: Duration,
    value: T,
) -> Deferred<T>
where
    T: Clone + Send + 'static,
{
    let gauge = Arc::clone(gauge);
    Deferred::start(cx, move |completer| {
        gauge.enter();
        thread::spawn(move || {
            thread::sleep(delay);
            gauge.exit();
            completer.resolve(value);
        });
    })
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
