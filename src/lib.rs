//! Syncflow: bounded cooperative flow control with blocking deferred results.
//!
//! # Overview
//!
//! Syncflow lets callback-style asynchronous operations be invoked as if they
//! were synchronous calls, while capping how many such operations may be
//! outstanding at once. The core is two cooperating abstractions:
//!
//! - [`Flow`]: a FIFO admission-control queue bounding how many operations are
//!   running their underlying call at any instant.
//! - [`Deferred`]: a write-once result container that can be read
//!   synchronously, or — if not yet settled — suspends the calling execution
//!   context until it is.
//!
//! Execution contexts ("strands") are OS threads parked on a condition
//! variable; within one run tree at most one strand executes application code
//! at a time. Concurrency here means "number of in-flight operations", not
//! CPU parallelism.
//!
//! # Example
//!
//! ```no_run
//! use syncflow::{run_bounded, Deferred};
//! use std::thread;
//! use std::time::Duration;
//!
//! let handle = run_bounded(2, |cx| {
//!     let reads: Vec<_> = (0..5)
//!         .map(|i| {
//!             Deferred::start(cx, move |completer| {
//!                 thread::spawn(move || {
//!                     thread::sleep(Duration::from_millis(50));
//!                     completer.resolve(i * 10);
//!                 });
//!             })
//!         })
//!         .collect();
//!     reads.iter().map(|d| d.wait(cx)).collect::<Result<Vec<i32>, _>>()
//! });
//! let values = handle.join().expect("run failed").expect("wait failed");
//! assert_eq!(values, vec![0, 10, 20, 30, 40]);
//! ```
//!
//! # Module Structure
//!
//! - [`run`](mod@run): entry points ([`run`], [`run_bounded`], [`run_with`])
//! - [`flow`]: the admission-control scheduler
//! - [`deferred`]: deferred results and their producer-side [`Completer`]
//! - [`cx`]: the explicit per-run context handle
//! - [`strand`]: the suspend/resume execution-context primitive
//! - [`adapter`]: wrapping callback-accepting functions and named collections
//! - [`combinator`]: bulk `for_each`/`map` helpers built on the core
//! - [`config`]: run options, env overrides, optional TOML config
//! - [`error`]: crate-wide error types with suspension-boundary traces

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod adapter;
pub mod combinator;
pub mod config;
pub mod cx;
pub mod deferred;
pub mod error;
pub mod flow;
pub mod run;
pub mod strand;
pub mod tracing_compat;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use adapter::{wrap, wrap2, wrap_arg, wrap_capped, OpRegistry};
pub use combinator::{for_each, for_each_deferred, map, map_deferred, try_for_each, try_map};
pub use config::{ConfigError, RunOptions};
pub use cx::Cx;
pub use deferred::{Completer, Deferred, DeferredState};
pub use error::{Error, ErrorCategory, ErrorKind, Result, ResultExt};
pub use flow::{Flow, FlowStats, Limit};
pub use run::{run, run_bounded, run_with, RunHandle};
pub use strand::StrandId;
