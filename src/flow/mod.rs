//! The scheduler: bounded FIFO admission control.
//!
//! A [`Flow`] accepts unlimited admission requests but starts at most
//! [`Limit`] of them at a time. Deferred results created inside a bounded run
//! register here instead of starting immediately; the flow starts them as
//! slots free up, first admitted first started.

#[allow(clippy::module_inception)]
mod flow;
mod limit;

pub use flow::{Flow, FlowStats};
pub use limit::{Limit, ParseLimitError};
