//! Execution contexts: named OS threads with a suspend/resume handshake.
//!
//! The crate models a cooperative execution context as a "strand": an OS
//! thread parked on a condition variable whenever it is not the active
//! context of its run tree. The contract is the classic coroutine one —
//! start, suspend, resume, and a handle to the running context — realized
//! with two one-token [`park::Baton`]s per strand.

pub(crate) mod park;
#[allow(clippy::module_inception)]
mod strand;

pub use strand::StrandId;

pub(crate) use strand::{StrandCore, Waiter};
