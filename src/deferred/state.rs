//! The deferred-result state machine.

use crate::error::Error;
use core::fmt;

/// Lifecycle of one deferred result.
///
/// `Resolved` and `Rejected` are terminal: the first transition into either
/// is final. The enum makes value/error mutual exclusion structural — a
/// deferred can never be observed with both.
pub enum DeferredState<T> {
    /// Created, not yet started (admitted to a flow, awaiting a slot).
    Pending,
    /// The underlying operation has been started.
    Running,
    /// Settled with a value.
    Resolved(T),
    /// Settled with an error.
    Rejected(Error),
}

impl<T> DeferredState<T> {
    /// Returns true once the state is `Resolved` or `Rejected`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Rejected(_))
    }

    /// Short state name for logs and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Resolved(_) => "resolved",
            Self::Rejected(_) => "rejected",
        }
    }
}

impl<T> fmt::Debug for DeferredState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Running => f.write_str("Running"),
            Self::Resolved(_) => f.write_str("Resolved(..)"),
            Self::Rejected(e) => write!(f, "Rejected({e})"),
        }
    }
}
