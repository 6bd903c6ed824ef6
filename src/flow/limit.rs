//! Concurrency limits for flow admission control.

use core::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// How many operations a [`Flow`](super::Flow) may have running at once.
///
/// Programmatic conversions are forgiving: `0` (the "non-positive" case of
/// the callback-style originals) coerces to `Unbounded`. Textual parsing via
/// [`FromStr`] is strict and rejects garbage, so misconfigured environment
/// variables surface as errors instead of silently lifting the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    /// At most this many operations run concurrently.
    Bounded(NonZeroUsize),
    /// No admission control; operations start immediately.
    Unbounded,
}

impl Limit {
    /// Creates a bounded limit, coercing `0` to [`Limit::Unbounded`].
    #[must_use]
    pub fn bounded(n: usize) -> Self {
        NonZeroUsize::new(n).map_or(Self::Unbounded, Self::Bounded)
    }

    /// Returns true if this limit caps concurrency.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        matches!(self, Self::Bounded(_))
    }

    /// Returns the cap, or `None` when unbounded.
    #[must_use]
    pub const fn get(&self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some(n.get()),
            Self::Unbounded => None,
        }
    }

    /// Returns true if one more operation may start given `running` in flight.
    #[must_use]
    pub const fn admits(&self, running: usize) -> bool {
        match self {
            Self::Bounded(n) => running < n.get(),
            Self::Unbounded => true,
        }
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::Unbounded
    }
}

impl From<usize> for Limit {
    fn from(n: usize) -> Self {
        Self::bounded(n)
    }
}

impl From<NonZeroUsize> for Limit {
    fn from(n: NonZeroUsize) -> Self {
        Self::Bounded(n)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Error parsing a [`Limit`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid limit {input:?}: expected a non-negative integer or \"unbounded\"")]
pub struct ParseLimitError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Limit {
    type Err = ParseLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unbounded") || trimmed.eq_ignore_ascii_case("inf") {
            return Ok(Self::Unbounded);
        }
        trimmed
            .parse::<usize>()
            .map(Self::bounded)
            .map_err(|_| ParseLimitError {
                input: s.to_string(),
            })
    }
}
