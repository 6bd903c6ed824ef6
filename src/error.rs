//! Error types and error handling strategy for Syncflow.
//!
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Operation failures surface only at the matching [`Deferred::wait`] call
//! - Panics inside wrapped operations are isolated and converted to
//!   [`ErrorKind::OpPanicked`] rather than unwinding through the scheduler
//! - Errors raised across a suspension boundary carry both the rejection-site
//!   backtrace and the wait-site backtrace, stitched into one causal chain
//!
//! # Error Categories
//!
//! - **Completion**: failures at the completion-callback boundary
//! - **Wait**: failures of the blocking read itself
//! - **Run**: failures of a run body or its handle
//! - **Registry**: op-registry misuse
//! - **Config**: configuration parse/validation failures
//! - **Internal**: crate bugs and impossible states
//! - **User**: errors reported by wrapped operations
//!
//! # Trace Stitching
//!
//! A debugger examining an error raised from `wait` sees two disconnected
//! stacks: where the operation rejected, and where the waiting strand resumed.
//! [`Error`] stores both ([`Error::origin`], [`Error::await_site`]) and the
//! alternate `Display` form (`{:#}`) renders them as a single chain.
//!
//! [`Deferred::wait`]: crate::deferred::Deferred::wait

use core::fmt;
use std::backtrace::Backtrace;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Completion ===
    /// The wrapped operation panicked before settling its deferred.
    OpPanicked,

    // === Wait ===
    /// A second waiter tried to suspend on a deferred that already has one.
    WaiterConflict,
    /// A bounded wait elapsed before the deferred settled.
    WaitTimeout,

    // === Run ===
    /// The run body panicked; reported by `RunHandle::join`.
    BodyPanicked,

    // === Registry ===
    /// No op registered under the requested name.
    UnknownOp,
    /// An op was called through the wrong entry point (deferred vs sync).
    OpModeMismatch,
    /// An op name was registered twice.
    DuplicateOp,

    // === Config ===
    /// Configuration value failed to parse or validate.
    InvalidConfig,

    // === Internal ===
    /// Internal crate error (bug).
    Internal,

    // === User ===
    /// Error reported by a wrapped operation through its completer.
    User,
}

impl ErrorKind {
    /// Returns the error category for this kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::OpPanicked => ErrorCategory::Completion,
            Self::WaiterConflict | Self::WaitTimeout => ErrorCategory::Wait,
            Self::BodyPanicked => ErrorCategory::Run,
            Self::UnknownOp | Self::OpModeMismatch | Self::DuplicateOp => ErrorCategory::Registry,
            Self::InvalidConfig => ErrorCategory::Config,
            Self::Internal => ErrorCategory::Internal,
            Self::User => ErrorCategory::User,
        }
    }

    /// Returns true if retrying the failed call may succeed.
    ///
    /// Only `WaitTimeout` qualifies: the wait can be reissued without
    /// consuming the eventual result. Everything else is either a permanent
    /// outcome or a programming error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::WaitTimeout)
    }
}

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Completion-callback boundary failures.
    Completion,
    /// Blocking-read failures.
    Wait,
    /// Run body / handle failures.
    Run,
    /// Op-registry misuse.
    Registry,
    /// Configuration failures.
    Config,
    /// Internal crate errors.
    Internal,
    /// User-originated errors.
    User,
}

/// The main error type for Syncflow operations.
///
/// Cheaply clonable: the source chain and backtraces are behind `Arc` so a
/// rejected deferred can hand the same error to repeated `wait` calls.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    origin: Option<Arc<Backtrace>>,
    await_site: Option<Arc<Backtrace>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            origin: None,
            await_site: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns true if retrying the failed call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a user error carrying an operation-reported message.
    #[must_use]
    pub fn user(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::User).with_message(msg)
    }

    /// Creates an internal error (crate bug).
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal).with_message(detail)
    }

    /// Creates an error for an operation that panicked before settling.
    #[must_use]
    pub fn op_panicked(payload: impl Into<String>) -> Self {
        Self::new(ErrorKind::OpPanicked).with_message(payload)
    }

    /// Creates an error for a run body that panicked.
    #[must_use]
    pub fn body_panicked(payload: impl Into<String>) -> Self {
        Self::new(ErrorKind::BodyPanicked).with_message(payload)
    }

    /// Returns the backtrace captured where the rejection happened.
    #[must_use]
    pub fn origin(&self) -> Option<&Backtrace> {
        self.origin.as_deref()
    }

    /// Returns the backtrace captured at the raising `wait` site.
    #[must_use]
    pub fn await_site(&self) -> Option<&Backtrace> {
        self.await_site.as_deref()
    }

    /// Records the rejection-site backtrace. The first capture wins so a
    /// re-raised error keeps pointing at its true origin.
    #[must_use]
    pub(crate) fn with_origin(mut self, bt: Backtrace) -> Self {
        if self.origin.is_none() {
            self.origin = Some(Arc::new(bt));
        }
        self
    }

    /// Records the wait-site backtrace on the raised copy.
    #[must_use]
    pub(crate) fn with_await_site(mut self, bt: Backtrace) -> Self {
        self.await_site = Some(Arc::new(bt));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        if f.alternate() {
            if let Some(origin) = &self.origin {
                write!(f, "\norigin:\n{origin}")?;
            }
            if let Some(await_site) = &self.await_site {
                write!(f, "\nawaited at:\n{await_site}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("has_origin", &self.origin.is_some())
            .field("has_await_site", &self.await_site.is_some())
            .finish_non_exhaustive()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self::user(msg)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::user(msg)
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Attach a context message on error.
    fn context(self, msg: impl Into<String>) -> Result<T>;
    /// Attach a context message computed lazily on error.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for core::result::Result<T, E> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_message(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.into().with_message(f()))
    }
}

/// A specialized Result type for Syncflow operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Renders a panic payload as text, preserving `&str` and `String` payloads.
pub(crate) fn panic_payload_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct Underlying;

    impl fmt::Display for Underlying {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "underlying")
        }
    }

    impl std::error::Error for Underlying {}

    #[test]
    fn display_without_message() {
        let err = Error::new(ErrorKind::Internal);
        assert_eq!(err.to_string(), "Internal");
    }

    #[test]
    fn display_with_message() {
        let err = Error::user("disk on fire");
        assert_eq!(err.to_string(), "User: disk on fire");
    }

    #[test]
    fn source_chain_is_exposed() {
        let err = Error::new(ErrorKind::User)
            .with_message("outer")
            .with_source(Underlying);
        let source = err.source().expect("source missing");
        assert_eq!(source.to_string(), "underlying");
    }

    #[test]
    fn categories_match_kind() {
        assert_eq!(ErrorKind::OpPanicked.category(), ErrorCategory::Completion);
        assert_eq!(ErrorKind::WaiterConflict.category(), ErrorCategory::Wait);
        assert_eq!(ErrorKind::WaitTimeout.category(), ErrorCategory::Wait);
        assert_eq!(ErrorKind::BodyPanicked.category(), ErrorCategory::Run);
        assert_eq!(ErrorKind::UnknownOp.category(), ErrorCategory::Registry);
        assert_eq!(ErrorKind::InvalidConfig.category(), ErrorCategory::Config);
        assert_eq!(ErrorKind::User.category(), ErrorCategory::User);
    }

    #[test]
    fn only_wait_timeout_is_retryable() {
        assert!(ErrorKind::WaitTimeout.is_retryable());
        assert!(!ErrorKind::User.is_retryable());
        assert!(!ErrorKind::OpPanicked.is_retryable());
    }

    #[test]
    fn stitched_traces_render_in_alternate_form() {
        let err = Error::user("x")
            .with_origin(Backtrace::force_capture())
            .with_await_site(Backtrace::force_capture());
        let rendered = format!("{err:#}");
        assert!(rendered.contains("origin:"));
        assert!(rendered.contains("awaited at:"));
        // Plain form stays one line.
        assert_eq!(err.to_string(), "User: x");
    }

    #[test]
    fn first_origin_capture_wins() {
        let err = Error::user("x").with_origin(Backtrace::force_capture());
        let first = format!("{:?}", err.origin().expect("origin missing"));
        let err = err.with_origin(Backtrace::force_capture());
        let second = format!("{:?}", err.origin().expect("origin missing"));
        assert_eq!(first, second);
    }

    #[test]
    fn result_ext_adds_message() {
        let res: core::result::Result<(), String> = Err("boom".to_string());
        let err = res.context("op failed").expect_err("expected err");
        assert_eq!(err.kind(), ErrorKind::User);
        assert_eq!(err.to_string(), "User: op failed");
    }

    #[test]
    fn panic_payload_text_variants() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("str panic");
        assert_eq!(panic_payload_text(payload.as_ref()), "str panic");

        let payload: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(panic_payload_text(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_payload_text(payload.as_ref()), "non-string panic payload");
    }
}
