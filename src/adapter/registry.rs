//! Named op collections with explicit deferred/passthrough declarations.
//!
//! The callback-era pattern of wrapping every function in a module except
//! those matching a "synchronous counterpart" naming suffix is replaced by
//! explicit registration: each entry declares whether calling it yields a
//! [`Deferred`] or runs synchronously. No name-pattern filtering exists.

use crate::cx::Cx;
use crate::deferred::{Completer, Deferred};
use crate::error::{Error, ErrorKind, Result};
use crate::tracing_compat::trace;
use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

type DeferredOp<A, T> = Arc<dyn Fn(A, Completer<T>) + Send + Sync>;
type PassthroughOp<A, T> = Arc<dyn Fn(A) -> Result<T> + Send + Sync>;

enum OpEntry<A, T> {
    Deferred(DeferredOp<A, T>),
    Passthrough(PassthroughOp<A, T>),
}

/// A named collection of operations sharing an argument and result type.
///
/// Deferred entries are invoked through [`call`](OpRegistry::call) and yield
/// a [`Deferred`] routed through the calling context; passthrough entries
/// (the synchronous twins) are invoked through
/// [`call_sync`](OpRegistry::call_sync) and stay unwrapped. Calling an entry
/// through the wrong entry point is [`ErrorKind::OpModeMismatch`].
pub struct OpRegistry<A, T> {
    entries: BTreeMap<String, OpEntry<A, T>>,
}

impl<A, T> Default for OpRegistry<A, T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<A, T> OpRegistry<A, T>
where
    A: Send + 'static,
    T: Clone + Send + 'static,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registers a deferred op. Registering a name twice is
    /// [`ErrorKind::DuplicateOp`].
    pub fn deferred<F>(&mut self, name: impl Into<String>, op: F) -> Result<&mut Self>
    where
        F: Fn(A, Completer<T>) + Send + Sync + 'static,
    {
        self.insert(name.into(), OpEntry::Deferred(Arc::new(op)))
    }

    /// Registers a synchronous passthrough op.
    pub fn passthrough<F>(&mut self, name: impl Into<String>, f: F) -> Result<&mut Self>
    where
        F: Fn(A) -> Result<T> + Send + Sync + 'static,
    {
        self.insert(name.into(), OpEntry::Passthrough(Arc::new(f)))
    }

    /// Invokes a deferred entry, creating a deferred per call.
    pub fn call(&self, cx: &Cx, name: &str, arg: A) -> Result<Deferred<T>> {
        match self.entries.get(name) {
            Some(OpEntry::Deferred(op)) => {
                trace!(op = name, "dispatching deferred op");
                let op = Arc::clone(op);
                Ok(Deferred::start(cx, move |completer| op(arg, completer)))
            }
            Some(OpEntry::Passthrough(_)) => Err(Error::new(ErrorKind::OpModeMismatch)
                .with_message(format!("{name:?} is a passthrough op; use call_sync"))),
            None => Err(unknown_op(name)),
        }
    }

    /// Invokes a passthrough entry synchronously.
    pub fn call_sync(&self, name: &str, arg: A) -> Result<T> {
        match self.entries.get(name) {
            Some(OpEntry::Passthrough(f)) => {
                trace!(op = name, "dispatching passthrough op");
                f(arg)
            }
            Some(OpEntry::Deferred(_)) => Err(Error::new(ErrorKind::OpModeMismatch)
                .with_message(format!("{name:?} is a deferred op; use call"))),
            None => Err(unknown_op(name)),
        }
    }

    /// Returns true if `name` is registered (either mode).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns true if `name` is registered as a deferred op.
    #[must_use]
    pub fn is_deferred(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(OpEntry::Deferred(_)))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, entry: OpEntry<A, T>) -> Result<&mut Self> {
        if self.entries.contains_key(&name) {
            return Err(Error::new(ErrorKind::DuplicateOp)
                .with_message(format!("{name:?} is already registered")));
        }
        self.entries.insert(name, entry);
        Ok(self)
    }
}

fn unknown_op(name: &str) -> Error {
    Error::new(ErrorKind::UnknownOp).with_message(format!("no op registered as {name:?}"))
}

impl<A, T> fmt::Debug for OpRegistry<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, entry) in &self.entries {
            map.entry(
                name,
                &match entry {
                    OpEntry::Deferred(_) => "deferred",
                    OpEntry::Passthrough(_) => "passthrough",
                },
            );
        }
        map.finish()
    }
}
