//! Function namespace
//!
//! Functions are registered before any body is lowered, so calls may refer to
//! functions declared later in the program. Function names never collide with
//! variable names; the two live in separate tables.

use indexmap::IndexMap;
use indexmap::map::Entry;
use rustc_hash::FxBuildHasher;
use tc_intern::Symbol;
use tc_ir::FuncId;
use tc_span::Span;

/// How a callable is provided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// Declared with `extern`, no body
    Extern,
    /// Declared with a body in this program
    Defined,
    /// Implicit function wrapping top-level statements
    Entry,
}

/// A registered callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// IR function backing the callable
    pub func: FuncId,
    /// Number of parameters
    pub arity: usize,
    /// How the callable is provided
    pub kind: SignatureKind,
    /// Declaration site
    pub span: Span,
}

/// Name → signature, in registration order
#[derive(Debug, Default)]
pub struct SignatureTable {
    entries: IndexMap<Symbol, Signature, FxBuildHasher>,
}

impl SignatureTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, calling `declare` to build its signature only if the
    /// name is free
    ///
    /// # Errors
    ///
    /// Returns the existing signature if `name` is already registered; `declare`
    /// is not called in that case.
    pub fn register(
        &mut self,
        name: Symbol,
        declare: impl FnOnce() -> Signature,
    ) -> Result<Signature, Signature> {
        match self.entries.entry(name) {
            Entry::Occupied(entry) => Err(*entry.get()),
            Entry::Vacant(entry) => Ok(*entry.insert(declare())),
        }
    }

    /// Signature registered under `name`
    pub fn get(&self, name: Symbol) -> Option<&Signature> {
        self.entries.get(&name)
    }

    /// Number of registered callables
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
