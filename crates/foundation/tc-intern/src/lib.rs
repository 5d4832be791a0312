//! Identifier interning
//!
//! Every name in the AST (variables, parameters, functions) is stored once and
//! referred to by a [`Symbol`]. The interner is cheap to clone and can be
//! shared by the parser and the lowering pass.

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::fmt;
use std::sync::Arc;

/// Thread-safe string interner
#[derive(Clone)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern `text`, returning the existing symbol if it was seen before
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Text of a symbol
    ///
    /// # Panics
    ///
    /// Panics if `sym` was produced by a different interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.inner.resolve(&sym)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Interner")
            .field("len", &self.inner.len())
            .finish()
    }
}
