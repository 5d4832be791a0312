//! Stack of lexical scope frames used while lowering one function

use rustc_hash::FxHashMap;
use tc_intern::Symbol;
use tc_ir::{BlockId, SlotId};
use tc_span::Span;

/// Where a name lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Stack slot holding the variable
    pub slot: SlotId,
    /// Declaration site
    pub span: Span,
}

/// Failure to declare or resolve a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// Name already bound in the innermost frame
    #[error("name already declared in this frame")]
    Redeclared {
        /// The existing binding
        first: Binding,
    },
    /// Name bound in no frame
    #[error("name not declared in any frame")]
    Undefined,
}

/// One layer of bindings
#[derive(Debug)]
pub struct Frame {
    bindings: FxHashMap<Symbol, Binding>,
    block: BlockId,
}

impl Frame {
    /// Block that was current when the frame was entered
    pub fn block(&self) -> BlockId {
        self.block
    }
}

/// Scope frames, innermost last
///
/// Pushing and popping are paired by the caller; popping an empty stack is a
/// bug in the lowering pass, not in the program being lowered.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new innermost frame appending to `block`
    pub fn push_frame(&mut self, block: BlockId) {
        self.frames.push(Frame {
            bindings: FxHashMap::default(),
            block,
        });
        tracing::trace!(depth = self.frames.len(), "push scope frame");
    }

    /// Leave the innermost frame
    ///
    /// # Panics
    ///
    /// Panics if no frame is active.
    #[allow(clippy::panic, reason = "an unbalanced frame stack is an internal compiler error")]
    pub fn pop_frame(&mut self) -> Frame {
        let Some(frame) = self.frames.pop() else {
            panic!("internal compiler error: scope stack underflow");
        };
        tracing::trace!(depth = self.frames.len(), "pop scope frame");
        frame
    }

    /// Whether no frame is active
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Block recorded by the innermost frame
    pub fn current_block(&self) -> Option<BlockId> {
        self.frames.last().map(Frame::block)
    }

    /// Bind `name` in the innermost frame
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Redeclared`] if the innermost frame already binds
    /// `name`. Outer frames are not consulted; an inner binding shadows them.
    ///
    /// # Panics
    ///
    /// Panics if no frame is active.
    #[allow(clippy::panic, reason = "an unbalanced frame stack is an internal compiler error")]
    pub fn declare(&mut self, name: Symbol, binding: Binding) -> Result<(), ScopeError> {
        let Some(frame) = self.frames.last_mut() else {
            panic!("internal compiler error: declaration outside any scope frame");
        };
        if let Some(first) = frame.bindings.get(&name) {
            return Err(ScopeError::Redeclared { first: *first });
        }
        frame.bindings.insert(name, binding);
        Ok(())
    }

    /// Nearest binding of `name`, searching from the innermost frame out
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Undefined`] if no frame binds `name`.
    pub fn resolve(&self, name: Symbol) -> Result<Binding, ScopeError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(&name).copied())
            .ok_or(ScopeError::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_intern::Interner;

    fn binding(slot: u32) -> Binding {
        Binding {
            slot: SlotId(slot),
            span: Span::new(slot, slot + 1),
        }
    }

    #[test]
    fn test_inner_frame_shadows_outer() {
        let interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeStack::new();
        scopes.push_frame(BlockId(0));
        scopes.declare(x, binding(0)).unwrap();
        scopes.push_frame(BlockId(1));
        scopes.declare(x, binding(1)).unwrap();

        assert_eq!(scopes.resolve(x), Ok(binding(1)));
        assert_eq!(scopes.current_block(), Some(BlockId(1)));

        let inner = scopes.pop_frame();
        assert_eq!(inner.block(), BlockId(1));
        assert_eq!(scopes.current_block(), Some(BlockId(0)));
        assert_eq!(scopes.resolve(x), Ok(binding(0)));
    }

    #[test]
    fn test_redeclaration_in_same_frame() {
        let interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeStack::new();
        scopes.push_frame(BlockId(0));
        scopes.declare(x, binding(0)).unwrap();

        assert_eq!(
            scopes.declare(x, binding(1)),
            Err(ScopeError::Redeclared { first: binding(0) })
        );
        assert_eq!(scopes.resolve(x), Ok(binding(0)));
    }

    #[test]
    fn test_undefined_after_pop() {
        let interner = Interner::new();
        let y = interner.intern("y");
        let mut scopes = ScopeStack::new();
        scopes.push_frame(BlockId(0));
        scopes.declare(y, binding(3)).unwrap();
        scopes.pop_frame();

        assert!(scopes.is_empty());
        assert_eq!(scopes.resolve(y), Err(ScopeError::Undefined));
    }

    #[test]
    #[should_panic(expected = "scope stack underflow")]
    fn test_pop_empty_stack_is_fatal() {
        let mut scopes = ScopeStack::new();
        scopes.pop_frame();
    }
}
