//! Lowering from the toy-language AST to IR
//!
//! [`lower()`] resolves every name in the program against a function namespace
//! ([`SignatureTable`]) and a per-function stack of variable scopes
//! ([`ScopeStack`]), and emits one IR function per declaration through
//! [`tc_ir::ModuleBuilder`].
//!
//! Errors do not stop lowering. Each failing function keeps its declaration
//! but loses its body, and every error is reported together in a
//! [`LowerFailure`].

pub mod config;
pub mod error;
pub mod lower;
pub mod scope;
pub mod signature;

pub use config::{ConfigError, LowerConfig};
pub use error::{LowerError, LowerErrorKind, LowerFailure, NodeRef};
pub use lower::{DEFAULT_RETURN_VALUE, Lowerer};
pub use scope::{Binding, ScopeError, ScopeStack};
pub use signature::{Signature, SignatureKind, SignatureTable};

use tc_ast::Ast;
use tc_ir::Module;

/// Lower a program with the default configuration
///
/// # Errors
///
/// Returns a [`LowerFailure`] holding every error and the partial module if
/// any declaration failed to lower.
pub fn lower(ast: &Ast) -> Result<Module, LowerFailure> {
    lower_with_config(ast, &LowerConfig::default())
}

/// Lower a program
///
/// # Errors
///
/// Returns a [`LowerFailure`] holding every error and the partial module if
/// any declaration failed to lower.
pub fn lower_with_config(ast: &Ast, config: &LowerConfig) -> Result<Module, LowerFailure> {
    Lowerer::new(ast, config).run()
}
