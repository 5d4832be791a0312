//! Lowering diagnostics
//!
//! Note: miette's `#[derive(Diagnostic)]` only reads the `code`/`help`
//! attributes here; spans are rendered through codespan.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;
use tc_ast::{ExprId, StmtId};
use tc_ir::Module;
use tc_span::Span;
use thiserror::Error;

/// The AST node a diagnostic points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// An expression node
    Expr(ExprId),
    /// A statement node
    Stmt(StmtId),
}

/// Diagnostic kinds, without their payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LowerErrorKind {
    /// Name declared twice in one frame or namespace
    Redeclaration,
    /// Variable with no binding
    UndefinedIdentifier,
    /// Call to an unregistered function
    UndefinedFunction,
    /// Wrong number of call arguments
    ArityMismatch,
    /// Operator with no lowering rule
    UnsupportedOperator,
}

/// An error in the program being lowered
#[derive(Error, miette::Diagnostic, Debug, Clone, PartialEq)]
pub enum LowerError {
    /// Name declared twice in the same frame (or function declared twice)
    #[error("`{name}` is already declared in this scope")]
    #[diagnostic(
        code(lower::redeclaration),
        help("rename one of the declarations or turn the second into an assignment")
    )]
    Redeclaration {
        /// The name
        name: String,
        /// The second declaration
        node: NodeRef,
        /// Location of the second declaration
        span: Span,
        /// Location of the first declaration
        first: Span,
    },

    /// Variable reference with no binding in any active frame
    #[error("cannot find variable `{name}` in this scope")]
    #[diagnostic(
        code(lower::undefined_identifier),
        help("variables must be declared with `var` before they are used or assigned")
    )]
    UndefinedIdentifier {
        /// The name
        name: String,
        /// The offending identifier or assignment
        node: NodeRef,
        /// Location of the reference
        span: Span,
    },

    /// Call to a name with no registered signature
    #[error("cannot find function `{name}`")]
    #[diagnostic(
        code(lower::undefined_function),
        help("declare the function, or add an `extern` declaration for it")
    )]
    UndefinedFunction {
        /// The callee name
        name: String,
        /// The call
        node: NodeRef,
        /// Location of the call
        span: Span,
    },

    /// Call with the wrong number of arguments
    #[error("function `{name}` takes {expected} argument(s) but {found} were supplied")]
    #[diagnostic(code(lower::arity_mismatch))]
    ArityMismatch {
        /// The callee name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
        /// The call
        node: NodeRef,
        /// Location of the call
        span: Span,
    },

    /// Binary operator with no lowering rule
    #[error("operator `{op}` is not supported")]
    #[diagnostic(
        code(lower::unsupported_operator),
        help("supported operators are + - * / < > ==")
    )]
    UnsupportedOperator {
        /// The operator token
        op: String,
        /// The binary expression
        node: NodeRef,
        /// Location of the expression
        span: Span,
    },
}

impl LowerError {
    /// Kind of the error
    pub fn kind(&self) -> LowerErrorKind {
        match self {
            Self::Redeclaration { .. } => LowerErrorKind::Redeclaration,
            Self::UndefinedIdentifier { .. } => LowerErrorKind::UndefinedIdentifier,
            Self::UndefinedFunction { .. } => LowerErrorKind::UndefinedFunction,
            Self::ArityMismatch { .. } => LowerErrorKind::ArityMismatch,
            Self::UnsupportedOperator { .. } => LowerErrorKind::UnsupportedOperator,
        }
    }

    /// The node the error points at
    pub fn node(&self) -> NodeRef {
        match self {
            Self::Redeclaration { node, .. }
            | Self::UndefinedIdentifier { node, .. }
            | Self::UndefinedFunction { node, .. }
            | Self::ArityMismatch { node, .. }
            | Self::UnsupportedOperator { node, .. } => *node,
        }
    }

    /// Source location of the node
    pub fn span(&self) -> Span {
        match self {
            Self::Redeclaration { span, .. }
            | Self::UndefinedIdentifier { span, .. }
            | Self::UndefinedFunction { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::UnsupportedOperator { span, .. } => *span,
        }
    }

    /// Stable diagnostic code
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            LowerErrorKind::Redeclaration => "lower::redeclaration",
            LowerErrorKind::UndefinedIdentifier => "lower::undefined_identifier",
            LowerErrorKind::UndefinedFunction => "lower::undefined_function",
            LowerErrorKind::ArityMismatch => "lower::arity_mismatch",
            LowerErrorKind::UnsupportedOperator => "lower::unsupported_operator",
        }
    }

    /// Convert to a codespan diagnostic for rustc-style output
    pub fn to_codespan_diagnostic<FileId: Copy>(&self, file_id: FileId) -> Diagnostic<FileId> {
        let mut labels = vec![Label::primary(file_id, self.span().range())];
        if let Self::Redeclaration { first, .. } = self {
            labels.push(
                Label::secondary(file_id, first.range()).with_message("first declared here"),
            );
        }
        Diagnostic::error()
            .with_code(self.error_code())
            .with_message(self.to_string())
            .with_labels(labels)
    }
}

/// Every error found while lowering, plus what was built anyway
#[derive(Debug, Clone)]
pub struct LowerFailure {
    /// Errors in discovery order
    pub errors: Vec<LowerError>,
    /// Module with the failing function bodies discarded; not fit for a backend
    pub partial: Module,
}

impl LowerFailure {
    /// Errors of one kind
    pub fn of_kind(&self, kind: LowerErrorKind) -> impl Iterator<Item = &LowerError> {
        self.errors.iter().filter(move |error| error.kind() == kind)
    }
}

impl fmt::Display for LowerFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "lowering failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(formatter, "\n  {}: {error}", error.error_code())?;
        }
        Ok(())
    }
}

impl std::error::Error for LowerFailure {}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::diagnostic::LabelStyle;
    use tc_ast::Ast;

    #[test]
    fn test_redeclaration_has_secondary_label() {
        let mut ast = Ast::new();
        let stmt = ast.var("x", None);
        let error = LowerError::Redeclaration {
            name: "x".to_string(),
            node: NodeRef::Stmt(stmt),
            span: Span::new(20, 25),
            first: Span::new(4, 9),
        };

        let diagnostic = error.to_codespan_diagnostic(0usize);
        assert_eq!(diagnostic.code.as_deref(), Some("lower::redeclaration"));
        assert_eq!(diagnostic.labels.len(), 2);
        assert_eq!(diagnostic.labels[0].style, LabelStyle::Primary);
        assert_eq!(diagnostic.labels[0].range, 20..25);
        assert_eq!(diagnostic.labels[1].range, 4..9);
    }

    #[test]
    fn test_failure_display_lists_errors() {
        let mut ast = Ast::new();
        let call = ast.call("missing", Vec::new());
        let failure = LowerFailure {
            errors: vec![LowerError::UndefinedFunction {
                name: "missing".to_string(),
                node: NodeRef::Expr(call),
                span: Span::DUMMY,
            }],
            partial: Module::new("test"),
        };

        assert_eq!(
            failure.to_string(),
            "lowering failed with 1 error(s)\n  lower::undefined_function: cannot find function `missing`"
        );
        assert_eq!(failure.of_kind(LowerErrorKind::UndefinedFunction).count(), 1);
    }
}
