//! Abstract syntax tree for the toy language
//!
//! The external parser produces one [`Ast`]: two arenas of nodes plus the
//! top-level [`Block`]. Every node is referenced by exactly one parent, so the
//! arenas hold a tree. Nothing mutates the tree once the parser hands it over;
//! the lowering pass only borrows it.

pub mod printer;

use la_arena::{Arena, Idx};
use std::fmt;
use std::ops::Index;
use tc_intern::{Interner, Symbol};
use tc_span::Span;

pub use printer::AstPrinter;

/// Expression node ID
pub type ExprId = Idx<Expr>;
/// Statement node ID
pub type StmtId = Idx<Stmt>;

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// What kind of expression this is
    pub kind: ExprKind,
    /// Source location
    pub span: Span,
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal
    Integer(i64),
    /// Double literal
    Double(f64),
    /// Variable reference
    Identifier(Symbol),
    /// Binary operation; `lhs` is evaluated before `rhs`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: ExprId,
        /// Right operand
        rhs: ExprId,
    },
    /// `target = value`
    Assignment {
        /// Variable being written
        target: Symbol,
        /// Value being stored
        value: ExprId,
    },
    /// Call of a named function
    MethodCall {
        /// Function being called
        callee: Symbol,
        /// Arguments, evaluated left to right
        args: Vec<ExprId>,
    },
    /// Statements in sequence; the value is that of the last one
    Block(Block),
}

/// Binary operators the grammar produces
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `==`
    Eq,
    /// Any other operator token; has no lowering rule
    Other(String),
}

impl BinaryOp {
    /// Map an operator token to its operator
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "==" => Self::Eq,
            other => Self::Other(other.to_string()),
        }
    }

    /// Operator token
    pub fn symbol(&self) -> &str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "==",
            Self::Other(symbol) => symbol,
        }
    }

    /// Whether the operator compares its operands
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Eq)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.symbol())
    }
}

/// A statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// What kind of statement this is
    pub kind: StmtKind,
    /// Source location
    pub span: Span,
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression evaluated for its value or side effects
    Expression(ExprId),
    /// `var name` or `var name = init`
    VariableDeclaration {
        /// Variable name
        name: Symbol,
        /// Optional initializer
        init: Option<ExprId>,
    },
    /// Signature of a function defined elsewhere
    ExternDeclaration {
        /// Function name
        name: Symbol,
        /// Parameters
        params: Vec<Param>,
    },
    /// Function with a body
    FunctionDeclaration {
        /// Function name
        name: Symbol,
        /// Parameters
        params: Vec<Param>,
        /// Body
        body: Block,
    },
}

/// A function or extern parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// Parameter name
    pub name: Symbol,
    /// Source location
    pub span: Span,
}

/// An ordered sequence of statements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// Statements in source order
    pub stmts: Vec<StmtId>,
}

impl Block {
    /// Create a block from statements
    pub fn new(stmts: Vec<StmtId>) -> Self {
        Self { stmts }
    }
}

/// A parsed program
#[derive(Debug, Clone, Default)]
pub struct Ast {
    exprs: Arena<Expr>,
    stmts: Arena<Stmt>,
    root: Block,
    interner: Interner,
}

impl Ast {
    /// Create an empty program with its own interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name
    pub fn intern(&self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Text of an interned name
    pub fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// Allocate an expression node
    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.exprs.alloc(Expr { kind, span })
    }

    /// Allocate a statement node
    pub fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        self.stmts.alloc(Stmt { kind, span })
    }

    /// Top-level block
    pub fn root(&self) -> &Block {
        &self.root
    }

    /// Install the top-level block
    pub fn set_root(&mut self, root: Block) {
        self.root = root;
    }

    /// Number of expression nodes
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Number of statement nodes
    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    /// Render the tree as an indented listing
    pub fn display_root(&self) -> AstPrinter<'_> {
        AstPrinter::new(self)
    }

    /// Integer literal
    pub fn int(&mut self, value: i64) -> ExprId {
        self.alloc_expr(ExprKind::Integer(value), Span::DUMMY)
    }

    /// Double literal
    pub fn double(&mut self, value: f64) -> ExprId {
        self.alloc_expr(ExprKind::Double(value), Span::DUMMY)
    }

    /// Variable reference
    pub fn ident(&mut self, name: &str) -> ExprId {
        let name = self.intern(name);
        self.alloc_expr(ExprKind::Identifier(name), Span::DUMMY)
    }

    /// Binary operation
    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let span = self[lhs].span.to(self[rhs].span);
        self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, span)
    }

    /// Assignment to an existing variable
    pub fn assign(&mut self, target: &str, value: ExprId) -> ExprId {
        let target = self.intern(target);
        self.alloc_expr(ExprKind::Assignment { target, value }, Span::DUMMY)
    }

    /// Call of a named function
    pub fn call(&mut self, callee: &str, args: Vec<ExprId>) -> ExprId {
        let callee = self.intern(callee);
        self.alloc_expr(ExprKind::MethodCall { callee, args }, Span::DUMMY)
    }

    /// Block expression
    pub fn block(&mut self, stmts: Vec<StmtId>) -> ExprId {
        self.alloc_expr(ExprKind::Block(Block::new(stmts)), Span::DUMMY)
    }

    /// Expression statement
    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        let span = self[expr].span;
        self.alloc_stmt(StmtKind::Expression(expr), span)
    }

    /// Variable declaration
    pub fn var(&mut self, name: &str, init: Option<ExprId>) -> StmtId {
        let name = self.intern(name);
        self.alloc_stmt(StmtKind::VariableDeclaration { name, init }, Span::DUMMY)
    }

    /// Extern declaration
    pub fn extern_fn(&mut self, name: &str, params: &[&str]) -> StmtId {
        let name = self.intern(name);
        let params = self.params(params);
        self.alloc_stmt(StmtKind::ExternDeclaration { name, params }, Span::DUMMY)
    }

    /// Function declaration
    pub fn function(&mut self, name: &str, params: &[&str], body: Vec<StmtId>) -> StmtId {
        let name = self.intern(name);
        let params = self.params(params);
        let body = Block::new(body);
        self.alloc_stmt(
            StmtKind::FunctionDeclaration { name, params, body },
            Span::DUMMY,
        )
    }

    fn params(&self, names: &[&str]) -> Vec<Param> {
        names
            .iter()
            .map(|name| Param {
                name: self.intern(name),
                span: Span::DUMMY,
            })
            .collect()
    }
}

impl Index<ExprId> for Ast {
    type Output = Expr;

    fn index(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }
}

impl Index<StmtId> for Ast {
    type Output = Stmt;

    fn index(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        for symbol in ["+", "-", "*", "/", "<", ">", "=="] {
            let op = BinaryOp::from_symbol(symbol);
            assert!(!matches!(op, BinaryOp::Other(_)), "{symbol} should be known");
            assert_eq!(op.symbol(), symbol);
        }
        assert_eq!(BinaryOp::from_symbol("%"), BinaryOp::Other("%".to_string()));
        assert!(BinaryOp::Lt.is_comparison());
        assert!(!BinaryOp::Mul.is_comparison());
    }

    #[test]
    fn test_binary_span_covers_operands() {
        let mut ast = Ast::new();
        let lhs = ast.alloc_expr(ExprKind::Integer(1), Span::new(0, 1));
        let rhs = ast.alloc_expr(ExprKind::Integer(2), Span::new(4, 5));
        let sum = ast.binary(BinaryOp::Add, lhs, rhs);
        assert_eq!(ast[sum].span, Span::new(0, 5));
    }

    #[test]
    fn test_names_share_interner() {
        let mut ast = Ast::new();
        let id = ast.ident("x");
        let decl = ast.var("x", None);
        let ExprKind::Identifier(used) = ast[id].kind else {
            panic!("expected identifier");
        };
        let StmtKind::VariableDeclaration { name, .. } = ast[decl].kind else {
            panic!("expected declaration");
        };
        assert_eq!(used, name);
        assert_eq!(ast.name(name), "x");
        assert_eq!(ast.expr_count(), 1);
        assert_eq!(ast.stmt_count(), 1);
    }
}
