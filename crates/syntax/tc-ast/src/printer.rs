//! Indented tree dump of an [`Ast`]

use crate::{Ast, Block, ExprId, ExprKind, Param, StmtId, StmtKind};
use std::fmt;

/// Displays the whole tree, one node per line, children indented
pub struct AstPrinter<'ast> {
    ast: &'ast Ast,
}

impl<'ast> AstPrinter<'ast> {
    /// Printer for the root block of `ast`
    pub fn new(ast: &'ast Ast) -> Self {
        Self { ast }
    }

    fn line(
        formatter: &mut fmt::Formatter<'_>,
        depth: usize,
        args: fmt::Arguments<'_>,
    ) -> fmt::Result {
        writeln!(formatter, "{:indent$}{args}", "", indent = depth * 2)
    }

    fn params(&self, params: &[Param]) -> String {
        params
            .iter()
            .map(|param| self.ast.name(param.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn block(&self, formatter: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
        for &stmt in &block.stmts {
            self.stmt(formatter, stmt, depth)?;
        }
        Ok(())
    }

    fn stmt(&self, formatter: &mut fmt::Formatter<'_>, id: StmtId, depth: usize) -> fmt::Result {
        let ast = self.ast;
        match &ast[id].kind {
            StmtKind::Expression(expr) => {
                Self::line(formatter, depth, format_args!("expr"))?;
                self.expr(formatter, *expr, depth + 1)
            }
            StmtKind::VariableDeclaration { name, init } => {
                Self::line(formatter, depth, format_args!("var {}", ast.name(*name)))?;
                match init {
                    Some(init) => self.expr(formatter, *init, depth + 1),
                    None => Ok(()),
                }
            }
            StmtKind::ExternDeclaration { name, params } => Self::line(
                formatter,
                depth,
                format_args!("extern {}({})", ast.name(*name), self.params(params)),
            ),
            StmtKind::FunctionDeclaration { name, params, body } => {
                Self::line(
                    formatter,
                    depth,
                    format_args!("function {}({})", ast.name(*name), self.params(params)),
                )?;
                self.block(formatter, body, depth + 1)
            }
        }
    }

    fn expr(&self, formatter: &mut fmt::Formatter<'_>, id: ExprId, depth: usize) -> fmt::Result {
        let ast = self.ast;
        match &ast[id].kind {
            ExprKind::Integer(value) => Self::line(formatter, depth, format_args!("int {value}")),
            ExprKind::Double(value) => {
                Self::line(formatter, depth, format_args!("double {value:?}"))
            }
            ExprKind::Identifier(name) => {
                Self::line(formatter, depth, format_args!("ident {}", ast.name(*name)))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                Self::line(formatter, depth, format_args!("binary {op}"))?;
                self.expr(formatter, *lhs, depth + 1)?;
                self.expr(formatter, *rhs, depth + 1)
            }
            ExprKind::Assignment { target, value } => {
                Self::line(formatter, depth, format_args!("assign {}", ast.name(*target)))?;
                self.expr(formatter, *value, depth + 1)
            }
            ExprKind::MethodCall { callee, args } => {
                Self::line(formatter, depth, format_args!("call {}", ast.name(*callee)))?;
                for &arg in args {
                    self.expr(formatter, arg, depth + 1)?;
                }
                Ok(())
            }
            ExprKind::Block(block) => {
                Self::line(formatter, depth, format_args!("block"))?;
                self.block(formatter, block, depth + 1)
            }
        }
    }
}

impl fmt::Display for AstPrinter<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::line(formatter, 0, format_args!("block"))?;
        self.block(formatter, self.ast.root(), 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Ast, BinaryOp, Block};
    use expect_test::expect;

    #[test]
    fn test_print_program() {
        let mut ast = Ast::new();
        let foo = ast.extern_fn("foo", &["a", "b"]);
        let x1 = ast.ident("x");
        let x2 = ast.ident("x");
        let call = ast.call("foo", vec![x1, x2]);
        let half = ast.double(0.5);
        let sum = ast.binary(BinaryOp::Add, call, half);
        let decl = ast.var("y", Some(sum));
        let y = ast.ident("y");
        let result = ast.expr_stmt(y);
        let bar = ast.function("bar", &["x"], vec![decl, result]);
        let one = ast.int(1);
        let reset = ast.assign("y", one);
        let reset_stmt = ast.expr_stmt(reset);
        let scoped = ast.block(vec![reset_stmt]);
        let top = ast.expr_stmt(scoped);
        ast.set_root(Block::new(vec![foo, bar, top]));

        expect![[r#"
            block
              extern foo(a, b)
              function bar(x)
                var y
                  binary +
                    call foo
                      ident x
                      ident x
                    double 0.5
                expr
                  ident y
              expr
                block
                  expr
                    assign y
                      int 1
        "#]]
        .assert_eq(&ast.display_root().to_string());
    }
}
