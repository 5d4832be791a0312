//! AST → IR lowering with name resolution
//!
//! Lowering runs in two passes over the tree. Pass 1 registers the signature
//! of every `extern` and function declaration (nested ones included) and
//! declares the matching IR function. Pass 2 lowers each function body against
//! the complete registry, so forward calls and mutual recursion resolve.
//! Top-level statements that are not declarations become the body of an
//! implicit entry function, lowered last.

use crate::config::LowerConfig;
use crate::error::{LowerError, LowerFailure, NodeRef};
use crate::scope::{Binding, ScopeError, ScopeStack};
use crate::signature::{Signature, SignatureKind, SignatureTable};
use rustc_hash::FxHashMap;
use tc_ast::{Ast, BinaryOp, ExprId, ExprKind, Param, StmtId, StmtKind};
use tc_intern::Symbol;
use tc_ir::{
    BinOp, BlockId, CmpPred, FuncId, FunctionBuilder, IrType, Linkage, Module, ModuleBuilder,
    Param as IrParam, Value,
};
use tc_span::Span;
use tracing::{debug, trace, warn};

/// Value of a function body or block expression that ends without producing
/// a value
pub const DEFAULT_RETURN_VALUE: i64 = 0;

const ENTRY_BLOCK: &str = "entry";

/// A function body waiting for pass 2
struct PendingBody<'ast> {
    func: FuncId,
    name: Symbol,
    /// Declaration the body came from (first statement for the entry function)
    decl: StmtId,
    params: &'ast [Param],
    stmts: Vec<StmtId>,
}

/// Lowers one program into one module
pub struct Lowerer<'a> {
    ast: &'a Ast,
    config: &'a LowerConfig,
    builder: ModuleBuilder,
    signatures: SignatureTable,
    errors: Vec<LowerError>,
}

impl<'a> Lowerer<'a> {
    /// Prepare to lower `ast`
    pub fn new(ast: &'a Ast, config: &'a LowerConfig) -> Self {
        Self {
            ast,
            config,
            builder: ModuleBuilder::new(config.module_name.clone()),
            signatures: SignatureTable::new(),
            errors: Vec::new(),
        }
    }

    /// Lower the whole program
    ///
    /// # Errors
    ///
    /// Returns every error found, together with the partial module, if any
    /// declaration failed to lower.
    pub fn run(mut self) -> Result<Module, LowerFailure> {
        debug!(module = %self.config.module_name, "lowering program");
        if self.config.core_functions {
            self.register_core_functions();
        }

        let ast = self.ast;
        let mut pending = Vec::new();
        let mut top_level = Vec::new();
        for &stmt in &ast.root().stmts {
            if !self.collect_declarations(stmt, &mut pending) {
                top_level.push(stmt);
            }
        }
        self.register_entry(top_level, &mut pending);
        debug!(
            signatures = self.signatures.len(),
            bodies = pending.len(),
            "signatures registered"
        );

        for body in pending {
            self.lower_body(body);
        }

        let module = self.builder.finish();
        debug!(
            functions = module.function_count(),
            errors = self.errors.len(),
            "lowering finished"
        );
        if self.errors.is_empty() {
            Ok(module)
        } else {
            Err(LowerFailure {
                errors: self.errors,
                partial: module,
            })
        }
    }

    fn register_core_functions(&mut self) {
        let echo = self.ast.intern("echo");
        let value = self.ast.intern("value");
        match self.declare(echo, &[value], SignatureKind::Extern, Span::DUMMY) {
            Ok(signature) => debug!(func = signature.func.0, "registered core function echo"),
            Err(existing) => warn!(func = existing.func.0, "echo is already registered"),
        }
    }

    /// Register `stmt` if it is a declaration, recursing into function bodies.
    /// Returns whether `stmt` was a declaration.
    fn collect_declarations(&mut self, stmt: StmtId, pending: &mut Vec<PendingBody<'a>>) -> bool {
        let ast = self.ast;
        let node = &ast[stmt];
        match &node.kind {
            StmtKind::ExternDeclaration { name, params } => {
                self.register(*name, params, SignatureKind::Extern, stmt, node.span);
                true
            }
            StmtKind::FunctionDeclaration { name, params, body } => {
                if let Some(func) =
                    self.register(*name, params, SignatureKind::Defined, stmt, node.span)
                {
                    pending.push(PendingBody {
                        func,
                        name: *name,
                        decl: stmt,
                        params,
                        stmts: body.stmts.clone(),
                    });
                }
                for &inner in &body.stmts {
                    self.collect_declarations(inner, pending);
                }
                true
            }
            StmtKind::Expression(expr) => {
                self.collect_in_expr(*expr, pending);
                false
            }
            StmtKind::VariableDeclaration { init, .. } => {
                if let Some(init) = init {
                    self.collect_in_expr(*init, pending);
                }
                false
            }
        }
    }

    /// Find declarations inside block expressions
    fn collect_in_expr(&mut self, expr: ExprId, pending: &mut Vec<PendingBody<'a>>) {
        let ast = self.ast;
        match &ast[expr].kind {
            ExprKind::Integer(_) | ExprKind::Double(_) | ExprKind::Identifier(_) => {}
            ExprKind::Binary { lhs, rhs, .. } => {
                self.collect_in_expr(*lhs, pending);
                self.collect_in_expr(*rhs, pending);
            }
            ExprKind::Assignment { value, .. } => self.collect_in_expr(*value, pending),
            ExprKind::MethodCall { args, .. } => {
                for &arg in args {
                    self.collect_in_expr(arg, pending);
                }
            }
            ExprKind::Block(block) => {
                for &stmt in &block.stmts {
                    self.collect_declarations(stmt, pending);
                }
            }
        }
    }

    fn register_entry(&mut self, stmts: Vec<StmtId>, pending: &mut Vec<PendingBody<'a>>) {
        let (Some(&first), Some(&last)) = (stmts.first(), stmts.last()) else {
            return;
        };
        let ast = self.ast;
        let name = ast.intern(&self.config.entry_function);
        let span = ast[first].span.to(ast[last].span);
        if let Some(func) = self.register(name, &[], SignatureKind::Entry, first, span) {
            pending.push(PendingBody {
                func,
                name,
                decl: first,
                params: &[],
                stmts,
            });
        }
    }

    /// Register a declaration from the tree, reporting a clash with an
    /// earlier one
    fn register(
        &mut self,
        name: Symbol,
        params: &[Param],
        kind: SignatureKind,
        decl: StmtId,
        span: Span,
    ) -> Option<FuncId> {
        let param_names: Vec<Symbol> = params.iter().map(|param| param.name).collect();
        match self.declare(name, &param_names, kind, span) {
            Ok(signature) => Some(signature.func),
            Err(first) => {
                self.errors.push(LowerError::Redeclaration {
                    name: self.ast.name(name).to_string(),
                    node: NodeRef::Stmt(decl),
                    span,
                    first: first.span,
                });
                None
            }
        }
    }

    /// Add `name` to the function namespace and declare its IR function
    fn declare(
        &mut self,
        name: Symbol,
        params: &[Symbol],
        kind: SignatureKind,
        span: Span,
    ) -> Result<Signature, Signature> {
        let ast = self.ast;
        let builder = &mut self.builder;
        self.signatures.register(name, || {
            let linkage = match kind {
                SignatureKind::Extern => Linkage::External,
                SignatureKind::Defined | SignatureKind::Entry => Linkage::Internal,
            };
            let ir_params = params
                .iter()
                .map(|param| IrParam {
                    name: ast.name(*param).to_string(),
                    ty: IrType::I64,
                })
                .collect();
            let func = builder.declare_function(ast.name(name), ir_params, IrType::I64, linkage);
            trace!(function = ast.name(name), ?kind, arity = params.len(), "declare function");
            Signature {
                func,
                arity: params.len(),
                kind,
                span,
            }
        })
    }

    /// Pass 2 for one function; a failing body is discarded and its error kept
    fn lower_body(&mut self, pending: PendingBody<'a>) {
        let ast = self.ast;
        let name = ast.name(pending.name);
        debug!(function = name, params = pending.params.len(), "lowering function body");

        let body = self.builder.define(pending.func, ENTRY_BLOCK);
        let result = FunctionLowerer::new(ast, &self.signatures, body).lower(
            pending.params,
            &pending.stmts,
            pending.decl,
        );
        if let Err(error) = result {
            warn!(function = name, %error, "discarding function body");
            self.builder.discard_body(pending.func);
            self.errors.push(error);
        }
    }
}

/// Where a function lowering is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Binding parameters in the fresh frame
    CollectingParams,
    /// Lowering statements
    LoweringBody,
}

/// IR operation a source operator maps to
enum IrOperator {
    Arithmetic(BinOp),
    Comparison(CmpPred),
}

fn ir_operator(op: &BinaryOp) -> Option<IrOperator> {
    Some(match op {
        BinaryOp::Add => IrOperator::Arithmetic(BinOp::Add),
        BinaryOp::Sub => IrOperator::Arithmetic(BinOp::Sub),
        BinaryOp::Mul => IrOperator::Arithmetic(BinOp::Mul),
        BinaryOp::Div => IrOperator::Arithmetic(BinOp::Div),
        BinaryOp::Lt => IrOperator::Comparison(CmpPred::Lt),
        BinaryOp::Gt => IrOperator::Comparison(CmpPred::Gt),
        BinaryOp::Eq => IrOperator::Comparison(CmpPred::Eq),
        BinaryOp::Other(_) => return None,
    })
}

/// Lowers the body of one function; owns that function's scope stack
struct FunctionLowerer<'l, 'a> {
    ast: &'a Ast,
    signatures: &'l SignatureTable,
    body: FunctionBuilder<'l>,
    scopes: ScopeStack,
    mode: Mode,
}

impl<'l, 'a> FunctionLowerer<'l, 'a> {
    fn new(ast: &'a Ast, signatures: &'l SignatureTable, body: FunctionBuilder<'l>) -> Self {
        Self {
            ast,
            signatures,
            body,
            scopes: ScopeStack::new(),
            mode: Mode::CollectingParams,
        }
    }

    fn lower(mut self, params: &[Param], stmts: &[StmtId], decl: StmtId) -> Result<(), LowerError> {
        let entry = self.body.current_block();
        let value = self.with_frame(entry, |this| {
            this.declare_params(params, decl)?;
            this.enter_body();
            this.lower_stmts(stmts)
        });
        debug_assert!(self.scopes.is_empty(), "unbalanced scope frames");
        let value = value?;

        let ret = match value {
            Some(value) => self.body.coerce(value, IrType::I64),
            None => self.body.iconst(DEFAULT_RETURN_VALUE),
        };
        self.body.ret(ret);
        Ok(())
    }

    /// Run `lower` inside a fresh frame appending to `block`
    ///
    /// The frame is popped whatever `lower` returns. Afterwards the builder
    /// appends to the enclosing frame's block, or to `block` when no frame
    /// encloses it.
    fn with_frame<R>(
        &mut self,
        block: BlockId,
        lower: impl FnOnce(&mut Self) -> Result<R, LowerError>,
    ) -> Result<R, LowerError> {
        self.scopes.push_frame(block);
        self.body.switch_to_block(block);
        let result = lower(self);
        let frame = self.scopes.pop_frame();
        let resume = self.scopes.current_block().unwrap_or(frame.block());
        self.body.switch_to_block(resume);
        result
    }

    fn enter_body(&mut self) {
        debug_assert_eq!(self.mode, Mode::CollectingParams);
        self.mode = Mode::LoweringBody;
    }

    fn declare_params(&mut self, params: &[Param], decl: StmtId) -> Result<(), LowerError> {
        debug_assert_eq!(self.mode, Mode::CollectingParams);
        for (index, param) in params.iter().enumerate() {
            let slot = self.body.create_slot(self.ast.name(param.name), IrType::I64);
            let binding = Binding {
                slot,
                span: param.span,
            };
            self.declare(param.name, binding, NodeRef::Stmt(decl))?;
            let incoming = self.body.param(index);
            self.body.store(slot, incoming);
        }
        Ok(())
    }

    fn declare(&mut self, name: Symbol, binding: Binding, node: NodeRef) -> Result<(), LowerError> {
        self.scopes
            .declare(name, binding)
            .map_err(|error| self.scope_error(error, name, node, binding.span))
    }

    fn resolve(&self, name: Symbol, id: ExprId) -> Result<Binding, LowerError> {
        self.scopes
            .resolve(name)
            .map_err(|error| self.scope_error(error, name, NodeRef::Expr(id), self.ast[id].span))
    }

    fn scope_error(&self, error: ScopeError, name: Symbol, node: NodeRef, span: Span) -> LowerError {
        let name = self.ast.name(name).to_string();
        match error {
            ScopeError::Redeclared { first } => LowerError::Redeclaration {
                name,
                node,
                span,
                first: first.span,
            },
            ScopeError::Undefined => LowerError::UndefinedIdentifier { name, node, span },
        }
    }

    /// Lower statements in order; the value is that of the last statement
    fn lower_stmts(&mut self, stmts: &[StmtId]) -> Result<Option<Value>, LowerError> {
        let mut last = None;
        for &stmt in stmts {
            last = self.lower_stmt(stmt)?;
        }
        Ok(last)
    }

    fn lower_stmt(&mut self, id: StmtId) -> Result<Option<Value>, LowerError> {
        debug_assert_eq!(self.mode, Mode::LoweringBody);
        let ast = self.ast;
        let stmt = &ast[id];
        match &stmt.kind {
            StmtKind::Expression(expr) => self.lower_expr(*expr).map(Some),
            StmtKind::VariableDeclaration { name, init } => {
                let ty = init.map_or(IrType::I64, |init| self.static_type(init));
                let slot = self.body.create_slot(ast.name(*name), ty);
                let binding = Binding {
                    slot,
                    span: stmt.span,
                };
                self.declare(*name, binding, NodeRef::Stmt(id))?;
                let value = match init {
                    Some(init) => {
                        let value = self.lower_expr(*init)?;
                        self.body.coerce(value, ty)
                    }
                    None => self.zero(ty),
                };
                self.body.store(slot, value);
                Ok(None)
            }
            // Hoisted in pass 1 and lowered as functions of their own.
            StmtKind::ExternDeclaration { .. } | StmtKind::FunctionDeclaration { .. } => Ok(None),
        }
    }

    fn lower_expr(&mut self, id: ExprId) -> Result<Value, LowerError> {
        let ast = self.ast;
        match &ast[id].kind {
            ExprKind::Integer(value) => Ok(self.body.iconst(*value)),
            ExprKind::Double(value) => Ok(self.body.fconst(*value)),
            ExprKind::Identifier(name) => {
                let binding = self.resolve(*name, id)?;
                Ok(self.body.load(binding.slot))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(*lhs)?;
                let rhs = self.lower_expr(*rhs)?;
                self.lower_binary(op, lhs, rhs, id)
            }
            ExprKind::Assignment { target, value } => {
                let value = self.lower_expr(*value)?;
                let binding = self.resolve(*target, id)?;
                let slot_ty = self.body.slot_type(binding.slot);
                let value = self.body.coerce(value, slot_ty);
                self.body.store(binding.slot, value);
                Ok(value)
            }
            ExprKind::MethodCall { callee, args } => self.lower_call(*callee, args, id),
            // No frame of its own; declarations land in the enclosing one.
            ExprKind::Block(block) => match self.lower_stmts(&block.stmts)? {
                Some(value) => Ok(value),
                None => Ok(self.body.iconst(DEFAULT_RETURN_VALUE)),
            },
        }
    }

    fn lower_binary(
        &mut self,
        op: &BinaryOp,
        lhs: Value,
        rhs: Value,
        id: ExprId,
    ) -> Result<Value, LowerError> {
        let Some(operator) = ir_operator(op) else {
            return Err(LowerError::UnsupportedOperator {
                op: op.symbol().to_string(),
                node: NodeRef::Expr(id),
                span: self.ast[id].span,
            });
        };
        let ty = if self.body.value_type(lhs) == IrType::F64
            || self.body.value_type(rhs) == IrType::F64
        {
            IrType::F64
        } else {
            IrType::I64
        };
        let lhs = self.body.coerce(lhs, ty);
        let rhs = self.body.coerce(rhs, ty);
        Ok(match operator {
            IrOperator::Arithmetic(op) => self.body.binary(op, lhs, rhs),
            IrOperator::Comparison(pred) => self.body.compare(pred, lhs, rhs),
        })
    }

    fn lower_call(&mut self, callee: Symbol, args: &[ExprId], id: ExprId) -> Result<Value, LowerError> {
        let ast = self.ast;
        let span = ast[id].span;
        let Some(signature) = self.signatures.get(callee).copied() else {
            return Err(LowerError::UndefinedFunction {
                name: ast.name(callee).to_string(),
                node: NodeRef::Expr(id),
                span,
            });
        };
        if args.len() != signature.arity {
            return Err(LowerError::ArityMismatch {
                name: ast.name(callee).to_string(),
                expected: signature.arity,
                found: args.len(),
                node: NodeRef::Expr(id),
                span,
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for &arg in args {
            let value = self.lower_expr(arg)?;
            values.push(self.body.coerce(value, IrType::I64));
        }
        trace!(callee = ast.name(callee), args = values.len(), "emit call");
        Ok(self.body.call(signature.func, values))
    }

    fn zero(&mut self, ty: IrType) -> Value {
        match ty {
            IrType::I64 => self.body.iconst(0),
            IrType::F64 => self.body.fconst(0.0),
        }
    }

    /// Type `id` will lower to, computed without emitting anything
    fn static_type(&self, id: ExprId) -> IrType {
        self.infer(id, &mut FxHashMap::default())
    }

    /// `declared` collects the variables that block expressions inside `id`
    /// declare, in lowering order, since they are not in any frame yet.
    fn infer(&self, id: ExprId, declared: &mut FxHashMap<Symbol, IrType>) -> IrType {
        match &self.ast[id].kind {
            ExprKind::Integer(_) => IrType::I64,
            ExprKind::Double(_) => IrType::F64,
            ExprKind::Identifier(name) => {
                self.variable_type(*name, declared).unwrap_or(IrType::I64)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.infer(*lhs, declared);
                let rhs = self.infer(*rhs, declared);
                match ir_operator(op) {
                    Some(IrOperator::Arithmetic(_))
                        if lhs == IrType::F64 || rhs == IrType::F64 =>
                    {
                        IrType::F64
                    }
                    _ => IrType::I64,
                }
            }
            ExprKind::Assignment { target, value } => {
                let value = self.infer(*value, declared);
                self.variable_type(*target, declared).unwrap_or(value)
            }
            ExprKind::MethodCall { args, .. } => {
                for &arg in args {
                    self.infer(arg, declared);
                }
                IrType::I64
            }
            ExprKind::Block(block) => {
                let mut last = None;
                for &stmt in &block.stmts {
                    last = match &self.ast[stmt].kind {
                        StmtKind::Expression(expr) => Some(self.infer(*expr, declared)),
                        StmtKind::VariableDeclaration { name, init } => {
                            let ty = init.map_or(IrType::I64, |init| self.infer(init, declared));
                            declared.insert(*name, ty);
                            None
                        }
                        StmtKind::ExternDeclaration { .. }
                        | StmtKind::FunctionDeclaration { .. } => None,
                    };
                }
                last.unwrap_or(IrType::I64)
            }
        }
    }

    fn variable_type(&self, name: Symbol, declared: &FxHashMap<Symbol, IrType>) -> Option<IrType> {
        declared.get(&name).copied().or_else(|| {
            self.scopes
                .resolve(name)
                .ok()
                .map(|binding| self.body.slot_type(binding.slot))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_popped_when_lowering_fails() {
        let mut ast = Ast::new();
        let missing = ast.ident("missing");
        let mut builder = ModuleBuilder::new("test");
        let func = builder.declare_function("f", Vec::new(), IrType::I64, Linkage::Internal);
        let signatures = SignatureTable::new();
        let mut lowerer = FunctionLowerer::new(&ast, &signatures, builder.define(func, ENTRY_BLOCK));
        lowerer.enter_body();

        let entry = lowerer.body.current_block();
        let result = lowerer.with_frame(entry, |this| this.lower_expr(missing));
        assert!(matches!(result, Err(LowerError::UndefinedIdentifier { .. })));
        assert!(lowerer.scopes.is_empty());
    }

    #[test]
    fn test_inner_frame_resumes_enclosing_block() {
        let ast = Ast::new();
        let mut builder = ModuleBuilder::new("test");
        let func = builder.declare_function("f", Vec::new(), IrType::I64, Linkage::Internal);
        let signatures = SignatureTable::new();
        let mut lowerer = FunctionLowerer::new(&ast, &signatures, builder.define(func, ENTRY_BLOCK));

        let entry = lowerer.body.current_block();
        let inner = lowerer
            .with_frame(entry, |this| {
                let inner = this.body.append_block("inner");
                this.with_frame(inner, |nested| Ok(nested.body.current_block()))?;
                assert_eq!(this.body.current_block(), entry);
                Ok(inner)
            })
            .unwrap();
        assert_ne!(inner, entry);
        assert_eq!(lowerer.body.current_block(), entry);
    }

    #[test]
    fn test_static_type_follows_promotion() {
        let mut ast = Ast::new();
        let one = ast.int(1);
        let half = ast.double(0.5);
        let sum = ast.binary(BinaryOp::Add, one, half);
        let two = ast.int(2);
        let less = ast.binary(BinaryOp::Lt, sum, two);
        let mut builder = ModuleBuilder::new("test");
        let func = builder.declare_function("f", Vec::new(), IrType::I64, Linkage::Internal);
        let signatures = SignatureTable::new();
        let lowerer = FunctionLowerer::new(&ast, &signatures, builder.define(func, ENTRY_BLOCK));

        assert_eq!(lowerer.static_type(sum), IrType::F64);
        assert_eq!(lowerer.static_type(less), IrType::I64);
        assert_eq!(lowerer.static_type(two), IrType::I64);
    }

    #[test]
    fn test_static_type_sees_block_declarations() {
        let mut ast = Ast::new();
        let half = ast.double(1.5);
        let decl = ast.var("z", Some(half));
        let z = ast.ident("z");
        let tail = ast.expr_stmt(z);
        let block = ast.block(vec![decl, tail]);
        let mut builder = ModuleBuilder::new("test");
        let func = builder.declare_function("f", Vec::new(), IrType::I64, Linkage::Internal);
        let signatures = SignatureTable::new();
        let lowerer = FunctionLowerer::new(&ast, &signatures, builder.define(func, ENTRY_BLOCK));

        assert_eq!(lowerer.static_type(block), IrType::F64);
    }
}
