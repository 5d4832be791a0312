//! Builders for constructing IR modules

use crate::{
    BasicBlock, BinOp, BlockId, CmpPred, Constant, ConvertOp, FuncId, Function, InstKind,
    Instruction, IrType, Linkage, Module, Param, Slot, SlotId, Terminator, Value,
};

/// Builder for a whole module
///
/// Functions are declared first (signature only) and defined later, so a
/// body can call any function declared before it is built.
#[derive(Debug)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Start an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module::new(name),
        }
    }

    /// Declare a function signature and return its ID
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<Param>,
        ret: IrType,
        linkage: Linkage,
    ) -> FuncId {
        let id = FuncId(self.module.functions.len() as u32);
        let value_types = params.iter().map(|param| param.ty).collect();
        self.module.functions.push(Function {
            id,
            name: name.into(),
            params,
            ret,
            linkage,
            slots: Vec::new(),
            value_types,
            blocks: Vec::new(),
        });
        id
    }

    /// Start defining the body of `id`, positioned at a fresh entry block
    pub fn define(&mut self, id: FuncId, entry_label: &str) -> FunctionBuilder<'_> {
        let mut builder = FunctionBuilder {
            module: &mut self.module,
            func: id,
            current: BlockId(0),
        };
        let entry = builder.append_block(entry_label);
        builder.switch_to_block(entry);
        builder
    }

    /// Throw away a partially built body, keeping the declaration
    pub fn discard_body(&mut self, id: FuncId) {
        let function = &mut self.module.functions[id.0 as usize];
        function.blocks.clear();
        function.slots.clear();
        function.value_types.truncate(function.params.len());
    }

    /// Finish building and return the module
    pub fn finish(self) -> Module {
        self.module
    }
}

/// Builder for the body of one function
///
/// Instructions are appended to the current block in call order.
#[derive(Debug)]
pub struct FunctionBuilder<'module> {
    module: &'module mut Module,
    func: FuncId,
    current: BlockId,
}

impl FunctionBuilder<'_> {
    fn function(&self) -> &Function {
        self.module.function(self.func)
    }

    fn function_mut(&mut self) -> &mut Function {
        &mut self.module.functions[self.func.0 as usize]
    }

    /// Incoming argument value for parameter `index`
    pub fn param(&self, index: usize) -> Value {
        self.function().param_value(index)
    }

    /// Append an empty block
    pub fn append_block(&mut self, label: &str) -> BlockId {
        let function = self.function_mut();
        let id = BlockId(function.blocks.len() as u32);
        function.blocks.push(BasicBlock {
            id,
            label: label.to_string(),
            instructions: Vec::new(),
            terminator: None,
        });
        id
    }

    /// Make `block` the block new instructions go to
    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Block new instructions go to
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// Allocate a stack slot
    pub fn create_slot(&mut self, name: &str, ty: IrType) -> SlotId {
        let function = self.function_mut();
        let id = SlotId(function.slots.len() as u32);
        function.slots.push(Slot {
            id,
            name: name.to_string(),
            ty,
        });
        id
    }

    /// Type stored in a slot
    pub fn slot_type(&self, slot: SlotId) -> IrType {
        self.function().slot(slot).ty
    }

    /// Type of a value
    pub fn value_type(&self, value: Value) -> IrType {
        self.function().value_type(value)
    }

    fn new_value(&mut self, ty: IrType) -> Value {
        let function = self.function_mut();
        let value = Value(function.value_types.len() as u32);
        function.value_types.push(ty);
        value
    }

    fn push(&mut self, result: Option<Value>, kind: InstKind) {
        let current = self.current.0 as usize;
        let block = &mut self.function_mut().blocks[current];
        debug_assert!(block.terminator.is_none(), "appending to a sealed block");
        block.instructions.push(Instruction { result, kind });
    }

    fn emit(&mut self, ty: IrType, kind: InstKind) -> Value {
        let value = self.new_value(ty);
        self.push(Some(value), kind);
        value
    }

    /// Materialize a constant
    pub fn constant(&mut self, constant: Constant) -> Value {
        self.emit(constant.ty(), InstKind::Const(constant))
    }

    /// `i64` constant
    pub fn iconst(&mut self, value: i64) -> Value {
        self.constant(Constant::Int(value))
    }

    /// `f64` constant
    pub fn fconst(&mut self, value: f64) -> Value {
        self.constant(Constant::Float(value))
    }

    /// Read a slot
    pub fn load(&mut self, slot: SlotId) -> Value {
        let ty = self.slot_type(slot);
        self.emit(ty, InstKind::Load { slot })
    }

    /// Write a slot; the value must already have the slot's type
    pub fn store(&mut self, slot: SlotId, value: Value) {
        debug_assert_eq!(self.slot_type(slot), self.value_type(value));
        self.push(None, InstKind::Store { slot, value });
    }

    /// Arithmetic on two values of the same type
    pub fn binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> Value {
        let ty = self.value_type(lhs);
        debug_assert_eq!(ty, self.value_type(rhs), "mixed operand types for {op:?}");
        self.emit(ty, InstKind::Binary { op, lhs, rhs })
    }

    /// Comparison yielding `i64` 0 or 1
    pub fn compare(&mut self, pred: CmpPred, lhs: Value, rhs: Value) -> Value {
        self.emit(IrType::I64, InstKind::Compare { pred, lhs, rhs })
    }

    /// Numeric conversion
    pub fn convert(&mut self, op: ConvertOp, value: Value) -> Value {
        self.emit(op.target(), InstKind::Convert { op, value })
    }

    /// Convert `value` to `ty` if it is not already of that type
    pub fn coerce(&mut self, value: Value, ty: IrType) -> Value {
        match ConvertOp::between(self.value_type(value), ty) {
            Some(op) => self.convert(op, value),
            None => value,
        }
    }

    /// Direct call; the result has the callee's return type
    pub fn call(&mut self, callee: FuncId, args: Vec<Value>) -> Value {
        let ret = self.module.function(callee).ret;
        self.emit(ret, InstKind::Call { callee, args })
    }

    /// Seal the current block with a return
    pub fn ret(&mut self, value: Value) {
        let current = self.current.0 as usize;
        self.function_mut().blocks[current].terminator = Some(Terminator::Return(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_param(name: &str) -> Param {
        Param {
            name: name.to_string(),
            ty: IrType::I64,
        }
    }

    #[test]
    fn test_params_are_first_values() {
        let mut builder = ModuleBuilder::new("test");
        let id = builder.declare_function(
            "add",
            vec![int_param("a"), int_param("b")],
            IrType::I64,
            Linkage::Internal,
        );
        let mut body = builder.define(id, "entry");
        assert_eq!(body.param(0), Value(0));
        assert_eq!(body.param(1), Value(1));
        let sum = body.binary(BinOp::Add, Value(0), Value(1));
        assert_eq!(sum, Value(2));
        body.ret(sum);

        let module = builder.finish();
        let add = module.function(id);
        assert!(!add.is_declaration());
        assert_eq!(add.entry().map(|block| block.instructions.len()), Some(1));
        assert_eq!(
            add.entry().and_then(|block| block.terminator),
            Some(Terminator::Return(sum))
        );
    }

    #[test]
    fn test_coerce_inserts_conversion_only_when_needed() {
        let mut builder = ModuleBuilder::new("test");
        let id = builder.declare_function("f", Vec::new(), IrType::I64, Linkage::Internal);
        let mut body = builder.define(id, "entry");
        let int = body.iconst(3);
        assert_eq!(body.coerce(int, IrType::I64), int);
        let float = body.coerce(int, IrType::F64);
        assert_ne!(float, int);
        assert_eq!(body.value_type(float), IrType::F64);
    }

    #[test]
    fn test_discard_body_keeps_declaration() {
        let mut builder = ModuleBuilder::new("test");
        let id = builder.declare_function("f", vec![int_param("x")], IrType::I64, Linkage::Internal);
        {
            let mut body = builder.define(id, "entry");
            let slot = body.create_slot("x", IrType::I64);
            let arg = body.param(0);
            body.store(slot, arg);
        }
        builder.discard_body(id);
        let module = builder.finish();
        let function = module.function(id);
        assert!(function.is_declaration());
        assert!(function.slots.is_empty());
        assert_eq!(function.value_types, vec![IrType::I64]);
    }
}
