//! Low-level intermediate representation
//!
//! The IR is what the lowering pass hands to a native backend. A [`Module`]
//! holds functions; a defined function holds stack slots and basic blocks of
//! straight-line instructions over SSA [`Value`]s. Everything is built through
//! [`ModuleBuilder`] and [`FunctionBuilder`].

pub mod builder;
pub mod printer;

pub use builder::{FunctionBuilder, ModuleBuilder};
use serde::{Deserialize, Serialize};

/// Function ID (index into [`Module::functions`])
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct FuncId(pub u32);

/// Basic block ID (index into [`Function::blocks`])
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Stack slot ID (index into [`Function::slots`])
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SlotId(pub u32);

/// SSA value handle; the first `params.len()` values are the incoming arguments
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Value(pub u32);

/// Machine-level value types
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum IrType {
    /// 64-bit signed integer
    I64,
    /// 64-bit float
    F64,
}

/// How a function is provided
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Linkage {
    /// Body supplied by the linker or runtime
    External,
    /// Body defined in this module
    Internal,
}

/// A compiled module
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module name
    pub name: String,
    /// Functions in declaration order
    pub functions: Vec<Function>,
}

impl Module {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    /// Function by ID
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }

    /// Function by name
    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Number of functions, declared or defined
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

/// A function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Name (for printing)
    pub name: String,
    /// Type
    pub ty: IrType,
}

/// A stack slot backing a named variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Slot ID
    pub id: SlotId,
    /// Variable name (for printing)
    pub name: String,
    /// Type stored in the slot
    pub ty: IrType,
}

/// A function, either external or defined here
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function ID
    pub id: FuncId,
    /// Symbol name
    pub name: String,
    /// Parameters
    pub params: Vec<Param>,
    /// Return type
    pub ret: IrType,
    /// Linkage
    pub linkage: Linkage,
    /// Stack slots
    pub slots: Vec<Slot>,
    /// Type of every value, indexed by [`Value`]
    pub value_types: Vec<IrType>,
    /// Basic blocks; the first one is the entry block
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    /// Whether the function has no body in this module
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Incoming argument value for parameter `index`
    pub fn param_value(&self, index: usize) -> Value {
        debug_assert!(index < self.params.len());
        Value(index as u32)
    }

    /// Type of a value
    pub fn value_type(&self, value: Value) -> IrType {
        self.value_types[value.0 as usize]
    }

    /// Slot by ID
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.0 as usize]
    }

    /// Slot by variable name; the first slot wins when names repeat
    pub fn slot_by_name(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Entry block, if the function has a body
    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    /// Every instruction in block order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }

    /// The instruction that produced `value`, if it is not a parameter
    pub fn definition(&self, value: Value) -> Option<&Instruction> {
        self.instructions().find(|inst| inst.result == Some(value))
    }
}

/// A basic block: straight-line instructions ending in a terminator
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Block ID
    pub id: BlockId,
    /// Label (for printing)
    pub label: String,
    /// Instructions in order
    pub instructions: Vec<Instruction>,
    /// How control leaves the block; `None` until the block is sealed
    pub terminator: Option<Terminator>,
}

/// An instruction and the value it defines
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Value produced, if any
    pub result: Option<Value>,
    /// Operation
    pub kind: InstKind,
}

/// Instruction operations
#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    /// Materialize a constant
    Const(Constant),
    /// Read a stack slot
    Load {
        /// Slot read
        slot: SlotId,
    },
    /// Write a stack slot
    Store {
        /// Slot written
        slot: SlotId,
        /// Value stored
        value: Value,
    },
    /// Arithmetic on two values of the same type
    Binary {
        /// Operator
        op: BinOp,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Comparison producing 0 or 1 as `i64`
    Compare {
        /// Predicate
        pred: CmpPred,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Numeric conversion
    Convert {
        /// Conversion
        op: ConvertOp,
        /// Value converted
        value: Value,
    },
    /// Direct call
    Call {
        /// Function called
        callee: FuncId,
        /// Arguments
        args: Vec<Value>,
    },
}

/// Constant values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    /// `i64` constant
    Int(i64),
    /// `f64` constant
    Float(f64),
}

impl Constant {
    /// Type of the constant
    pub fn ty(self) -> IrType {
        match self {
            Self::Int(_) => IrType::I64,
            Self::Float(_) => IrType::F64,
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
}

/// Comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpPred {
    /// Less than
    Lt,
    /// Greater than
    Gt,
    /// Equal
    Eq,
}

/// Numeric conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvertOp {
    /// Signed integer to float
    IntToFloat,
    /// Float to signed integer, truncating
    FloatToInt,
}

impl ConvertOp {
    /// Conversion from `from` to `to`, or `None` if the types already match
    pub fn between(from: IrType, to: IrType) -> Option<Self> {
        match (from, to) {
            (IrType::I64, IrType::F64) => Some(Self::IntToFloat),
            (IrType::F64, IrType::I64) => Some(Self::FloatToInt),
            _ => None,
        }
    }

    /// Result type
    pub fn target(self) -> IrType {
        match self {
            Self::IntToFloat => IrType::F64,
            Self::FloatToInt => IrType::I64,
        }
    }
}

/// Block terminators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Return from the function
    Return(Value),
}
