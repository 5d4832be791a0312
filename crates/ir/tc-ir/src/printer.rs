//! Textual IR listing

use crate::{
    BinOp, CmpPred, Constant, ConvertOp, Function, InstKind, Instruction, IrType, Linkage, Module,
    Terminator, Value,
};
use std::fmt;

impl fmt::Display for IrType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I64 => formatter.write_str("i64"),
            Self::F64 => formatter.write_str("f64"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "%{}", self.0)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(formatter, "i64 {value}"),
            Self::Float(value) => write!(formatter, "f64 {value:?}"),
        }
    }
}

impl BinOp {
    fn mnemonic(self, ty: IrType) -> &'static str {
        match (self, ty) {
            (Self::Add, IrType::I64) => "add",
            (Self::Sub, IrType::I64) => "sub",
            (Self::Mul, IrType::I64) => "mul",
            (Self::Div, IrType::I64) => "sdiv",
            (Self::Add, IrType::F64) => "fadd",
            (Self::Sub, IrType::F64) => "fsub",
            (Self::Mul, IrType::F64) => "fmul",
            (Self::Div, IrType::F64) => "fdiv",
        }
    }
}

impl CmpPred {
    fn mnemonic(self) -> &'static str {
        match self {
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Eq => "eq",
        }
    }
}

impl ConvertOp {
    fn mnemonic(self) -> &'static str {
        match self {
            Self::IntToFloat => "sitofp",
            Self::FloatToInt => "fptosi",
        }
    }
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_signature(formatter: &mut fmt::Formatter<'_>, function: &Function) -> fmt::Result {
    write!(formatter, "fn {}(", function.name)?;
    for (index, param) in function.params.iter().enumerate() {
        if index > 0 {
            write!(formatter, ", ")?;
        }
        write!(formatter, "%{index}: {}", param.ty)?;
    }
    write!(formatter, ") -> {}", function.ret)
}

fn write_instruction(
    formatter: &mut fmt::Formatter<'_>,
    module: &Module,
    function: &Function,
    inst: &Instruction,
) -> fmt::Result {
    write!(formatter, "  ")?;
    if let Some(result) = inst.result {
        write!(formatter, "{result} = ")?;
    }
    match &inst.kind {
        InstKind::Const(constant) => write!(formatter, "const {constant}")?,
        InstKind::Load { slot } => write!(formatter, "load ${}", slot.0)?,
        InstKind::Store { slot, value } => write!(formatter, "store ${}, {value}", slot.0)?,
        InstKind::Binary { op, lhs, rhs } => {
            let mnemonic = op.mnemonic(function.value_type(*lhs));
            write!(formatter, "{mnemonic} {lhs}, {rhs}")?;
        }
        InstKind::Compare { pred, lhs, rhs } => {
            let prefix = match function.value_type(*lhs) {
                IrType::I64 => "icmp",
                IrType::F64 => "fcmp",
            };
            write!(formatter, "{prefix} {} {lhs}, {rhs}", pred.mnemonic())?;
        }
        InstKind::Convert { op, value } => write!(formatter, "{} {value}", op.mnemonic())?,
        InstKind::Call { callee, args } => write!(
            formatter,
            "call @{}({})",
            module.function(*callee).name,
            join_values(args)
        )?,
    }
    writeln!(formatter)
}

fn write_function(
    formatter: &mut fmt::Formatter<'_>,
    module: &Module,
    function: &Function,
) -> fmt::Result {
    if function.linkage == Linkage::External {
        write!(formatter, "extern ")?;
        write_signature(formatter, function)?;
        return writeln!(formatter);
    }
    if function.is_declaration() {
        write!(formatter, "declare ")?;
        write_signature(formatter, function)?;
        return writeln!(formatter);
    }

    write_signature(formatter, function)?;
    writeln!(formatter, " {{")?;
    for slot in &function.slots {
        writeln!(formatter, "  ${} = slot {} ; {}", slot.id.0, slot.ty, slot.name)?;
    }
    for block in &function.blocks {
        writeln!(formatter, "{}:", block.label)?;
        for inst in &block.instructions {
            write_instruction(formatter, module, function, inst)?;
        }
        match block.terminator {
            Some(Terminator::Return(value)) => writeln!(formatter, "  ret {value}")?,
            None => writeln!(formatter, "  <unterminated>")?,
        }
    }
    writeln!(formatter, "}}")
}

impl fmt::Display for Module {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "module {}", self.name)?;
        for function in &self.functions {
            writeln!(formatter)?;
            write_function(formatter, self, function)?;
        }
        Ok(())
    }
}
