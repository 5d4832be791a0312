//! Textual listing of hand-built modules

use expect_test::expect;
use tc_ir::{BinOp, CmpPred, IrType, Linkage, ModuleBuilder, Param};

fn int_param(name: &str) -> Param {
    Param {
        name: name.to_string(),
        ty: IrType::I64,
    }
}

#[test]
fn test_print_mixed_module() {
    let mut builder = ModuleBuilder::new("demo");
    let puts = builder.declare_function("puts", vec![int_param("value")], IrType::I64, Linkage::External);
    let scale = builder.declare_function("scale", vec![int_param("x")], IrType::I64, Linkage::Internal);
    builder.declare_function("broken", Vec::new(), IrType::I64, Linkage::Internal);

    let mut body = builder.define(scale, "entry");
    let slot = body.create_slot("x", IrType::I64);
    let arg = body.param(0);
    body.store(slot, arg);
    let loaded = body.load(slot);
    let wide = body.coerce(loaded, IrType::F64);
    let factor = body.fconst(1.5);
    let product = body.binary(BinOp::Mul, wide, factor);
    let narrowed = body.coerce(product, IrType::I64);
    let flag = body.compare(CmpPred::Gt, narrowed, loaded);
    let printed = body.call(puts, vec![flag]);
    body.ret(printed);

    let module = builder.finish();
    assert_eq!(module.function_count(), 3);
    expect![[r#"
        module demo

        extern fn puts(%0: i64) -> i64

        fn scale(%0: i64) -> i64 {
          $0 = slot i64 ; x
        entry:
          store $0, %0
          %1 = load $0
          %2 = sitofp %1
          %3 = const f64 1.5
          %4 = fmul %2, %3
          %5 = fptosi %4
          %6 = icmp gt %5, %1
          %7 = call @puts(%6)
          ret %7
        }

        declare fn broken() -> i64
    "#]]
    .assert_eq(&module.to_string());
}

#[test]
fn test_lookup_helpers() {
    let mut builder = ModuleBuilder::new("demo");
    let id = builder.declare_function("answer", Vec::new(), IrType::I64, Linkage::Internal);
    let mut body = builder.define(id, "entry");
    let value = body.iconst(42);
    body.ret(value);
    let module = builder.finish();

    let answer = module.function_by_name("answer").expect("function is declared");
    assert_eq!(answer.id, id);
    assert!(answer.params.is_empty());
    assert!(module.function_by_name("question").is_none());
    assert!(matches!(
        answer.definition(value).map(|inst| &inst.kind),
        Some(tc_ir::InstKind::Const(tc_ir::Constant::Int(42)))
    ));
}
