use yulssa_ast::{builder::AstBuilder, dialect::evm_dialect};
use yulssa_ir::{builder::test_util::dump_cfg, ir_writer::CfgWriter, CfgBuilder};

#[test]
fn function_graph() {
    let dialect = evm_dialect();
    let add = dialect.find_builtin("add").unwrap();
    let mul = dialect.find_builtin("mul").unwrap();

    let mut decl = None;
    let (_, info) = AstBuilder::new()
        .program(|b| {
            decl = Some(b.function("f", &["a"], &["r"], |_| {}));
        })
        .unwrap();
    let decl = decl.unwrap();

    let mut b = CfgBuilder::for_function(decl.id);
    let a = b.append_argument(decl.params[0]);
    b.declare_return(decl.returns[0]);
    let one = b.make_literal(1u64);
    let sum = b.builtin(add, &[a, one], 1)[0];

    let then_block = b.append_block();
    let join = b.append_block();
    b.branch(sum, then_block, join);

    b.switch_to_block(then_block);
    let two = b.make_literal(2u64);
    let product = b.builtin(mul, &[sum, two], 1)[0];
    b.jump(join);

    b.switch_to_block(join);
    let phi = b.make_phi(join);
    b.set_phi_args(phi, &[sum, product]);
    b.ret(&[phi]);

    let cfg = b.finish().unwrap();
    insta::assert_snapshot!(dump_cfg(&cfg, &dialect, &info), @r"
function f(v0) -> 1 {
block0:
    v2 = add(v0, 1)
    branch v2, block1, block2
block1 <- (block0):
    v4 = mul(v2, 2)
    jump block2
block2 <- (block0, block1):
    v5 = phi(v2, v4)
    return v5
}
");
}

#[test]
fn unresolved_names_fall_back_to_ids() {
    let dialect = evm_dialect();
    let revert = dialect.find_builtin("revert").unwrap();

    let mut b = CfgBuilder::new();
    let zero = b.make_literal(0u64);
    b.builtin(revert, &[zero, zero], 0);
    b.terminate();
    let cfg = b.finish().unwrap();

    let op = &cfg.block(cfg.entry).operations[0];
    assert_eq!(
        CfgWriter::new(&cfg).operation_string(op),
        format!("{revert}(0, 0)")
    );
    assert_eq!(
        CfgWriter::new(&cfg).with_dialect(&dialect).dump_string(),
        "main {\nblock0:\n    revert(0, 0)\n    terminated\n}\n"
    );
}
