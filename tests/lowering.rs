//! Lowering integration tests.
//!
//! These tests verify branch canonicalization and immediate folding through
//! the public API:
//! 1. Build method graphs using `GraphBuilder`
//! 2. Run the `Lowering` pass (or a full pipeline behind `run_pipeline`)
//! 3. Verify fused branches, immediate instruction forms and what stays put

use optir::{
    ir::{BlockId, ConditionCode, DataType, GraphBuilder, Opcode},
    passes::{run_pipeline, IfConversion, Lowering, OptPass},
    Result,
};

/// Declares `entry -> head -> {t, f} -> exit` with both targets returning and
/// the insertion point left on `head` for the branch under test.
fn branch_skeleton() -> (GraphBuilder, BlockId) {
    let mut b = GraphBuilder::new();
    let head = b.block();
    let t = b.block();
    let f = b.block();
    b.edge(b.entry(), head);
    b.edge(head, t);
    b.edge(head, f);
    b.edge(t, b.exit());
    b.edge(f, b.exit());
    b.switch_to(t);
    b.ret_void();
    b.switch_to(f);
    b.ret_void();
    b.switch_to(head);
    (b, head)
}

#[test]
fn test_compare_branch_fuses_into_register_branch() -> Result<()> {
    // Two non-constant operands leave nothing to encode as an immediate, so
    // the pair becomes a two-operand `If`.
    let (mut b, head) = branch_skeleton();
    let x = b.parameter(DataType::I32);
    let y = b.parameter(DataType::I32);
    let cmp = b.compare(ConditionCode::Lt, DataType::I32, x, y);
    b.if_imm(ConditionCode::Ne, 0, DataType::Bool, cmp);
    let mut graph = b.finish()?;

    let mut pass = Lowering::new();
    assert!(pass.run(&mut graph)?);

    let branch = graph.terminator_of(head).expect("branch terminates the block");
    assert_eq!(graph.inst(branch).opcode(), Opcode::If);
    assert_eq!(graph.inst(branch).cc(), ConditionCode::Lt);
    assert_eq!(graph.inst(branch).inputs(), [x, y]);
    // The compare stays behind without users, for dead-code elimination.
    assert!(!graph.inst(cmp).has_users());

    Ok(())
}

#[test]
fn test_small_constant_compare_stays_immediate() -> Result<()> {
    // Branching on the compare being false inverts the code; the constant
    // fits the immediate field and the branch is retargeted in place.
    let (mut b, head) = branch_skeleton();
    let x = b.parameter(DataType::I32);
    let seven = b.int_constant(7);
    let cmp = b.compare(ConditionCode::Lt, DataType::I32, x, seven);
    let branch = b.if_imm(ConditionCode::Eq, 0, DataType::Bool, cmp);
    let mut graph = b.finish()?;

    let mut pass = Lowering::new();
    assert!(pass.run(&mut graph)?);

    assert_eq!(graph.terminator_of(head), Some(branch));
    let inst = graph.inst(branch);
    assert_eq!(inst.opcode(), Opcode::IfImm);
    assert_eq!(inst.cc(), ConditionCode::Ge);
    assert_eq!(inst.imm(), 7);
    assert_eq!(inst.operands_ty(), DataType::I32);
    assert_eq!(inst.inputs(), [x]);

    Ok(())
}

#[test]
fn test_constant_on_the_left_swaps_into_immediate_position() -> Result<()> {
    // `5 > x` reads the same as `x < 5` once the operands trade places.
    let (mut b, head) = branch_skeleton();
    let x = b.parameter(DataType::I32);
    let five = b.int_constant(5);
    let cmp = b.compare(ConditionCode::Gt, DataType::I32, five, x);
    b.if_imm(ConditionCode::Ne, 0, DataType::Bool, cmp);
    let mut graph = b.finish()?;

    let mut pass = Lowering::new();
    assert!(pass.run(&mut graph)?);

    let branch = graph.terminator_of(head).expect("branch terminates the block");
    let inst = graph.inst(branch);
    assert_eq!(inst.opcode(), Opcode::IfImm);
    assert_eq!(inst.cc(), ConditionCode::Lt);
    assert_eq!(inst.imm(), 5);
    assert_eq!(inst.input(0), x);

    Ok(())
}

#[test]
fn test_unencodable_compare_keeps_the_register_operand() -> Result<()> {
    // 0x12345 fits neither the plain nor the shifted 12-bit immediate class.
    let (mut b, head) = branch_skeleton();
    let x = b.parameter(DataType::I32);
    let big = b.int_constant(0x12345);
    let cmp = b.compare(ConditionCode::Lt, DataType::I32, x, big);
    b.if_imm(ConditionCode::Ne, 0, DataType::Bool, cmp);
    let mut graph = b.finish()?;

    let mut pass = Lowering::new();
    assert!(pass.run(&mut graph)?);

    let branch = graph.terminator_of(head).expect("branch terminates the block");
    assert_eq!(graph.inst(branch).opcode(), Opcode::If);
    assert_eq!(graph.inst(branch).inputs(), [x, big]);
    assert!(!graph.inst(cmp).has_users());

    Ok(())
}

#[test]
fn test_alu_constants_fold_to_immediate_forms() -> Result<()> {
    // ((x + 100) & 0xFF) << 3, every step with an encodable constant.
    let mut b = GraphBuilder::new();
    let body = b.block();
    b.edge(b.entry(), body);
    b.edge(body, b.exit());

    let x = b.parameter(DataType::I32);
    let hundred = b.int_constant(100);
    let mask = b.int_constant(0xFF);
    let three = b.int_constant(3);
    b.switch_to(body);
    let sum = b.binary(Opcode::Add, DataType::I32, x, hundred);
    let masked = b.binary(Opcode::And, DataType::I32, sum, mask);
    let shifted = b.binary(Opcode::Shl, DataType::I32, masked, three);
    b.ret(DataType::I32, shifted);
    let mut graph = b.finish()?;

    let mut pass = Lowering::new();
    assert!(pass.run(&mut graph)?);

    // The return now reaches through a chain of immediate forms.
    let ret = graph.terminator_of(body).expect("return terminates the block");
    let shl_i = graph.inst(ret).input(0);
    assert_eq!(graph.inst(shl_i).opcode(), Opcode::ShlI);
    assert_eq!(graph.inst(shl_i).imm(), 3);
    let and_i = graph.inst(shl_i).input(0);
    assert_eq!(graph.inst(and_i).opcode(), Opcode::AndI);
    assert_eq!(graph.inst(and_i).imm(), 0xFF);
    let add_i = graph.inst(and_i).input(0);
    assert_eq!(graph.inst(add_i).opcode(), Opcode::AddI);
    assert_eq!(graph.inst(add_i).imm(), 100);
    assert_eq!(graph.inst(add_i).input(0), x);
    // The replaced instructions linger userless until dead-code elimination.
    assert!(!graph.inst(sum).has_users());

    Ok(())
}

#[test]
fn test_subword_and_out_of_range_operands_are_kept() -> Result<()> {
    let mut b = GraphBuilder::new();
    let body = b.block();
    b.edge(b.entry(), body);
    b.edge(body, b.exit());

    let x = b.parameter(DataType::I32);
    let short = b.parameter(DataType::I16);
    let five = b.int_constant(5);
    let forty = b.int_constant(40);
    b.switch_to(body);
    // Subword arithmetic has no immediate encoding.
    let narrow = b.binary(Opcode::Add, DataType::I16, short, five);
    // 40 is not a legal 32-bit shift amount.
    let wide = b.binary(Opcode::Shl, DataType::I32, x, forty);
    b.ret_void();
    let mut graph = b.finish()?;

    let mut pass = Lowering::new();
    assert!(!pass.run(&mut graph)?);
    assert_eq!(graph.inst(narrow).opcode(), Opcode::Add);
    assert_eq!(graph.inst(wide).opcode(), Opcode::Shl);

    Ok(())
}

#[test]
fn test_return_of_constant_becomes_immediate() -> Result<()> {
    let mut b = GraphBuilder::new();
    let body = b.block();
    b.edge(b.entry(), body);
    b.edge(body, b.exit());

    let answer = b.int_constant(42);
    b.switch_to(body);
    b.ret(DataType::I32, answer);
    let mut graph = b.finish()?;

    let mut pass = Lowering::new();
    assert!(pass.run(&mut graph)?);

    let ret = graph.terminator_of(body).expect("return terminates the block");
    assert_eq!(graph.inst(ret).opcode(), Opcode::ReturnI);
    assert_eq!(graph.inst(ret).imm(), 42);
    assert!(graph.inst(ret).inputs().is_empty());

    Ok(())
}

#[test]
fn test_pipeline_converts_then_lowers() -> Result<()> {
    // max(x, x + 5): if-conversion leaves a select, then lowering folds the
    // add feeding it into an immediate form.
    let mut b = GraphBuilder::new();
    let head = b.block();
    let taken = b.block();
    let skipped = b.block();
    let join = b.block();
    b.edge(b.entry(), head);
    b.edge(head, taken);
    b.edge(head, skipped);
    b.edge(taken, join);
    b.edge(skipped, join);
    b.edge(join, b.exit());

    let x = b.parameter(DataType::I32);
    let five = b.int_constant(5);
    b.switch_to(head);
    let bumped = b.binary(Opcode::Add, DataType::I32, x, five);
    b.if_cmp(ConditionCode::Gt, DataType::I32, x, bumped);
    b.switch_to(join);
    let max = b.phi(DataType::I32, &[(taken, x), (skipped, bumped)]);
    b.ret(DataType::I32, max);
    let mut graph = b.finish()?;

    let mut passes: Vec<Box<dyn OptPass>> =
        vec![Box::new(IfConversion::new()), Box::new(Lowering::new())];
    assert!(run_pipeline(&mut graph, &mut passes)?);

    assert_eq!(graph.block_count(), 3);
    let select = graph
        .block(head)
        .insts()
        .iter()
        .copied()
        .find(|&i| graph.inst(i).opcode() == Opcode::Select)
        .expect("conversion materialized a select");
    assert_eq!(graph.inst(select).cc(), ConditionCode::Gt);
    let add_i = graph.inst(select).input(1);
    assert_eq!(graph.inst(add_i).opcode(), Opcode::AddI);
    assert_eq!(graph.inst(add_i).imm(), 5);
    // Both occurrences of the folded value were rewritten.
    assert_eq!(graph.inst(select).input(3), add_i);
    let ret = graph.terminator_of(head).expect("return terminates the block");
    assert_eq!(graph.inst(ret).input(0), select);

    Ok(())
}
