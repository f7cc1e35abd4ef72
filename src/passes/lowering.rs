//! Lowering: branch canonicalization and immediate operand folding.
//!
//! The last pass before code generation. It rewrites three shapes into forms
//! the target encodes directly, consulting the [`Target`](crate::ir::Target)
//! oracle for every immediate:
//!
//! - A `Compare` feeding its only user, an `IfImm` test against zero, fuses
//!   into a single conditional branch: an `IfImm` carrying the compare's
//!   condition when the constant operand fits an immediate compare, otherwise
//!   a two-operand `If`.
//! - Binary ALU instructions with a constant operand become their immediate
//!   forms (`Add` to `AddI` and so on). An add or sub of a negative constant
//!   that only fits negated flips to the opposite operation.
//! - A `Return` of a constant becomes `ReturnI`.
//!
//! Replaced instructions stay in their block without users; dead-code
//! elimination collects them later.
//!
//! # Example
//!
//! ```text
//! // Before                          // After
//! bb:                                bb:
//!     c = Compare(a, 0, LT)              c = Compare(a, 0, LT)   // userless
//!     IfImm(c != 0) -> tbb, fbb          IfImm(a < 0) -> tbb, fbb
//! ```

use crate::ir::{ConditionCode, DataType, Graph, InstId, Opcode};
use crate::passes::OptPass;
use crate::Result;

/// Branch canonicalization and immediate folding.
#[derive(Debug, Default)]
pub struct Lowering;

impl Lowering {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Lowering {
        Lowering
    }

    /// Fuses a `Compare` + `IfImm`-against-zero pair into one branch.
    fn lower_branch(&self, graph: &mut Graph, branch: InstId) -> bool {
        let inst = graph.inst(branch);
        if inst.operands_ty() != DataType::Bool || inst.imm() != 0 {
            return false;
        }
        if !matches!(inst.cc(), ConditionCode::Eq | ConditionCode::Ne) {
            return false;
        }
        let cmp = graph.inst(inst.input(0));
        if cmp.opcode() != Opcode::Compare || !cmp.has_single_user() {
            return false;
        }

        // `IfImm(cmp == 0)` branches when the compare fails.
        let mut cc = cmp.cc();
        if inst.cc() == ConditionCode::Eq {
            cc = cc.invert();
        }
        let operands_ty = cmp.operands_ty();
        let width: u8 = if operands_ty.is_64bit() { 64 } else { 32 };
        let (mut lhs, mut rhs) = (cmp.input(0), cmp.input(1));
        if graph.inst(lhs).is_const() && !graph.inst(rhs).is_const() {
            std::mem::swap(&mut lhs, &mut rhs);
            cc = cc.swap_operands();
        }

        if graph.inst(rhs).is_const() {
            let value = graph.inst(rhs).imm();
            if (value == 0 && width == 32) || graph.target().can_encode_imm_compare(value, width) {
                // Retarget the branch in place; the compare loses its last
                // user and stays for dead-code elimination.
                log::debug!("fusing compare into {branch}: {cc} imm {value}");
                graph.set_input(branch, 0, lhs);
                let branch = graph.inst_mut(branch);
                branch.set_cc(cc);
                branch.set_imm(value);
                branch.set_operands_ty(operands_ty);
                return true;
            }
        }

        log::debug!("fusing compare into a register branch for {branch}");
        let lowered = graph.new_if(cc, operands_ty, lhs, rhs);
        graph.replace_inst(branch, lowered);
        true
    }

    /// Rewrites a binary ALU instruction with a constant operand into its
    /// immediate form.
    fn lower_binary(&self, graph: &mut Graph, inst_id: InstId) -> bool {
        let inst = graph.inst(inst_id);
        let opcode = inst.opcode();
        let Some(imm_opcode) = opcode.imm_form() else {
            return false;
        };
        let ty = inst.ty();
        if !ty.is_integral() || ty.bit_width() < 32 {
            return false;
        }
        let width: u8 = if ty.is_64bit() { 64 } else { 32 };
        let (lhs, rhs) = (inst.input(0), inst.input(1));

        let (kept, value) = if graph.inst(rhs).is_const() {
            (lhs, graph.inst(rhs).imm())
        } else if graph.inst(lhs).is_const() && opcode.is_commutative() {
            (rhs, graph.inst(lhs).imm())
        } else {
            return false;
        };

        let target = graph.target();
        let encoded = match opcode {
            Opcode::Add | Opcode::Sub => {
                if target.can_encode_imm_add_sub(value, width) {
                    Some((imm_opcode, value))
                } else if value < 0
                    && value != i64::MIN
                    && target.can_encode_imm_add_sub(-value, width)
                {
                    // add x, -c and sub x, -c encode as their mirror.
                    let flipped = if opcode == Opcode::Add {
                        Opcode::SubI
                    } else {
                        Opcode::AddI
                    };
                    Some((flipped, -value))
                } else {
                    None
                }
            }
            Opcode::And | Opcode::Or | Opcode::Xor => target
                .can_encode_imm_logical(value, width)
                .then_some((imm_opcode, value)),
            Opcode::Shl | Opcode::Shr | Opcode::AShr => target
                .can_encode_imm_shift(value, width)
                .then_some((imm_opcode, value)),
            _ => None,
        };
        let Some((imm_opcode, value)) = encoded else {
            return false;
        };

        log::debug!("{inst_id}: {opcode:?} imm {value} becomes {imm_opcode:?}");
        let lowered = graph.new_binary_imm(imm_opcode, ty, kept, value);
        graph.insert_before(lowered, inst_id);
        graph.replace_users(inst_id, lowered);
        true
    }

    /// Rewrites a `Return` of a constant into `ReturnI`.
    fn lower_return(&self, graph: &mut Graph, ret: InstId) -> bool {
        let ty = graph.inst(ret).ty();
        let value = graph.inst(ret).input(0);
        if !graph.inst(value).is_const() {
            return false;
        }
        let imm = graph.inst(value).imm();
        let lowered = graph.new_return_imm(ty, imm);
        graph.replace_inst(ret, lowered);
        true
    }
}

impl OptPass for Lowering {
    fn name(&self) -> &'static str {
        "lowering"
    }

    fn description(&self) -> &'static str {
        "Canonicalizes branches and folds constants into immediate instruction forms"
    }

    fn run(&mut self, graph: &mut Graph) -> Result<bool> {
        let mut changed = false;
        for block in graph.reverse_postorder() {
            // Rewrites splice into the instruction list, so iterate a snapshot.
            let insts: Vec<InstId> = graph.block(block).insts().to_vec();
            for inst in insts {
                changed |= match graph.inst(inst).opcode() {
                    Opcode::IfImm => self.lower_branch(graph, inst),
                    Opcode::Return => self.lower_return(graph, inst),
                    opcode if opcode.imm_form().is_some() => self.lower_binary(graph, inst),
                    _ => false,
                };
            }
        }
        if changed {
            graph.invalidate_bounds();
        }
        Ok(changed)
    }
}
