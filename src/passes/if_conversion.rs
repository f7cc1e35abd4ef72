//! If-conversion: branch patterns become `Select` instructions.
//!
//! Small conditionally executed regions cost more in branch misprediction than
//! their contents cost to execute. This pass finds two shapes and flattens
//! them into straight-line code with a branchless select per surviving phi:
//!
//! - **Triangle**: one successor is a side block falling through to the other
//!   successor.
//! - **Diamond**: both successors are side blocks converging on a common join.
//!
//! A side block qualifies when the branching block is its only predecessor,
//! it contains no phis and every instruction in it may execute speculatively
//! (no traps, calls or stores). A size limit bounds both the instructions
//! moved and the selects created, since past a handful of operations the
//! branch is usually cheaper again.
//!
//! # Example
//!
//! ```text
//! // Before                            // After
//! bb:                                  bb:
//!     c = Compare(a, b, LT)                c = Compare(a, b, LT)
//!     IfImm(c != 0) -> tbb, join           x = Add(a, 1)
//! tbb:                                     s = SelectImm(x, a, c != 0)
//!     x = Add(a, 1)                        r = Return(s)
//! join:
//!     p = Phi(x via tbb, a via bb)
//!     r = Return(p)
//! ```
//!
//! The join block is folded into the branching block afterwards when it has no
//! other predecessors left and both blocks agree on their try-region flag;
//! otherwise it stays, with the select feeding its phi input.

use crate::ir::{BlockId, ConditionCode, DataType, Graph, InstId, Opcode};
use crate::passes::OptPass;
use crate::Result;

/// Conversions never move more instructions or create more selects than this
/// unless overridden with [`IfConversion::with_limit`].
const DEFAULT_LIMIT: u32 = 2;

/// Branchless rewrite of triangle and diamond control flow.
pub struct IfConversion {
    limit: u32,
}

impl Default for IfConversion {
    fn default() -> Self {
        Self::new()
    }
}

impl IfConversion {
    /// Creates the pass with the default size limit.
    #[must_use]
    pub fn new() -> IfConversion {
        IfConversion {
            limit: DEFAULT_LIMIT,
        }
    }

    /// Creates the pass with a custom limit on instructions moved and selects
    /// created per conversion. A limit of zero only converts empty patterns
    /// whose phis need no select.
    #[must_use]
    pub fn with_limit(limit: u32) -> IfConversion {
        IfConversion { limit }
    }

    /// Tries both triangle orientations, then the diamond shape.
    fn try_convert(&self, graph: &mut Graph, bb: BlockId) -> Result<bool> {
        let Some((branch, kind)) = capture_branch(graph, bb) else {
            return Ok(false);
        };
        let on_true = graph.block(bb).true_successor();
        let on_false = graph.block(bb).false_successor();
        if on_true == on_false {
            return Ok(false);
        }

        if let Some(plan) = self.plan_triangle(graph, bb, on_true, on_false, branch, kind)? {
            self.apply(graph, bb, &[on_true], on_false, plan)?;
            return Ok(true);
        }
        if let Some(plan) = self.plan_triangle(graph, bb, on_false, on_true, branch, kind)? {
            self.apply(graph, bb, &[on_false], on_true, plan)?;
            return Ok(true);
        }
        if let Some(plan) = self.plan_diamond(graph, bb, on_true, on_false, branch, kind)? {
            let join = graph.block(on_true).succs()[0];
            self.apply(graph, bb, &[on_true, on_false], join, plan)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Checks the triangle shape `bb -> side -> join`, `bb -> join` and builds
    /// the conversion plan for it.
    fn plan_triangle(
        &self,
        graph: &Graph,
        bb: BlockId,
        side: BlockId,
        join: BlockId,
        branch: InstId,
        kind: BranchKind,
    ) -> Result<Option<Plan>> {
        if side == bb || join == bb {
            return Ok(None);
        }
        let side_block = graph.block(side);
        if side_block.preds() != [bb]
            || side_block.succs() != [join]
            || !side_block.phis().is_empty()
        {
            return Ok(None);
        }
        if !self.movable(graph, &[side]) {
            return Ok(None);
        }

        let side_is_true = graph.block(bb).true_successor() == side;
        let mut phis = Vec::new();
        for &phi in graph.block(join).phis() {
            let via_side = graph.phi_input_of(phi, side)?;
            let via_bb = graph.phi_input_of(phi, bb)?;
            let (on_true, on_false) = if side_is_true {
                (via_side, via_bb)
            } else {
                (via_bb, via_side)
            };
            phis.push(PhiPlan { phi, on_true, on_false });
        }
        if !self.selects_fit(graph, &phis) {
            return Ok(None);
        }
        Ok(Some(Plan { branch, kind, phis }))
    }

    /// Checks the diamond shape `bb -> {on_true, on_false} -> join` and builds
    /// the conversion plan for it.
    fn plan_diamond(
        &self,
        graph: &Graph,
        bb: BlockId,
        on_true: BlockId,
        on_false: BlockId,
        branch: InstId,
        kind: BranchKind,
    ) -> Result<Option<Plan>> {
        if on_true == bb || on_false == bb {
            return Ok(None);
        }
        let tb = graph.block(on_true);
        let fb = graph.block(on_false);
        if tb.preds() != [bb] || fb.preds() != [bb] {
            return Ok(None);
        }
        if tb.succs().len() != 1 || fb.succs().len() != 1 || tb.succs() != fb.succs() {
            return Ok(None);
        }
        let join = tb.succs()[0];
        if join == bb {
            return Ok(None);
        }
        if !tb.phis().is_empty() || !fb.phis().is_empty() {
            return Ok(None);
        }
        if !self.movable(graph, &[on_true, on_false]) {
            return Ok(None);
        }

        let mut phis = Vec::new();
        for &phi in graph.block(join).phis() {
            phis.push(PhiPlan {
                phi,
                on_true: graph.phi_input_of(phi, on_true)?,
                on_false: graph.phi_input_of(phi, on_false)?,
            });
        }
        if !self.selects_fit(graph, &phis) {
            return Ok(None);
        }
        Ok(Some(Plan { branch, kind, phis }))
    }

    /// Whether the side blocks' instructions may all be speculated and their
    /// combined count fits the limit.
    fn movable(&self, graph: &Graph, sides: &[BlockId]) -> bool {
        let mut count = 0usize;
        for &side in sides {
            let insts = graph.block(side).insts();
            if insts
                .iter()
                .any(|&inst| !graph.inst(inst).opcode().is_if_convertible())
            {
                return false;
            }
            count += insts.len();
        }
        count <= self.limit as usize
    }

    /// Whether the selects the plan needs fit the limit. Floats have no select
    /// form, so a float phi with differing inputs rejects the plan.
    fn selects_fit(&self, graph: &Graph, phis: &[PhiPlan]) -> bool {
        let mut selects = 0usize;
        for plan in phis {
            if plan.on_true == plan.on_false {
                continue;
            }
            if graph.inst(plan.phi).ty().is_float() {
                return false;
            }
            selects += 1;
        }
        selects <= self.limit as usize
    }

    /// Executes a prepared conversion: the branch goes away, side instructions
    /// and fresh selects move into `bb`, the CFG collapses onto the join.
    fn apply(
        &self,
        graph: &mut Graph,
        bb: BlockId,
        sides: &[BlockId],
        join: BlockId,
        plan: Plan,
    ) -> Result<()> {
        log::debug!(
            "converting {} side block(s) of {bb}, {} phi(s) at {join}",
            sides.len(),
            plan.phis.len()
        );
        graph.remove_inst(plan.branch);

        for &side in sides {
            let moved: Vec<InstId> = graph.block(side).insts().to_vec();
            for inst in moved {
                graph.move_inst(inst, bb);
            }
        }

        let mut new_inputs = Vec::with_capacity(plan.phis.len());
        for phi_plan in &plan.phis {
            let value = if phi_plan.on_true == phi_plan.on_false {
                phi_plan.on_true
            } else {
                let select = plan.kind.materialize(graph, phi_plan);
                graph.append_inst(bb, select);
                select
            };
            new_inputs.push((phi_plan.phi, value));
        }

        // Edge surgery. Removing an edge drops the matching phi inputs at its
        // target, so the join's phis shrink here and grow back one input when
        // bb is reconnected below.
        for &side in sides {
            graph.remove_edge(bb, side)?;
            graph.remove_edge(side, join)?;
        }
        if let [side] = sides {
            debug_assert!(graph.block(*side).succs().is_empty());
            graph.remove_edge(bb, join)?;
        }
        graph.connect(bb, join);
        for (phi, value) in new_inputs {
            graph.add_input(phi, value);
        }
        for &side in sides {
            graph.remove_block(side)?;
        }

        // Fold the join into bb unless other control flow still enters it or
        // the blocks disagree about being inside a try region.
        if graph.block(join).preds() == [bb]
            && join != graph.exit()
            && graph.block(join).is_try() == graph.block(bb).is_try()
        {
            graph.join_successor(bb, join)?;
        }
        Ok(())
    }
}

impl OptPass for IfConversion {
    fn name(&self) -> &'static str {
        "if-conversion"
    }

    fn description(&self) -> &'static str {
        "Replaces triangle and diamond branches with select instructions"
    }

    fn run(&mut self, graph: &mut Graph) -> Result<bool> {
        let mut changed = false;
        // Postorder, so inner patterns collapse before the blocks around them
        // are inspected. The order is a snapshot; blocks removed by earlier
        // conversions are skipped.
        for block in graph.postorder() {
            if !graph.is_live_block(block) {
                continue;
            }
            if graph.block(block).succs().len() != 2 {
                continue;
            }
            changed |= self.try_convert(graph, block)?;
        }
        if changed {
            graph.invalidate_bounds();
        }
        Ok(changed)
    }
}

/// The captured payload of the branch being eliminated.
#[derive(Clone, Copy)]
enum BranchKind {
    /// A two-operand `If`; selects become four-input `Select`s.
    Cmp {
        cc: ConditionCode,
        operands_ty: DataType,
        lhs: InstId,
        rhs: InstId,
    },
    /// An `IfImm`; selects become `SelectImm`s over the same condition input.
    CondImm {
        cc: ConditionCode,
        imm: i64,
        operands_ty: DataType,
        cond: InstId,
    },
}

impl BranchKind {
    /// Creates the select matching this branch for one phi.
    fn materialize(self, graph: &mut Graph, plan: &PhiPlan) -> InstId {
        let ty = graph.inst(plan.phi).ty();
        match self {
            BranchKind::Cmp {
                cc,
                operands_ty,
                lhs,
                rhs,
            } => graph.new_select(ty, cc, operands_ty, plan.on_true, plan.on_false, lhs, rhs),
            BranchKind::CondImm {
                cc,
                imm,
                operands_ty,
                cond,
            } => graph.new_select_imm(ty, cc, imm, operands_ty, plan.on_true, plan.on_false, cond),
        }
    }
}

/// A conversion decided up front, before any mutation.
struct Plan {
    branch: InstId,
    kind: BranchKind,
    phis: Vec<PhiPlan>,
}

/// One join-block phi and its values along the two branch outcomes.
struct PhiPlan {
    phi: InstId,
    on_true: InstId,
    on_false: InstId,
}

/// The branch ending `bb`, if it is a conditional one.
fn capture_branch(graph: &Graph, bb: BlockId) -> Option<(InstId, BranchKind)> {
    let branch = graph.terminator_of(bb)?;
    let inst = graph.inst(branch);
    let kind = match inst.opcode() {
        Opcode::If => BranchKind::Cmp {
            cc: inst.cc(),
            operands_ty: inst.operands_ty(),
            lhs: inst.input(0),
            rhs: inst.input(1),
        },
        Opcode::IfImm => BranchKind::CondImm {
            cc: inst.cc(),
            imm: inst.imm(),
            operands_ty: inst.operands_ty(),
            cond: inst.input(0),
        },
        _ => return None,
    };
    Some((branch, kind))
}
