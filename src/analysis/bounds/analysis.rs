//! The range analysis driver.
//!
//! A single forward pass over the graph in reverse postorder. Only two
//! instruction shapes produce new facts: phis, whose range is the union of
//! their inputs' ranges as seen from each predecessor, and `IfImm` branches
//! testing a compare, which sharpen both compare operands along the taken and
//! the not-taken edge. One pass suffices because facts are stored at the block
//! where they hold and looked up through the dominator tree; the analysis does
//! not iterate to a fixpoint.

use crate::analysis::bounds::{BoundsRange, BoundsRangeInfo};
use crate::ir::{BlockId, ConditionCode, DataType, Graph, InstId, Opcode};

/// Single-pass range analysis over a graph.
///
/// Constructed and cached by [`Graph::bounds_range_info`]; run it directly to
/// get an uncached [`BoundsRangeInfo`].
#[derive(Debug)]
pub struct BoundsAnalysis<'a> {
    graph: &'a Graph,
}

impl<'a> BoundsAnalysis<'a> {
    /// Creates the analysis over `graph`.
    #[must_use]
    pub fn new(graph: &'a Graph) -> BoundsAnalysis<'a> {
        BoundsAnalysis { graph }
    }

    /// Runs the pass and returns the collected facts.
    #[must_use]
    pub fn run(self) -> BoundsRangeInfo {
        let mut info = BoundsRangeInfo::new();
        for block in self.graph.reverse_postorder() {
            for &phi in self.graph.block(block).phis() {
                self.visit_phi(&mut info, block, phi);
            }
            if let Some(term) = self.graph.terminator_of(block) {
                if self.graph.inst(term).opcode() == Opcode::IfImm {
                    self.visit_if_imm(&mut info, block, term);
                }
            }
        }
        info
    }

    /// Merges the per-predecessor ranges of a phi's inputs.
    fn visit_phi(&self, info: &mut BoundsRangeInfo, block: BlockId, phi: InstId) {
        let ty = self.graph.inst(phi).ty();
        if ty.is_float() || ty.is_reference() || ty == DataType::U64 {
            return;
        }

        let preds = self.graph.block(block).preds();
        let mut ranges = Vec::with_capacity(preds.len());
        for (index, &pred) in preds.iter().enumerate() {
            let input = self.graph.inst(phi).input(index);
            ranges.push(info.find_bounds_range(self.graph, pred, input));
        }

        if let Some(merged) = BoundsRange::union_of(&ranges) {
            info.set_bounds_range(self.graph, block, phi, merged.fit_in(ty));
        }
    }

    /// Turns a branch over a compare into per-edge range facts.
    fn visit_if_imm(&self, info: &mut BoundsRangeInfo, block: BlockId, branch: InstId) {
        let graph = self.graph;
        let branch = graph.inst(branch);
        if branch.operands_ty() != DataType::Bool || branch.imm() != 0 {
            return;
        }
        let cmp = graph.inst(branch.input(0));
        if cmp.opcode() != Opcode::Compare {
            return;
        }
        // Unsigned 64-bit ranges do not fit the signed i64 bound
        // representation.
        if cmp.operands_ty() == DataType::U64 {
            return;
        }
        let (lhs, rhs) = (cmp.input(0), cmp.input(1));
        if !graph.inst(lhs).ty().is_range_tracked()
            || !graph.inst(rhs).ty().is_range_tracked()
            || graph.inst(lhs).ty() == DataType::U64
            || graph.inst(rhs).ty() == DataType::U64
        {
            return;
        }

        let bb = graph.block(block);
        // `IfImm(cmp != 0)` takes the true edge when the compare holds;
        // `IfImm(cmp == 0)` takes it when the compare fails.
        let (when_true, when_false) = match branch.cc() {
            ConditionCode::Ne => (bb.true_successor(), bb.false_successor()),
            ConditionCode::Eq => (bb.false_successor(), bb.true_successor()),
            _ => return,
        };

        let code = cmp.cc();
        self.narrow_into(info, block, when_true, code, lhs, rhs);
        self.narrow_into(info, block, when_false, code.invert(), lhs, rhs);
    }

    /// Sharpens both compare operands along the edge `block -> target`, given
    /// that `lhs <code> rhs` holds on it.
    fn narrow_into(
        &self,
        info: &mut BoundsRangeInfo,
        block: BlockId,
        target: BlockId,
        code: ConditionCode,
        lhs: InstId,
        rhs: InstId,
    ) {
        if !self.is_narrowing_target(block, target) {
            return;
        }
        let graph = self.graph;
        let lhs_range = info.find_bounds_range(graph, block, lhs);
        let rhs_range = info.find_bounds_range(graph, block, rhs);

        let narrowed = if code == ConditionCode::Ne {
            Some(BoundsRange::narrow_by_ne(lhs_range, rhs_range))
        } else {
            BoundsRange::try_narrow(code, lhs_range, rhs_range)
        };
        let Some((mut new_lhs, mut new_rhs)) = narrowed else {
            log::debug!(
                "{lhs} {code} {rhs} cannot hold, edge {block} -> {target} is never taken"
            );
            return;
        };

        // A compare against an array length pins that length to the narrowed
        // range of the other operand.
        if graph.inst(rhs).opcode() == Opcode::LenArray {
            new_lhs = new_lhs.with_len_array(Some(rhs));
        }
        if graph.inst(lhs).opcode() == Opcode::LenArray {
            new_rhs = new_rhs.with_len_array(Some(lhs));
        }

        info.set_bounds_range(graph, target, lhs, new_lhs.fit_in(graph.inst(lhs).ty()));
        info.set_bounds_range(graph, target, rhs, new_rhs.fit_in(graph.inst(rhs).ty()));
    }

    /// Whether facts proven on the edge `block -> target` may be stored at
    /// `target`.
    ///
    /// True when the edge is the target's only entry. A loop header with one
    /// extra predecessor also qualifies if that predecessor is the loop's
    /// single latch: values flowing around the back edge pass through the
    /// header's phis, so the edge fact still holds for non-phi values.
    fn is_narrowing_target(&self, block: BlockId, target: BlockId) -> bool {
        let preds = self.graph.block(target).preds();
        if preds == [block] {
            return true;
        }
        let Some(lp) = self.graph.loops().innermost_loop_of(target) else {
            return false;
        };
        if lp.header() != target || lp.back_edges().len() != 1 || preds.len() != 2 {
            return false;
        }
        let latch = lp.back_edges()[0];
        (preds[0] == block && preds[1] == latch) || (preds[0] == latch && preds[1] == block)
    }
}

#[cfg(test)]
mod tests {
    use super::BoundsAnalysis;
    use crate::analysis::bounds::BoundsRange;
    use crate::ir::{BlockId, ConditionCode, DataType, Graph, InstId};

    /// Appends `Compare(code, lhs, rhs)` and `IfImm(branch_code, 0)` over it.
    fn compare_branch(
        graph: &mut Graph,
        block: BlockId,
        code: ConditionCode,
        branch_code: ConditionCode,
        operands_ty: DataType,
        lhs: InstId,
        rhs: InstId,
    ) {
        let cmp = graph.new_compare(code, operands_ty, lhs, rhs);
        graph.append_inst(block, cmp);
        let branch = graph.new_if_imm(branch_code, 0, DataType::Bool, cmp);
        graph.append_inst(block, branch);
    }

    #[test]
    fn test_compare_narrows_both_edges() {
        let mut graph = Graph::new();
        let fork = graph.create_block();
        let (below, above) = (graph.create_block(), graph.create_block());
        graph.connect(graph.entry(), fork);
        graph.connect(fork, below);
        graph.connect(fork, above);

        let param = graph.new_parameter(DataType::I32);
        let five = graph.find_or_create_constant(5);
        compare_branch(
            &mut graph,
            fork,
            ConditionCode::Lt,
            ConditionCode::Ne,
            DataType::I32,
            param,
            five,
        );

        let info = BoundsAnalysis::new(&graph).run();
        assert_eq!(
            info.find_bounds_range(&graph, below, param),
            BoundsRange::of(i64::from(i32::MIN), 4)
        );
        assert_eq!(
            info.find_bounds_range(&graph, above, param),
            BoundsRange::of(5, i64::from(i32::MAX))
        );
        // Above the branch nothing is known.
        assert!(info
            .find_bounds_range(&graph, fork, param)
            .is_max_range(DataType::I32));
    }

    #[test]
    fn test_branch_on_compare_being_false_swaps_the_edges() {
        let mut graph = Graph::new();
        let fork = graph.create_block();
        let (taken, fallthrough) = (graph.create_block(), graph.create_block());
        graph.connect(graph.entry(), fork);
        graph.connect(fork, taken);
        graph.connect(fork, fallthrough);

        let param = graph.new_parameter(DataType::I32);
        let five = graph.find_or_create_constant(5);
        compare_branch(
            &mut graph,
            fork,
            ConditionCode::Lt,
            ConditionCode::Eq,
            DataType::I32,
            param,
            five,
        );

        let info = BoundsAnalysis::new(&graph).run();
        // The true edge is taken when the compare is false.
        assert_eq!(info.find_bounds_range(&graph, taken, param).left(), 5);
        assert_eq!(info.find_bounds_range(&graph, fallthrough, param).right(), 4);
    }

    #[test]
    fn test_phi_merges_predecessor_ranges() {
        let mut graph = Graph::new();
        let fork = graph.create_block();
        let (left, right, join) = (
            graph.create_block(),
            graph.create_block(),
            graph.create_block(),
        );
        graph.connect(graph.entry(), fork);
        graph.connect(fork, left);
        graph.connect(fork, right);
        graph.connect(left, join);
        graph.connect(right, join);

        let param = graph.new_parameter(DataType::I32);
        let zero = graph.find_or_create_constant(0);
        let nine = graph.find_or_create_constant(9);
        compare_branch(
            &mut graph,
            fork,
            ConditionCode::Lt,
            ConditionCode::Ne,
            DataType::I32,
            param,
            zero,
        );

        let phi = graph.new_phi(DataType::I32);
        graph.append_phi(join, phi);
        graph.add_input(phi, zero);
        graph.add_input(phi, nine);

        let info = BoundsAnalysis::new(&graph).run();
        assert_eq!(info.find_bounds_range(&graph, join, phi), BoundsRange::of(0, 9));
    }

    #[test]
    fn test_join_with_two_plain_predecessors_gets_no_facts() {
        let mut graph = Graph::new();
        let fork = graph.create_block();
        let join = graph.create_block();
        graph.connect(graph.entry(), fork);
        graph.connect(fork, join);
        graph.connect(fork, join);

        let param = graph.new_parameter(DataType::I32);
        let five = graph.find_or_create_constant(5);
        compare_branch(
            &mut graph,
            fork,
            ConditionCode::Lt,
            ConditionCode::Ne,
            DataType::I32,
            param,
            five,
        );

        let info = BoundsAnalysis::new(&graph).run();
        assert!(info.is_empty());
    }

    #[test]
    fn test_loop_header_accepts_facts_from_its_forward_edge() {
        let mut graph = Graph::new();
        let guard = graph.create_block();
        let (header, latch, done) = (
            graph.create_block(),
            graph.create_block(),
            graph.create_block(),
        );
        graph.connect(graph.entry(), guard);
        graph.connect(guard, header);
        graph.connect(guard, done);
        graph.connect(header, latch);
        graph.connect(latch, header);

        let param = graph.new_parameter(DataType::I32);
        let ten = graph.find_or_create_constant(10);
        compare_branch(
            &mut graph,
            guard,
            ConditionCode::Lt,
            ConditionCode::Ne,
            DataType::I32,
            param,
            ten,
        );

        let info = BoundsAnalysis::new(&graph).run();
        assert_eq!(info.find_bounds_range(&graph, header, param).right(), 9);
    }

    #[test]
    fn test_unsigned_64_bit_compares_are_skipped() {
        let mut graph = Graph::new();
        let fork = graph.create_block();
        let (a, b) = (graph.create_block(), graph.create_block());
        graph.connect(graph.entry(), fork);
        graph.connect(fork, a);
        graph.connect(fork, b);

        let param = graph.new_parameter(DataType::U64);
        let five = graph.find_or_create_constant(5);
        compare_branch(
            &mut graph,
            fork,
            ConditionCode::B,
            ConditionCode::Ne,
            DataType::U64,
            param,
            five,
        );

        let info = BoundsAnalysis::new(&graph).run();
        assert!(info.is_empty());
    }

    #[test]
    fn test_contradicted_edge_stores_nothing() {
        let mut graph = Graph::new();
        let fork = graph.create_block();
        let (dead, live) = (graph.create_block(), graph.create_block());
        graph.connect(graph.entry(), fork);
        graph.connect(fork, dead);
        graph.connect(fork, live);

        let three = graph.find_or_create_constant(3);
        let seven = graph.find_or_create_constant(7);
        // 7 < 3 never holds, so the true edge carries no facts at all.
        compare_branch(
            &mut graph,
            fork,
            ConditionCode::Lt,
            ConditionCode::Ne,
            DataType::I32,
            seven,
            three,
        );

        let info = BoundsAnalysis::new(&graph).run();
        assert_eq!(info.find_bounds_range(&graph, dead, seven), BoundsRange::point(7));
        // The false edge still learns the (trivially true) inversion.
        assert_eq!(info.find_bounds_range(&graph, live, seven), BoundsRange::point(7));
    }
}
