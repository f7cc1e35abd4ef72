//! Flow-sensitive storage for proven value ranges.

use std::collections::HashMap;

use crate::analysis::bounds::BoundsRange;
use crate::ir::{BlockId, DataType, Graph, InstId, Opcode};

/// Value ranges proven per `(block, instruction)` pair.
///
/// The table is sparse: only ranges sharper than the type-maximal default are
/// stored, everything else is reconstructed on lookup. A fact keyed at a block
/// holds in that block and in every block it dominates, so
/// [`find_bounds_range`](BoundsRangeInfo::find_bounds_range) walks the
/// dominator chain from the query block upwards and the nearest stored fact
/// wins.
#[derive(Debug, Default)]
pub struct BoundsRangeInfo {
    ranges: HashMap<(BlockId, InstId), BoundsRange>,
}

impl BoundsRangeInfo {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> BoundsRangeInfo {
        BoundsRangeInfo::default()
    }

    /// The range of `inst` as observed at `block`.
    ///
    /// Lookup order: known-not-null references and the null literal answer
    /// immediately, then the dominator chain of `block` is searched for a
    /// stored fact, then opcode defaults apply (array lengths are
    /// `[0, i32::MAX]`, constants are points) and finally the full domain of
    /// the instruction's type.
    ///
    /// # Panics
    ///
    /// Panics if the instruction's type has no integral domain (floats, void).
    #[must_use]
    pub fn find_bounds_range(&self, graph: &Graph, block: BlockId, inst: InstId) -> BoundsRange {
        let def = graph.inst(inst);
        let ty = def.ty();
        assert!(ty.is_range_tracked(), "no range domain for {ty:?}");

        if def.opcode() == Opcode::NullPtr {
            return BoundsRange::point(0);
        }
        if ty.is_reference() && is_not_null(graph, block, inst) {
            return BoundsRange::of(1, DataType::Ref.max_value());
        }

        for holder in graph.dominators().dominators(block) {
            if let Some(range) = self.ranges.get(&(holder, inst)) {
                return *range;
            }
        }

        // Defaults when no block-sensitive fact exists.
        if def.opcode() == Opcode::LenArray {
            return BoundsRange::of(0, DataType::I32.max_value());
        }
        if def.is_const() {
            return BoundsRange::point(def.imm());
        }
        BoundsRange::new(ty)
    }

    /// Records `range` for `inst` at `block`.
    ///
    /// Constants are pinned to their literal value regardless of the incoming
    /// range, keeping only its array-length provenance. Type-maximal ranges are
    /// not stored; lookup already produces them.
    pub fn set_bounds_range(
        &mut self,
        graph: &Graph,
        block: BlockId,
        inst: InstId,
        range: BoundsRange,
    ) {
        let def = graph.inst(inst);
        let range = if def.is_const() {
            BoundsRange::point(def.imm()).with_len_array(range.len_array())
        } else {
            range
        };
        if range.is_max_range(def.ty()) {
            return;
        }
        self.ranges.insert((block, inst), range);
    }

    /// Number of stored facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no facts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Whether `inst` is known to be non-null when observed at `block`: it either
/// allocates, is itself a null check, or has a null-check user in a block
/// dominating `block`.
fn is_not_null(graph: &Graph, block: BlockId, inst: InstId) -> bool {
    let def = graph.inst(inst);
    if def.opcode().is_allocation() || def.opcode() == Opcode::NullCheck {
        return true;
    }
    def.users().iter().any(|&user| {
        let user = graph.inst(user);
        user.opcode() == Opcode::NullCheck
            && user
                .block()
                .is_some_and(|guard| graph.dominators().dominates(guard, block))
    })
}

#[cfg(test)]
mod tests {
    use super::BoundsRangeInfo;
    use crate::analysis::bounds::BoundsRange;
    use crate::ir::{BlockId, DataType, Graph};

    /// entry -> a -> b -> c, with an I32 parameter.
    fn chain() -> (Graph, BlockId, BlockId, BlockId) {
        let mut graph = Graph::new();
        let (a, b, c) = (
            graph.create_block(),
            graph.create_block(),
            graph.create_block(),
        );
        graph.connect(graph.entry(), a);
        graph.connect(a, b);
        graph.connect(b, c);
        (graph, a, b, c)
    }

    #[test]
    fn test_lookup_walks_the_dominator_chain() {
        let (mut graph, a, b, c) = chain();
        let param = graph.new_parameter(DataType::I32);

        let mut info = BoundsRangeInfo::new();
        info.set_bounds_range(&graph, a, param, BoundsRange::of(0, 100));

        assert_eq!(info.find_bounds_range(&graph, a, param), BoundsRange::of(0, 100));
        assert_eq!(info.find_bounds_range(&graph, c, param), BoundsRange::of(0, 100));
        // Outside the dominated region the fact does not apply.
        assert!(info
            .find_bounds_range(&graph, graph.entry(), param)
            .is_max_range(DataType::I32));

        // A sharper fact further down the chain shadows the outer one.
        info.set_bounds_range(&graph, b, param, BoundsRange::of(10, 20));
        assert_eq!(info.find_bounds_range(&graph, c, param), BoundsRange::of(10, 20));
        assert_eq!(info.find_bounds_range(&graph, a, param), BoundsRange::of(0, 100));
    }

    #[test]
    fn test_constants_default_to_points() {
        let (mut graph, a, ..) = chain();
        let five = graph.find_or_create_constant(5);
        let info = BoundsRangeInfo::new();
        assert_eq!(info.find_bounds_range(&graph, a, five), BoundsRange::point(5));
    }

    #[test]
    fn test_stored_constant_ranges_are_pinned_to_the_literal() {
        let (mut graph, a, ..) = chain();
        let five = graph.find_or_create_constant(5);
        let param = graph.new_parameter(DataType::Ref);
        let len = graph.new_len_array(param);
        graph.append_inst(a, len);

        let mut info = BoundsRangeInfo::new();
        info.set_bounds_range(
            &graph,
            a,
            five,
            BoundsRange::of(0, 10).with_len_array(Some(len)),
        );

        let found = info.find_bounds_range(&graph, a, five);
        assert_eq!((found.left(), found.right()), (5, 5));
        assert_eq!(found.len_array(), Some(len));
    }

    #[test]
    fn test_type_maximal_ranges_are_not_stored() {
        let (mut graph, a, ..) = chain();
        let param = graph.new_parameter(DataType::I32);
        let mut info = BoundsRangeInfo::new();
        info.set_bounds_range(&graph, a, param, BoundsRange::new(DataType::I32));
        assert!(info.is_empty());
    }

    #[test]
    fn test_null_literal_is_the_zero_point() {
        let (mut graph, a, ..) = chain();
        let null = graph.null_ptr();
        let info = BoundsRangeInfo::new();
        assert_eq!(info.find_bounds_range(&graph, a, null), BoundsRange::point(0));
    }

    #[test]
    fn test_allocations_are_not_null() {
        let (mut graph, a, ..) = chain();
        let ten = graph.find_or_create_constant(10);
        let array = graph.new_new_array(ten);
        graph.append_inst(a, array);
        let info = BoundsRangeInfo::new();
        let range = info.find_bounds_range(&graph, a, array);
        assert_eq!(range.left(), 1);
        assert!(range.is_not_negative());
    }

    #[test]
    fn test_null_checked_reference_is_not_null_below_the_check() {
        let (mut graph, a, b, c) = chain();
        let param = graph.new_parameter(DataType::Ref);
        let check = graph.new_null_check(param);
        graph.append_inst(b, check);

        let info = BoundsRangeInfo::new();
        // At and below the checking block the reference is non-null.
        assert_eq!(info.find_bounds_range(&graph, b, param).left(), 1);
        assert_eq!(info.find_bounds_range(&graph, c, param).left(), 1);
        // Above it nothing is known.
        assert_eq!(info.find_bounds_range(&graph, a, param).left(), 0);
    }

    #[test]
    fn test_array_length_defaults_to_the_index_domain() {
        let (mut graph, a, ..) = chain();
        let param = graph.new_parameter(DataType::Ref);
        let len = graph.new_len_array(param);
        graph.append_inst(a, len);

        let info = BoundsRangeInfo::new();
        let range = info.find_bounds_range(&graph, a, len);
        assert_eq!(range.left(), 0);
        assert_eq!(range.right(), i64::from(i32::MAX));
    }

    #[test]
    fn test_stored_facts_shadow_the_length_default() {
        let (mut graph, a, b, _) = chain();
        let param = graph.new_parameter(DataType::Ref);
        let len = graph.new_len_array(param);
        graph.append_inst(a, len);

        let mut info = BoundsRangeInfo::new();
        info.set_bounds_range(&graph, b, len, BoundsRange::of(1, 16));
        assert_eq!(info.find_bounds_range(&graph, b, len), BoundsRange::of(1, 16));
        assert_eq!(info.find_bounds_range(&graph, a, len).right(), i64::from(i32::MAX));
    }

    #[test]
    #[should_panic(expected = "no range domain")]
    fn test_float_lookup_is_rejected() {
        let (mut graph, a, ..) = chain();
        let param = graph.new_parameter(DataType::F64);
        let info = BoundsRangeInfo::new();
        let _ = info.find_bounds_range(&graph, a, param);
    }
}
