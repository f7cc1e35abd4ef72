//! The method graph: instruction arena, basic blocks, traversals and the mutation
//! API used by the optimization passes.
//!
//! Blocks and instructions are arena-allocated and addressed by [`BlockId`] /
//! [`InstId`]. Removing a block tombstones its slot; instructions are never
//! deallocated, only unlinked (an unlinked instruction has `block() == None` and no
//! users). Derived analyses (dominator tree, natural loops, bounds facts) are cached
//! on the graph and computed lazily on first access; any control-flow mutation
//! resets the affected caches.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::analysis::bounds::{BoundsAnalysis, BoundsRangeInfo};
use crate::analysis::dominators::{compute_dominators, DominatorTree};
use crate::analysis::loops::{compute_loops, LoopInfo};
use crate::ir::{
    BasicBlock, BlockFlags, BlockId, ConditionCode, DataType, Inst, InstId, OpProps, Opcode,
    Target,
};
use crate::Result;

/// Lazily computed per-graph analyses.
///
/// Dominators and loops are purely structural and reset on any CFG edit; the bounds
/// facts additionally reset when a pass rewrites value-producing instructions.
#[derive(Debug, Default)]
struct AnalysisCache {
    dominators: OnceLock<DominatorTree>,
    loops: OnceLock<LoopInfo>,
    bounds: OnceLock<BoundsRangeInfo>,
}

impl AnalysisCache {
    fn invalidate_cfg(&mut self) {
        self.dominators = OnceLock::new();
        self.loops = OnceLock::new();
        self.bounds = OnceLock::new();
    }

    fn invalidate_bounds(&mut self) {
        self.bounds = OnceLock::new();
    }
}

/// An SSA method graph.
///
/// Owns all blocks and instructions. The entry block holds parameters and the
/// constant pool; the exit block is the target of every return.
///
/// # Examples
///
/// ```rust
/// use optir::ir::{DataType, Graph};
///
/// let mut graph = Graph::new();
/// let param = graph.new_parameter(DataType::I32);
/// let ten = graph.find_or_create_constant(10);
/// let ret = graph.new_return(DataType::I32, param);
/// let bb = graph.create_block();
/// graph.connect(graph.entry(), bb);
/// graph.append_inst(bb, ret);
/// graph.connect(bb, graph.exit());
/// assert_eq!(graph.block_count(), 3);
/// # let _ = ten;
/// ```
#[derive(Debug)]
pub struct Graph {
    insts: Vec<Inst>,
    blocks: Vec<Option<BasicBlock>>,
    entry: BlockId,
    exit: BlockId,
    constants: HashMap<i64, InstId>,
    null_ptr: Option<InstId>,
    target: Target,
    analyses: AnalysisCache,
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

impl Graph {
    /// Creates an empty graph with fresh entry and exit blocks.
    #[must_use]
    pub fn new() -> Graph {
        Graph::with_target(Target)
    }

    /// Creates an empty graph compiling for the given target.
    #[must_use]
    pub fn with_target(target: Target) -> Graph {
        let mut graph = Graph {
            insts: Vec::new(),
            blocks: Vec::new(),
            entry: BlockId::new(0),
            exit: BlockId::new(0),
            constants: HashMap::new(),
            null_ptr: None,
            target,
            analyses: AnalysisCache::default(),
        };
        graph.entry = graph.create_block();
        graph.exit = graph.create_block();
        graph
    }

    /// The entry block. Parameters and constants live here.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// The exit block. Return blocks have it as their sole successor.
    #[must_use]
    pub fn exit(&self) -> BlockId {
        self.exit
    }

    /// The immediate-encoding oracle this graph compiles against.
    #[must_use]
    pub fn target(&self) -> Target {
        self.target
    }

    // ------------------------------------------------------------------
    // Arena access
    // ------------------------------------------------------------------

    /// Number of live (non-removed) blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    /// Total number of instructions ever created in this graph, including
    /// unlinked ones.
    #[must_use]
    pub fn inst_count(&self) -> usize {
        self.insts.len()
    }

    /// Upper bound (exclusive) of block arena indices, for dense side tables.
    #[must_use]
    pub fn block_arena_len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the id names a live block.
    #[must_use]
    pub fn is_live_block(&self, id: BlockId) -> bool {
        self.blocks
            .get(id.index())
            .is_some_and(|slot| slot.is_some())
    }

    /// The block with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range or the block was removed.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        match self.blocks[id.index()].as_ref() {
            Some(block) => block,
            None => panic!("access to removed block {id}"),
        }
    }

    fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        match self.blocks[id.index()].as_mut() {
            Some(block) => block,
            None => panic!("access to removed block {id}"),
        }
    }

    /// The block with the given id, or an error for stale/unknown ids.
    pub fn try_block(&self, id: BlockId) -> Result<&BasicBlock> {
        self.blocks
            .get(id.index())
            .and_then(|slot| slot.as_ref())
            .ok_or(crate::Error::BlockNotFound(id))
    }

    /// Iterator over the ids of all live blocks in arena order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| BlockId::new(i)))
    }

    /// The instruction with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range.
    #[must_use]
    pub fn inst(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }

    /// The instruction with the given id, or an error for unknown ids.
    pub fn try_inst(&self, id: InstId) -> Result<&Inst> {
        self.insts
            .get(id.index())
            .ok_or(crate::Error::InstNotFound(id))
    }

    pub(crate) fn inst_mut(&mut self, id: InstId) -> &mut Inst {
        &mut self.insts[id.index()]
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Creates a new empty block and returns its id.
    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(Some(BasicBlock::new(id)));
        self.analyses.invalidate_cfg();
        id
    }

    /// Marks a block as belonging to a try region.
    pub fn set_try(&mut self, block: BlockId, is_try: bool) {
        let flags = if is_try {
            BlockFlags::TRY
        } else {
            BlockFlags::empty()
        };
        self.block_mut(block).set_flags(flags);
    }

    fn new_inst(&mut self, opcode: Opcode, ty: DataType, inputs: &[InstId]) -> InstId {
        let id = InstId::new(self.insts.len());
        self.insts.push(Inst::new(id, opcode, ty));
        for &input in inputs {
            self.add_input(id, input);
        }
        id
    }

    /// Creates a method parameter in the entry block.
    pub fn new_parameter(&mut self, ty: DataType) -> InstId {
        let id = self.new_inst(Opcode::Parameter, ty, &[]);
        self.append_inst(self.entry, id);
        id
    }

    /// Returns the pooled `I64` constant with the given value, creating it in the
    /// entry block on first use.
    pub fn find_or_create_constant(&mut self, value: i64) -> InstId {
        if let Some(&id) = self.constants.get(&value) {
            return id;
        }
        let id = self.new_inst(Opcode::Constant, DataType::I64, &[]);
        self.inst_mut(id).set_imm(value);
        self.append_inst(self.entry, id);
        self.constants.insert(value, id);
        id
    }

    /// Returns the null-reference literal, creating it in the entry block on first
    /// use.
    pub fn null_ptr(&mut self) -> InstId {
        if let Some(id) = self.null_ptr {
            return id;
        }
        let id = self.new_inst(Opcode::NullPtr, DataType::Ref, &[]);
        self.append_inst(self.entry, id);
        self.null_ptr = Some(id);
        id
    }

    /// Creates a `Compare` producing `Bool`.
    pub fn new_compare(
        &mut self,
        cc: ConditionCode,
        operands_ty: DataType,
        lhs: InstId,
        rhs: InstId,
    ) -> InstId {
        let id = self.new_inst(Opcode::Compare, DataType::Bool, &[lhs, rhs]);
        let inst = self.inst_mut(id);
        inst.set_cc(cc);
        inst.set_operands_ty(operands_ty);
        id
    }

    /// Creates an `IfImm` branch testing `input <cc> imm`.
    pub fn new_if_imm(
        &mut self,
        cc: ConditionCode,
        imm: i64,
        operands_ty: DataType,
        input: InstId,
    ) -> InstId {
        let id = self.new_inst(Opcode::IfImm, DataType::Void, &[input]);
        let inst = self.inst_mut(id);
        inst.set_cc(cc);
        inst.set_imm(imm);
        inst.set_operands_ty(operands_ty);
        id
    }

    /// Creates a two-operand `If` branch.
    pub fn new_if(
        &mut self,
        cc: ConditionCode,
        operands_ty: DataType,
        lhs: InstId,
        rhs: InstId,
    ) -> InstId {
        let id = self.new_inst(Opcode::If, DataType::Void, &[lhs, rhs]);
        let inst = self.inst_mut(id);
        inst.set_cc(cc);
        inst.set_operands_ty(operands_ty);
        id
    }

    /// Creates a `Select` choosing `v_true` when `cmp_lhs <cc> cmp_rhs` holds.
    pub fn new_select(
        &mut self,
        ty: DataType,
        cc: ConditionCode,
        operands_ty: DataType,
        v_true: InstId,
        v_false: InstId,
        cmp_lhs: InstId,
        cmp_rhs: InstId,
    ) -> InstId {
        let id = self.new_inst(Opcode::Select, ty, &[v_true, v_false, cmp_lhs, cmp_rhs]);
        let inst = self.inst_mut(id);
        inst.set_cc(cc);
        inst.set_operands_ty(operands_ty);
        id
    }

    /// Creates a `SelectImm` choosing `v_true` when `cond <cc> imm` holds.
    pub fn new_select_imm(
        &mut self,
        ty: DataType,
        cc: ConditionCode,
        imm: i64,
        operands_ty: DataType,
        v_true: InstId,
        v_false: InstId,
        cond: InstId,
    ) -> InstId {
        let id = self.new_inst(Opcode::SelectImm, ty, &[v_true, v_false, cond]);
        let inst = self.inst_mut(id);
        inst.set_cc(cc);
        inst.set_imm(imm);
        inst.set_operands_ty(operands_ty);
        id
    }

    /// Creates a two-operand ALU instruction.
    pub fn new_binary(&mut self, opcode: Opcode, ty: DataType, lhs: InstId, rhs: InstId) -> InstId {
        debug_assert!(
            opcode.imm_form().is_some() || matches!(opcode, Opcode::Mul | Opcode::Div | Opcode::Mod),
            "{opcode:?} is not a binary ALU opcode"
        );
        self.new_inst(opcode, ty, &[lhs, rhs])
    }

    /// Creates an ALU instruction with an immediate second operand.
    pub fn new_binary_imm(&mut self, opcode: Opcode, ty: DataType, lhs: InstId, imm: i64) -> InstId {
        debug_assert!(opcode.props().contains(OpProps::HAS_IMM));
        let id = self.new_inst(opcode, ty, &[lhs]);
        self.inst_mut(id).set_imm(imm);
        id
    }

    /// Creates a one-operand ALU instruction (`Neg`, `Not`).
    pub fn new_unary(&mut self, opcode: Opcode, ty: DataType, input: InstId) -> InstId {
        debug_assert!(matches!(opcode, Opcode::Neg | Opcode::Not));
        self.new_inst(opcode, ty, &[input])
    }

    /// Creates a phi. Inputs are added afterwards, one per predecessor in
    /// predecessor order.
    pub fn new_phi(&mut self, ty: DataType) -> InstId {
        self.new_inst(Opcode::Phi, ty, &[])
    }

    /// Creates a `Return` of a value.
    pub fn new_return(&mut self, ty: DataType, value: InstId) -> InstId {
        self.new_inst(Opcode::Return, ty, &[value])
    }

    /// Creates a `ReturnVoid`.
    pub fn new_return_void(&mut self) -> InstId {
        self.new_inst(Opcode::ReturnVoid, DataType::Void, &[])
    }

    /// Creates a `ReturnI` returning an immediate.
    pub fn new_return_imm(&mut self, ty: DataType, imm: i64) -> InstId {
        let id = self.new_inst(Opcode::ReturnI, ty, &[]);
        self.inst_mut(id).set_imm(imm);
        id
    }

    /// Creates a static call.
    pub fn new_call(&mut self, ty: DataType, args: &[InstId]) -> InstId {
        self.new_inst(Opcode::CallStatic, ty, args)
    }

    /// Creates a null guard over a reference.
    pub fn new_null_check(&mut self, object: InstId) -> InstId {
        self.new_inst(Opcode::NullCheck, DataType::Ref, &[object])
    }

    /// Creates an array-length read.
    pub fn new_len_array(&mut self, array: InstId) -> InstId {
        self.new_inst(Opcode::LenArray, DataType::I32, &[array])
    }

    /// Creates an array allocation.
    pub fn new_new_array(&mut self, length: InstId) -> InstId {
        self.new_inst(Opcode::NewArray, DataType::Ref, &[length])
    }

    /// Creates an object allocation.
    pub fn new_new_object(&mut self) -> InstId {
        self.new_inst(Opcode::NewObject, DataType::Ref, &[])
    }

    // ------------------------------------------------------------------
    // Def-use maintenance
    // ------------------------------------------------------------------

    /// Appends `input` to `user`'s operand list and records the use.
    pub fn add_input(&mut self, user: InstId, input: InstId) {
        self.inst_mut(user).inputs_mut().push(input);
        self.inst_mut(input).users_mut().push(user);
    }

    /// Replaces `user`'s operand at `index`, keeping user lists consistent.
    pub fn set_input(&mut self, user: InstId, index: usize, new_input: InstId) {
        let old = self.inst(user).input(index);
        if old == new_input {
            return;
        }
        remove_one(self.inst_mut(old).users_mut(), user);
        self.inst_mut(user).inputs_mut()[index] = new_input;
        self.inst_mut(new_input).users_mut().push(user);
    }

    /// Rewrites every use of `old` to `new`.
    pub fn replace_users(&mut self, old: InstId, new: InstId) {
        debug_assert_ne!(old, new);
        let users = std::mem::take(self.inst_mut(old).users_mut());
        for user in users {
            let inputs = self.inst_mut(user).inputs_mut();
            let mut replaced = 0usize;
            for slot in inputs.iter_mut() {
                if *slot == old {
                    *slot = new;
                    replaced += 1;
                }
            }
            // The drained list holds one entry per use; later duplicates find
            // nothing left to replace.
            for _ in 0..replaced {
                self.inst_mut(new).users_mut().push(user);
            }
        }
    }

    // ------------------------------------------------------------------
    // Block membership
    // ------------------------------------------------------------------

    /// Appends an instruction at the end of a block.
    pub fn append_inst(&mut self, block: BlockId, inst: InstId) {
        debug_assert!(self.inst(inst).block().is_none());
        debug_assert!(self.inst(inst).opcode() != Opcode::Phi);
        self.block_mut(block).insts_mut().push(inst);
        self.inst_mut(inst).set_block(Some(block));
    }

    /// Appends a phi to a block's phi list.
    pub fn append_phi(&mut self, block: BlockId, phi: InstId) {
        debug_assert!(self.inst(phi).block().is_none());
        debug_assert!(self.inst(phi).opcode() == Opcode::Phi);
        self.block_mut(block).phis_mut().push(phi);
        self.inst_mut(phi).set_block(Some(block));
    }

    /// Inserts `inst` immediately before `anchor` in `anchor`'s block.
    ///
    /// # Panics
    ///
    /// Panics if `anchor` is not placed in a block.
    pub fn insert_before(&mut self, inst: InstId, anchor: InstId) {
        let block = match self.inst(anchor).block() {
            Some(block) => block,
            None => panic!("anchor {anchor} is not placed in a block"),
        };
        debug_assert!(self.inst(inst).block().is_none());
        let insts = self.block_mut(block).insts_mut();
        let pos = insts
            .iter()
            .position(|&i| i == anchor)
            .unwrap_or(insts.len());
        insts.insert(pos, inst);
        self.inst_mut(inst).set_block(Some(block));
    }

    /// Removes an instruction from its block and releases its operand links.
    ///
    /// The instruction must have no remaining users.
    pub fn remove_inst(&mut self, inst: InstId) {
        debug_assert!(!self.inst(inst).has_users(), "{inst} still has users");
        let inputs = std::mem::take(self.inst_mut(inst).inputs_mut());
        for input in inputs {
            remove_one(self.inst_mut(input).users_mut(), inst);
        }
        if let Some(block) = self.inst(inst).block() {
            let is_phi = self.inst(inst).opcode() == Opcode::Phi;
            let bb = self.block_mut(block);
            if is_phi {
                bb.phis_mut().retain(|&i| i != inst);
            } else {
                bb.insts_mut().retain(|&i| i != inst);
            }
        }
        self.inst_mut(inst).set_block(None);
    }

    /// Moves an instruction to the end of another block.
    pub fn move_inst(&mut self, inst: InstId, to: BlockId) {
        if let Some(block) = self.inst(inst).block() {
            self.block_mut(block).insts_mut().retain(|&i| i != inst);
        }
        self.block_mut(to).insts_mut().push(inst);
        self.inst_mut(inst).set_block(Some(to));
    }

    /// Replaces `old` with `new` at `old`'s position in its block. `old` is
    /// unlinked and must have no users.
    pub fn replace_inst(&mut self, old: InstId, new: InstId) {
        debug_assert!(!self.inst(old).has_users());
        let block = match self.inst(old).block() {
            Some(block) => block,
            None => panic!("{old} is not placed in a block"),
        };
        debug_assert!(self.inst(new).block().is_none());
        {
            let insts = self.block_mut(block).insts_mut();
            if let Some(pos) = insts.iter().position(|&i| i == old) {
                insts[pos] = new;
            } else {
                insts.push(new);
            }
        }
        self.inst_mut(new).set_block(Some(block));
        self.inst_mut(old).set_block(None);
        let inputs = std::mem::take(self.inst_mut(old).inputs_mut());
        for input in inputs {
            remove_one(self.inst_mut(input).users_mut(), old);
        }
    }

    /// The block's terminating branch/return, if its last instruction is one.
    #[must_use]
    pub fn terminator_of(&self, block: BlockId) -> Option<InstId> {
        let last = *self.block(block).insts().last()?;
        self.inst(last).opcode().is_terminator().then_some(last)
    }

    /// The phi input flowing in over the edge from `pred`.
    pub fn phi_input_of(&self, phi: InstId, pred: BlockId) -> Result<InstId> {
        let inst = self.try_inst(phi)?;
        debug_assert!(inst.opcode() == Opcode::Phi);
        let block = match inst.block() {
            Some(block) => block,
            None => return Err(graph_error!("phi {} is not placed in a block", phi)),
        };
        let index = self
            .try_block(block)?
            .pred_index(pred)
            .ok_or_else(|| graph_error!("{} is not a predecessor of {}", pred, block))?;
        inst.inputs()
            .get(index)
            .copied()
            .ok_or_else(|| graph_error!("phi {} lacks an input for predecessor {}", phi, pred))
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Adds an edge. Successor order is call order: the first edge added to a
    /// branching block is its true edge.
    pub fn connect(&mut self, from: BlockId, to: BlockId) {
        self.block_mut(from).succs_mut().push(to);
        self.block_mut(to).preds_mut().push(from);
        self.analyses.invalidate_cfg();
    }

    /// Removes the edge `from -> to`, dropping the matching phi inputs at `to`.
    pub fn remove_edge(&mut self, from: BlockId, to: BlockId) -> Result<()> {
        let succ_pos = self
            .try_block(from)?
            .succs()
            .iter()
            .position(|&s| s == to)
            .ok_or_else(|| graph_error!("no edge {} -> {}", from, to))?;
        self.block_mut(from).succs_mut().remove(succ_pos);

        let pred_pos = self
            .try_block(to)?
            .pred_index(from)
            .ok_or_else(|| graph_error!("edge {} -> {} lacks a predecessor entry", from, to))?;
        self.block_mut(to).preds_mut().remove(pred_pos);

        let phis: Vec<InstId> = self.block(to).phis().to_vec();
        for phi in phis {
            let input = self.inst(phi).input(pred_pos);
            remove_one(self.inst_mut(input).users_mut(), phi);
            self.inst_mut(phi).inputs_mut().remove(pred_pos);
        }
        self.analyses.invalidate_cfg();
        Ok(())
    }

    /// Removes a block. It must already be disconnected and empty.
    pub fn remove_block(&mut self, block: BlockId) -> Result<()> {
        {
            let bb = self.try_block(block)?;
            if !bb.preds().is_empty()
                || !bb.succs().is_empty()
                || !bb.phis().is_empty()
                || !bb.insts().is_empty()
            {
                return Err(graph_error!("{} is still connected or non-empty", block));
            }
        }
        self.blocks[block.index()] = None;
        self.analyses.invalidate_cfg();
        Ok(())
    }

    /// Absorbs `succ` into `block`: phis of `succ` (single-input by now) dissolve
    /// into their input, its instructions move to `block`, and `succ`'s successors
    /// are re-pointed at `block` in place, keeping their phi alignment.
    ///
    /// `block` must have `succ` as its only successor and be its only predecessor.
    pub fn join_successor(&mut self, block: BlockId, succ: BlockId) -> Result<()> {
        {
            let bb = self.try_block(block)?;
            let sb = self.try_block(succ)?;
            if bb.succs() != [succ] || sb.preds() != [block] {
                return Err(graph_error!("{} -> {} is not a sole-successor edge", block, succ));
            }
        }
        log::debug!("joining {succ} into {block}");

        let phis: Vec<InstId> = self.block(succ).phis().to_vec();
        for phi in phis {
            debug_assert_eq!(self.inst(phi).inputs().len(), 1);
            let input = self.inst(phi).input(0);
            self.replace_users(phi, input);
            self.remove_inst(phi);
        }

        let moved: Vec<InstId> = self.block(succ).insts().to_vec();
        for inst in moved {
            self.move_inst(inst, block);
        }

        self.block_mut(block).succs_mut().clear();
        self.block_mut(succ).preds_mut().clear();
        let succ_succs = std::mem::take(self.block_mut(succ).succs_mut());
        for &s in &succ_succs {
            let preds = self.block_mut(s).preds_mut();
            if let Some(pos) = preds.iter().position(|&p| p == succ) {
                preds[pos] = block;
            }
        }
        *self.block_mut(block).succs_mut() = succ_succs;

        self.remove_block(succ)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Blocks in postorder of a DFS from the entry. Unreachable blocks are not
    /// visited.
    #[must_use]
    pub fn postorder(&self) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.blocks.len());
        let mut visited = vec![false; self.blocks.len()];
        // (block, next successor index) pairs form the explicit DFS stack.
        let mut stack: Vec<(BlockId, usize)> = vec![(self.entry, 0)];
        visited[self.entry.index()] = true;
        while let Some(top) = stack.len().checked_sub(1) {
            let (block, next) = stack[top];
            let succs = self.block(block).succs();
            if next < succs.len() {
                stack[top].1 += 1;
                let succ = succs[next];
                if !visited[succ.index()] {
                    visited[succ.index()] = true;
                    stack.push((succ, 0));
                }
            } else {
                order.push(block);
                stack.pop();
            }
        }
        order
    }

    /// Blocks in reverse postorder: every block before its successors, back-edges
    /// aside.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let mut order = self.postorder();
        order.reverse();
        order
    }

    // ------------------------------------------------------------------
    // Cached analyses
    // ------------------------------------------------------------------

    /// The dominator tree, computed on first access and cached until the CFG
    /// changes.
    #[must_use]
    pub fn dominators(&self) -> &DominatorTree {
        self.analyses
            .dominators
            .get_or_init(|| compute_dominators(self))
    }

    /// Natural-loop information, computed on first access and cached until the CFG
    /// changes.
    #[must_use]
    pub fn loops(&self) -> &LoopInfo {
        self.analyses.loops.get_or_init(|| compute_loops(self))
    }

    /// Bounds-range facts, computed by [`BoundsAnalysis`] on first access and
    /// cached until a pass invalidates them.
    #[must_use]
    pub fn bounds_range_info(&self) -> &BoundsRangeInfo {
        self.analyses
            .bounds
            .get_or_init(|| BoundsAnalysis::new(self).run())
    }

    /// Drops cached bounds facts. Called by passes that rewrite value-producing
    /// instructions without changing the CFG.
    pub fn invalidate_bounds(&mut self) {
        self.analyses.invalidate_bounds();
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Renders the graph in Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self, title: &str) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph \"{title}\" {{");
        let _ = writeln!(dot, "  node [shape=box, fontname=\"monospace\"];");
        for id in self.block_ids() {
            let block = self.block(id);
            let mut label = format!("{id}");
            if id == self.entry {
                label.push_str(" (entry)");
            } else if id == self.exit {
                label.push_str(" (exit)");
            }
            for inst in block.instructions() {
                let _ = write!(label, "\\l{}", self.inst(inst));
            }
            label.push_str("\\l");
            let _ = writeln!(dot, "  {id} [label=\"{label}\"];");
            for (i, succ) in block.succs().iter().enumerate() {
                if block.succs().len() == 2 {
                    let edge = if i == 0 { "T" } else { "F" };
                    let _ = writeln!(dot, "  {id} -> {succ} [label=\"{edge}\"];");
                } else {
                    let _ = writeln!(dot, "  {id} -> {succ};");
                }
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Removes a single occurrence of `value` from `list`.
fn remove_one(list: &mut Vec<InstId>, value: InstId) {
    if let Some(pos) = list.iter().position(|&v| v == value) {
        list.swap_remove(pos);
    }
}
