//! Checked construction of SSA graphs.
//!
//! [`GraphBuilder`] wraps the raw [`Graph`] mutation API with an insertion point
//! and a final validation step. Instruction helpers append to the current block;
//! structural mistakes are reported by [`GraphBuilder::finish`] rather than by
//! each call, so graph construction stays linear.

use crate::ir::{
    BlockId, ConditionCode, DataType, Graph, InstId, Opcode, Target,
};
use crate::{Error, Result};

/// Builds an SSA [`Graph`] block by block.
///
/// Declare blocks and edges first, then fill each block through
/// [`switch_to`](GraphBuilder::switch_to) and the instruction helpers. Phis
/// take `(predecessor, value)` pairs and are stored in predecessor order, so
/// all edges into a block must exist before its phis are created.
///
/// # Examples
///
/// ```rust
/// use optir::ir::{ConditionCode, DataType, GraphBuilder, Opcode};
///
/// let mut b = GraphBuilder::new();
/// let x = b.parameter(DataType::I32);
/// let zero = b.int_constant(0);
/// let one = b.int_constant(1);
///
/// let (head, then_bb, join) = (b.block(), b.block(), b.block());
/// b.edge(b.entry(), head);
/// b.edge(head, then_bb); // true edge
/// b.edge(head, join); // false edge
/// b.edge(then_bb, join);
/// b.edge(join, b.exit());
///
/// b.switch_to(head);
/// let cmp = b.compare(ConditionCode::Lt, DataType::I32, x, zero);
/// b.if_imm(ConditionCode::Ne, 0, DataType::Bool, cmp);
///
/// b.switch_to(then_bb);
/// let neg = b.unary(Opcode::Neg, DataType::I32, x);
///
/// b.switch_to(join);
/// let abs = b.phi(DataType::I32, &[(then_bb, neg), (head, x)]);
/// b.ret(DataType::I32, abs);
///
/// let graph = b.finish().expect("well-formed graph");
/// assert_eq!(graph.block_count(), 5);
/// # let _ = one;
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    graph: Graph,
    current: Option<BlockId>,
    error: Option<Error>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        GraphBuilder::new()
    }
}

impl GraphBuilder {
    /// Creates a builder over an empty graph.
    #[must_use]
    pub fn new() -> GraphBuilder {
        GraphBuilder::with_target(Target)
    }

    /// Creates a builder over an empty graph for the given target.
    #[must_use]
    pub fn with_target(target: Target) -> GraphBuilder {
        GraphBuilder {
            graph: Graph::with_target(target),
            current: None,
            error: None,
        }
    }

    /// The graph's entry block.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        self.graph.entry()
    }

    /// The graph's exit block.
    #[must_use]
    pub fn exit(&self) -> BlockId {
        self.graph.exit()
    }

    /// Creates a new block and makes it the insertion point.
    pub fn block(&mut self) -> BlockId {
        let id = self.graph.create_block();
        self.current = Some(id);
        id
    }

    /// Marks a block as part of a try region.
    pub fn mark_try(&mut self, block: BlockId) {
        self.graph.set_try(block, true);
    }

    /// Adds an edge. For branching blocks the first edge added is the true edge,
    /// the second the false edge.
    pub fn edge(&mut self, from: BlockId, to: BlockId) {
        self.graph.connect(from, to);
    }

    /// Moves the insertion point to an existing block.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    fn record(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn emit(&mut self, inst: InstId) -> InstId {
        match self.current {
            Some(block) => self.graph.append_inst(block, inst),
            None => self.record(graph_error!("{} emitted with no current block", inst)),
        }
        inst
    }

    // ------------------------------------------------------------------
    // Entry-block values
    // ------------------------------------------------------------------

    /// Adds a method parameter.
    pub fn parameter(&mut self, ty: DataType) -> InstId {
        self.graph.new_parameter(ty)
    }

    /// Interns an `I64` constant.
    pub fn int_constant(&mut self, value: i64) -> InstId {
        self.graph.find_or_create_constant(value)
    }

    /// The null-reference literal.
    pub fn null_ptr(&mut self) -> InstId {
        self.graph.null_ptr()
    }

    // ------------------------------------------------------------------
    // Instructions
    // ------------------------------------------------------------------

    /// Emits a `Compare` of two values.
    pub fn compare(
        &mut self,
        cc: ConditionCode,
        operands_ty: DataType,
        lhs: InstId,
        rhs: InstId,
    ) -> InstId {
        let id = self.graph.new_compare(cc, operands_ty, lhs, rhs);
        self.emit(id)
    }

    /// Emits an `IfImm` branch testing `input <cc> imm`.
    pub fn if_imm(
        &mut self,
        cc: ConditionCode,
        imm: i64,
        operands_ty: DataType,
        input: InstId,
    ) -> InstId {
        let id = self.graph.new_if_imm(cc, imm, operands_ty, input);
        self.emit(id)
    }

    /// Emits a two-operand `If` branch.
    pub fn if_cmp(
        &mut self,
        cc: ConditionCode,
        operands_ty: DataType,
        lhs: InstId,
        rhs: InstId,
    ) -> InstId {
        let id = self.graph.new_if(cc, operands_ty, lhs, rhs);
        self.emit(id)
    }

    /// Emits a two-operand ALU instruction.
    pub fn binary(&mut self, opcode: Opcode, ty: DataType, lhs: InstId, rhs: InstId) -> InstId {
        let id = self.graph.new_binary(opcode, ty, lhs, rhs);
        self.emit(id)
    }

    /// Emits an ALU instruction with an immediate operand.
    pub fn binary_imm(&mut self, opcode: Opcode, ty: DataType, lhs: InstId, imm: i64) -> InstId {
        let id = self.graph.new_binary_imm(opcode, ty, lhs, imm);
        self.emit(id)
    }

    /// Emits a one-operand ALU instruction.
    pub fn unary(&mut self, opcode: Opcode, ty: DataType, input: InstId) -> InstId {
        let id = self.graph.new_unary(opcode, ty, input);
        self.emit(id)
    }

    /// Emits a phi with one `(predecessor, value)` pair per incoming edge.
    ///
    /// Inputs are reordered to match the block's predecessor list. Arity or
    /// predecessor mismatches are reported by [`finish`](GraphBuilder::finish).
    pub fn phi(&mut self, ty: DataType, inputs: &[(BlockId, InstId)]) -> InstId {
        let phi = self.graph.new_phi(ty);
        match self.current {
            Some(block) => {
                let preds: Vec<BlockId> = match self.graph.try_block(block) {
                    Ok(bb) => bb.preds().to_vec(),
                    Err(err) => {
                        self.record(err);
                        Vec::new()
                    }
                };
                for pred in preds {
                    match inputs.iter().find(|(p, _)| *p == pred) {
                        Some(&(_, value)) => self.graph.add_input(phi, value),
                        None => self.record(graph_error!(
                            "phi {} in {} lacks an input for predecessor {}",
                            phi,
                            block,
                            pred
                        )),
                    }
                }
                self.graph.append_phi(block, phi);
            }
            None => self.record(graph_error!("{} emitted with no current block", phi)),
        }
        phi
    }

    /// Emits a static call.
    pub fn call(&mut self, ty: DataType, args: &[InstId]) -> InstId {
        let id = self.graph.new_call(ty, args);
        self.emit(id)
    }

    /// Emits a null guard over a reference.
    pub fn null_check(&mut self, object: InstId) -> InstId {
        let id = self.graph.new_null_check(object);
        self.emit(id)
    }

    /// Emits an array-length read.
    pub fn len_array(&mut self, array: InstId) -> InstId {
        let id = self.graph.new_len_array(array);
        self.emit(id)
    }

    /// Emits an array allocation.
    pub fn new_array(&mut self, length: InstId) -> InstId {
        let id = self.graph.new_new_array(length);
        self.emit(id)
    }

    /// Emits an object allocation.
    pub fn new_object(&mut self) -> InstId {
        let id = self.graph.new_new_object();
        self.emit(id)
    }

    /// Emits a `Return` of a value.
    pub fn ret(&mut self, ty: DataType, value: InstId) -> InstId {
        let id = self.graph.new_return(ty, value);
        self.emit(id)
    }

    /// Emits a `ReturnVoid`.
    pub fn ret_void(&mut self) -> InstId {
        let id = self.graph.new_return_void();
        self.emit(id)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validates the graph and hands it over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGraph`] for the first structural problem found:
    /// a phi whose arity disagrees with its block's predecessors, a two-successor
    /// block without a branch, a branch without two successors, a return that does
    /// not fall through to the exit block, or an instruction emitted with no
    /// current block.
    pub fn finish(mut self) -> Result<Graph> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.validate()?;
        Ok(self.graph)
    }

    fn validate(&self) -> Result<()> {
        let graph = &self.graph;
        for id in graph.block_ids() {
            let block = graph.block(id);

            if id == graph.exit() {
                if !block.succs().is_empty() {
                    return Err(graph_error!("the exit block cannot have successors"));
                }
                if block.instructions().next().is_some() {
                    return Err(graph_error!("the exit block cannot hold instructions"));
                }
                continue;
            }

            if block.succs().len() > 2 {
                return Err(graph_error!("{} has {} successors", id, block.succs().len()));
            }

            let terminator = graph
                .block(id)
                .insts()
                .last()
                .map(|&last| graph.inst(last));
            let branches = matches!(
                terminator.map(crate::ir::Inst::opcode),
                Some(Opcode::If | Opcode::IfImm)
            );
            let returns = matches!(
                terminator.map(crate::ir::Inst::opcode),
                Some(Opcode::Return | Opcode::ReturnVoid | Opcode::ReturnI)
            );
            if block.succs().len() == 2 && !branches {
                return Err(graph_error!("{} has two successors but no branch", id));
            }
            if branches && block.succs().len() != 2 {
                return Err(graph_error!(
                    "{} branches but has {} successors",
                    id,
                    block.succs().len()
                ));
            }
            if returns && block.succs() != [graph.exit()] {
                return Err(graph_error!(
                    "{} returns but does not fall through to the exit block",
                    id
                ));
            }

            for &phi in block.phis() {
                let arity = graph.inst(phi).inputs().len();
                if arity != block.preds().len() {
                    return Err(graph_error!(
                        "phi {} has {} inputs but {} has {} predecessors",
                        phi,
                        arity,
                        id,
                        block.preds().len()
                    ));
                }
            }
        }
        Ok(())
    }
}
