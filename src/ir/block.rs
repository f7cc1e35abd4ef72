//! Basic blocks of the control-flow graph.

use std::fmt;

use bitflags::bitflags;

use crate::ir::InstId;

/// Arena index of a basic block within its [`Graph`](crate::ir::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl BlockId {
    /// Creates an id from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> BlockId {
        BlockId(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

bitflags! {
    /// Structural flags of a basic block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BlockFlags: u8 {
        /// The block lies inside a try region. Blocks are only merged across a
        /// try boundary when both sides agree on this flag.
        const TRY = 0x01;
    }
}

/// A basic block: ordered predecessor/successor lists plus the phis and instructions
/// it contains.
///
/// Successor order is meaningful for branching blocks: index 0 is the true successor,
/// index 1 the false successor of the block's terminating branch. Phi inputs align
/// positionally with the predecessor list, so edge mutations must patch both together
/// (the graph's mutation API does).
#[derive(Debug, Clone)]
pub struct BasicBlock {
    id: BlockId,
    preds: Vec<BlockId>,
    succs: Vec<BlockId>,
    phis: Vec<InstId>,
    insts: Vec<InstId>,
    flags: BlockFlags,
}

impl BasicBlock {
    pub(crate) fn new(id: BlockId) -> BasicBlock {
        BasicBlock {
            id,
            preds: Vec::new(),
            succs: Vec::new(),
            phis: Vec::new(),
            insts: Vec::new(),
            flags: BlockFlags::empty(),
        }
    }

    /// This block's arena id.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Ordered predecessor list.
    #[must_use]
    pub fn preds(&self) -> &[BlockId] {
        &self.preds
    }

    /// Ordered successor list; `[true, false]` for branching blocks.
    #[must_use]
    pub fn succs(&self) -> &[BlockId] {
        &self.succs
    }

    /// The successor taken when the terminating branch condition holds.
    ///
    /// # Panics
    ///
    /// Panics if the block has no successors.
    #[must_use]
    pub fn true_successor(&self) -> BlockId {
        self.succs[0]
    }

    /// The successor taken when the terminating branch condition does not hold.
    ///
    /// # Panics
    ///
    /// Panics if the block has fewer than two successors.
    #[must_use]
    pub fn false_successor(&self) -> BlockId {
        self.succs[1]
    }

    /// The position of `pred` in the predecessor list, which is also the matching
    /// phi-input position.
    #[must_use]
    pub fn pred_index(&self, pred: BlockId) -> Option<usize> {
        self.preds.iter().position(|&p| p == pred)
    }

    /// Phi instructions, in placement order.
    #[must_use]
    pub fn phis(&self) -> &[InstId] {
        &self.phis
    }

    /// Non-phi instructions, in placement order.
    #[must_use]
    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }

    /// Phis followed by non-phi instructions, the block's execution order.
    pub fn instructions(&self) -> impl Iterator<Item = InstId> + '_ {
        self.phis.iter().chain(self.insts.iter()).copied()
    }

    /// Structural flags.
    #[must_use]
    pub fn flags(&self) -> BlockFlags {
        self.flags
    }

    /// Whether the block lies inside a try region.
    #[must_use]
    pub fn is_try(&self) -> bool {
        self.flags.contains(BlockFlags::TRY)
    }

    pub(crate) fn set_flags(&mut self, flags: BlockFlags) {
        self.flags = flags;
    }

    pub(crate) fn preds_mut(&mut self) -> &mut Vec<BlockId> {
        &mut self.preds
    }

    pub(crate) fn succs_mut(&mut self) -> &mut Vec<BlockId> {
        &mut self.succs
    }

    pub(crate) fn phis_mut(&mut self) -> &mut Vec<InstId> {
        &mut self.phis
    }

    pub(crate) fn insts_mut(&mut self) -> &mut Vec<InstId> {
        &mut self.insts
    }
}
