//! Natural loop detection based on dominance.
//!
//! An edge `u -> h` is a **back edge** when `h` dominates `u`; the natural loop
//! of that edge is `h` (the header) plus every block that can reach `u` without
//! passing through `h`. Back edges sharing a header form a single loop with
//! several latches, the shape `continue` statements produce.
//!
//! The range analysis uses this to recognize loop headers: a header fed by one
//! forward edge and one back edge may still receive compare-narrowed facts from
//! its forward predecessor, because values flowing around the back edge were
//! already merged by the header's phis.

use crate::ir::{BlockId, Graph};

/// A single natural loop.
#[derive(Debug, Clone)]
pub struct NaturalLoop {
    header: BlockId,
    /// Source blocks of the back edges targeting the header.
    back_edges: Vec<BlockId>,
    /// All member blocks, header first.
    blocks: Vec<BlockId>,
    /// Nesting depth, 1 for outermost loops.
    depth: usize,
}

impl NaturalLoop {
    /// The loop header, the single entry point of a reducible loop.
    #[inline]
    #[must_use]
    pub fn header(&self) -> BlockId {
        self.header
    }

    /// Source blocks of the back edges into the header, one per latch.
    #[must_use]
    pub fn back_edges(&self) -> &[BlockId] {
        &self.back_edges
    }

    /// All blocks belonging to the loop, header first.
    #[must_use]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Whether `block` belongs to this loop.
    #[must_use]
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }

    /// Nesting depth; outermost loops have depth 1.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// All natural loops of a graph plus a block-to-innermost-loop mapping.
#[derive(Debug, Clone)]
pub struct LoopInfo {
    loops: Vec<NaturalLoop>,
    /// Index into `loops` of the innermost loop per arena slot.
    innermost: Vec<Option<usize>>,
}

impl LoopInfo {
    /// All detected loops, in header discovery order.
    #[must_use]
    pub fn loops(&self) -> &[NaturalLoop] {
        &self.loops
    }

    /// Number of detected loops.
    #[must_use]
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// The innermost loop containing `block`, or `None` when the block is not
    /// part of any loop.
    #[must_use]
    pub fn innermost_loop_of(&self, block: BlockId) -> Option<&NaturalLoop> {
        self.innermost
            .get(block.index())
            .copied()
            .flatten()
            .map(|index| &self.loops[index])
    }
}

/// Detects the natural loops of a graph.
///
/// Called through [`Graph::loops`], which caches the result until the CFG
/// changes. Requires the dominator tree and computes it on demand.
#[must_use]
pub fn compute_loops(graph: &Graph) -> LoopInfo {
    let dominators = graph.dominators();

    // Back edges, grouped by header in discovery order.
    let mut headers: Vec<(BlockId, Vec<BlockId>)> = Vec::new();
    for block in graph.reverse_postorder() {
        for &succ in graph.block(block).succs() {
            if !dominators.dominates(succ, block) {
                continue;
            }
            match headers.iter_mut().find(|(header, _)| *header == succ) {
                Some((_, latches)) => latches.push(block),
                None => headers.push((succ, vec![block])),
            }
        }
    }

    let mut loops = Vec::with_capacity(headers.len());
    for (header, back_edges) in headers {
        let blocks = loop_body(graph, header, &back_edges);
        loops.push(NaturalLoop {
            header,
            back_edges,
            blocks,
            depth: 0,
        });
    }

    // Nesting depth: one plus the number of distinct loops enclosing the header.
    for i in 0..loops.len() {
        let header = loops[i].header;
        let depth = 1 + loops
            .iter()
            .filter(|outer| outer.header != header && outer.contains(header))
            .count();
        loops[i].depth = depth;
    }

    let mut innermost: Vec<Option<usize>> = vec![None; graph.block_arena_len()];
    for (index, lp) in loops.iter().enumerate() {
        for &block in &lp.blocks {
            let slot = &mut innermost[block.index()];
            let deeper = match *slot {
                None => true,
                Some(current) => {
                    lp.depth > loops[current].depth
                        || (lp.depth == loops[current].depth
                            && lp.blocks.len() < loops[current].blocks.len())
                }
            };
            if deeper {
                *slot = Some(index);
            }
        }
    }

    LoopInfo { loops, innermost }
}

/// Collects the loop body by walking predecessors backwards from the latches,
/// stopping at the header.
fn loop_body(graph: &Graph, header: BlockId, back_edges: &[BlockId]) -> Vec<BlockId> {
    let mut member = vec![false; graph.block_arena_len()];
    let mut blocks = vec![header];
    member[header.index()] = true;

    let mut worklist: Vec<BlockId> = Vec::new();
    for &latch in back_edges {
        if !member[latch.index()] {
            member[latch.index()] = true;
            blocks.push(latch);
            worklist.push(latch);
        }
    }

    while let Some(block) = worklist.pop() {
        for &pred in graph.block(block).preds() {
            if !member[pred.index()] {
                member[pred.index()] = true;
                blocks.push(pred);
                worklist.push(pred);
            }
        }
    }

    blocks
}
