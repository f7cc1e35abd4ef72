//! Dominator tree computation using the Lengauer-Tarjan algorithm.
//!
//! A block `d` **dominates** a block `n` if every path from the entry to `n`
//! passes through `d`. The **immediate dominator** of `n` is the closest strict
//! dominator; making it `n`'s parent yields the dominator tree with the entry
//! block as root.
//!
//! The range analysis leans on this tree twice: stored facts are looked up by
//! walking a block's dominator chain, and loop detection classifies back edges
//! by header dominance. The implementation is Lengauer-Tarjan with path
//! compression, O(V α(V)) over the reachable blocks.

use crate::ir::{BlockId, Graph};

const UNDEFINED: BlockId = BlockId::new(usize::MAX);

/// Result of dominator tree computation.
///
/// Every block reachable from the entry has exactly one immediate dominator,
/// except the entry itself. Blocks not reachable from the entry are absent from
/// the tree; queries about them return `None`/`false`.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// Root of the tree.
    entry: BlockId,
    /// Immediate dominator per arena slot; the entry maps to itself,
    /// unreachable slots stay [`UNDEFINED`].
    idom: Vec<BlockId>,
}

impl DominatorTree {
    /// The entry (root) block of the tree.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// The immediate dominator of a block, or `None` for the entry and for
    /// blocks unreachable from it.
    ///
    /// # Panics
    ///
    /// Panics if the block id is out of arena range.
    #[inline]
    #[must_use]
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        if block == self.entry || self.idom[block.index()] == UNDEFINED {
            None
        } else {
            Some(self.idom[block.index()])
        }
    }

    /// Whether `a` dominates `b`. A block dominates itself.
    #[must_use]
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if a == b {
            return true;
        }
        let mut current = b;
        while current != self.entry {
            let idom = self.idom[current.index()];
            if idom == UNDEFINED {
                return false;
            }
            if idom == a {
                return true;
            }
            current = idom;
        }
        a == self.entry
    }

    /// Whether `a` dominates `b` and `a != b`.
    #[inline]
    #[must_use]
    pub fn strictly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Depth of a block in the dominator tree. The entry has depth 0.
    #[must_use]
    pub fn depth(&self, block: BlockId) -> usize {
        let mut depth = 0;
        let mut current = block;
        while let Some(idom) = self.immediate_dominator(current) {
            depth += 1;
            current = idom;
        }
        depth
    }

    /// Iterator over all dominators of a block, from the block itself up to and
    /// including the entry.
    pub fn dominators(&self, block: BlockId) -> DominatorIterator<'_> {
        DominatorIterator {
            tree: self,
            current: Some(block),
        }
    }
}

/// Iterator over dominators of a block, from the block up to the entry.
pub struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<BlockId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.immediate_dominator(current);
        Some(current)
    }
}

/// Computes the dominator tree of a graph from its entry block.
///
/// Called through [`Graph::dominators`], which caches the result until the CFG
/// changes.
#[must_use]
pub fn compute_dominators(graph: &Graph) -> DominatorTree {
    let mut lt = LengauerTarjan::new(graph.block_arena_len(), graph.entry());
    lt.compute(graph);
    DominatorTree {
        entry: graph.entry(),
        idom: lt.idom,
    }
}

/// Internal state for the Lengauer-Tarjan algorithm.
struct LengauerTarjan {
    /// Entry block.
    entry: BlockId,
    /// DFS number per arena slot (0 = not visited).
    dfnum: Vec<usize>,
    /// Block with each DFS number (inverse of `dfnum`).
    vertex: Vec<BlockId>,
    /// Parent in the DFS tree.
    parent: Vec<BlockId>,
    /// Semidominator, stored as a block id.
    semi: Vec<BlockId>,
    /// Immediate dominator (final result).
    idom: Vec<BlockId>,
    /// Ancestor in the link-eval forest.
    ancestor: Vec<BlockId>,
    /// Best block on the path to the ancestor, for path compression.
    best: Vec<BlockId>,
    /// Blocks whose semidominator is this block.
    bucket: Vec<Vec<BlockId>>,
    /// Current DFS counter.
    dfs_counter: usize,
}

impl LengauerTarjan {
    fn new(n: usize, entry: BlockId) -> Self {
        Self {
            entry,
            dfnum: vec![0; n],
            vertex: vec![UNDEFINED; n],
            parent: vec![UNDEFINED; n],
            semi: (0..n).map(BlockId::new).collect(),
            idom: vec![UNDEFINED; n],
            ancestor: vec![UNDEFINED; n],
            best: (0..n).map(BlockId::new).collect(),
            bucket: vec![Vec::new(); n],
            dfs_counter: 0,
        }
    }

    fn compute(&mut self, graph: &Graph) {
        self.dfs(graph);

        // Process reachable blocks in reverse DFS order, entry excluded.
        for i in (1..self.dfs_counter).rev() {
            let w = self.vertex[i];
            let parent_w = self.parent[w.index()];

            // Semidominators per the semidominator theorem.
            for &v in graph.block(w).preds() {
                if self.dfnum[v.index()] == 0 {
                    // Unreachable predecessor.
                    continue;
                }
                let u = self.eval(v);
                if self.dfnum[self.semi[u.index()].index()]
                    < self.dfnum[self.semi[w.index()].index()]
                {
                    self.semi[w.index()] = self.semi[u.index()];
                }
            }

            let semi_w = self.semi[w.index()];
            self.bucket[semi_w.index()].push(w);
            self.link(parent_w, w);

            // Implicit immediate dominators for the parent's bucket.
            let bucket = std::mem::take(&mut self.bucket[parent_w.index()]);
            for v in bucket {
                let u = self.eval(v);
                if self.semi[u.index()] == self.semi[v.index()] {
                    self.idom[v.index()] = parent_w;
                } else {
                    self.idom[v.index()] = u;
                }
            }
        }

        // Explicit immediate dominators, in DFS order.
        for i in 1..self.dfs_counter {
            let w = self.vertex[i];
            if self.idom[w.index()] != self.semi[w.index()] {
                self.idom[w.index()] = self.idom[self.idom[w.index()].index()];
            }
        }

        self.idom[self.entry.index()] = self.entry;
    }

    /// DFS numbering. Parents are recorded at push time; stale duplicate stack
    /// entries are skipped via `dfnum`, so the surviving parent is the actual
    /// DFS-tree parent.
    fn dfs(&mut self, graph: &Graph) {
        let mut stack = vec![self.entry];
        while let Some(block) = stack.pop() {
            if self.dfnum[block.index()] != 0 {
                continue;
            }
            self.dfs_counter += 1;
            self.dfnum[block.index()] = self.dfs_counter;
            self.vertex[self.dfs_counter - 1] = block;

            for &succ in graph.block(block).succs() {
                if self.dfnum[succ.index()] == 0 {
                    self.parent[succ.index()] = block;
                    stack.push(succ);
                }
            }
        }
    }

    /// Link `v` as a child of `w` in the spanning forest.
    fn link(&mut self, w: BlockId, v: BlockId) {
        self.ancestor[v.index()] = w;
    }

    /// Find the block with minimal semidominator on the path to the forest root.
    fn eval(&mut self, v: BlockId) -> BlockId {
        if self.ancestor[v.index()] == UNDEFINED {
            return v;
        }
        self.compress(v);
        self.best[v.index()]
    }

    /// Path compression for the link-eval forest.
    fn compress(&mut self, v: BlockId) {
        let ancestor_v = self.ancestor[v.index()];
        if self.ancestor[ancestor_v.index()] == UNDEFINED {
            return;
        }
        self.compress(ancestor_v);

        let best_ancestor = self.best[ancestor_v.index()];
        let best_v = self.best[v.index()];
        if self.dfnum[self.semi[best_ancestor.index()].index()]
            < self.dfnum[self.semi[best_v.index()].index()]
        {
            self.best[v.index()] = best_ancestor;
        }
        self.ancestor[v.index()] = self.ancestor[ancestor_v.index()];
    }
}
