//! Graph analyses consumed by the optimization passes.
//!
//! Every analysis here is a pure function of the graph: it borrows the graph,
//! computes a side table and never mutates IR. The graph caches the results
//! and drops them when the CFG changes, so passes simply ask for what they
//! need.
//!
//! # Architecture
//!
//! The module is organized into focused sub-modules:
//!
//! - [`dominators`] - Dominator tree via Lengauer-Tarjan
//! - [`loops`] - Natural loop detection on top of dominance
//! - [`bounds`] - Value-range facts per `(block, instruction)` pair
//!
//! # Usage
//!
//! ```rust,ignore
//! use optir::ir::Graph;
//!
//! // Lazily computed and cached on the graph.
//! let dominators = graph.dominators();
//! assert!(dominators.dominates(graph.entry(), some_block));
//!
//! let ranges = graph.bounds_range_info();
//! let range = ranges.find_bounds_range(&graph, some_block, some_inst);
//! ```

pub mod bounds;
pub mod dominators;
pub mod loops;

// Re-export primary types at module level
pub use bounds::{BoundsAnalysis, BoundsRange, BoundsRangeInfo};
pub use dominators::{compute_dominators, DominatorTree};
pub use loops::{compute_loops, LoopInfo, NaturalLoop};
