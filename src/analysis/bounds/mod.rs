//! Value-range analysis.
//!
//! Derives integer intervals for SSA values from three sources: type domains,
//! compare-guarded branches and phi merges. Facts live in a sparse side table
//! keyed by `(block, instruction)` and are resolved through the dominator
//! tree, so a fact proven at a block is visible in everything the block
//! dominates.
//!
//! The entry point is [`Graph::bounds_range_info`](crate::ir::Graph::bounds_range_info),
//! which runs [`BoundsAnalysis`] on demand and caches the resulting
//! [`BoundsRangeInfo`] until the CFG or the value graph changes.

mod analysis;
mod info;
mod range;

pub use analysis::BoundsAnalysis;
pub use info::BoundsRangeInfo;
pub use range::{BoundsRange, Overlap};
