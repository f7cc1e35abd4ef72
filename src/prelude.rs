//! # optir Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the optir library. Import this module to get quick access to the essential
//! types for building SSA graphs and running optimization passes over them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all optir operations
pub use crate::Error;

/// The result type used throughout optir
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The SSA control-flow graph and its checked builder
pub use crate::ir::{Graph, GraphBuilder};

// ================================================================================================
// IR Building Blocks
// ================================================================================================

/// Basic blocks and their arena ids
pub use crate::ir::{BasicBlock, BlockFlags, BlockId};

/// Instructions and their arena ids
pub use crate::ir::{Inst, InstId};

/// Opcodes, their static properties, and comparison condition codes
pub use crate::ir::{ConditionCode, OpProps, Opcode};

/// Value types with their integral domains
pub use crate::ir::DataType;

/// Immediate-encoding rules consulted by the lowering pass
pub use crate::ir::Target;

// ================================================================================================
// Analyses
// ================================================================================================

/// Value-range analysis: intervals, the per-block fact table and the driver
pub use crate::analysis::{BoundsAnalysis, BoundsRange, BoundsRangeInfo};

/// Interval overlap classification used by condition narrowing
pub use crate::analysis::bounds::Overlap;

/// Dominator tree queries
pub use crate::analysis::{compute_dominators, DominatorTree};

/// Natural loop detection
pub use crate::analysis::{compute_loops, LoopInfo, NaturalLoop};

// ================================================================================================
// Optimization Passes
// ================================================================================================

/// The pass interface and the pipeline runner
pub use crate::passes::{run_pipeline, OptPass};

/// Branch-flattening and lowering passes
pub use crate::passes::{IfConversion, Lowering};
