use thiserror::Error;

use crate::ir::{BlockId, InstId};

macro_rules! graph_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedGraph {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedGraph {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers the failure modes of graph construction and structural mutation. The
/// optimization passes themselves are total over a valid graph: "no information" outcomes
/// (a maximal interval, an unchanged narrowing pair, a pattern that does not apply) are
/// modeled as data, never as errors. What remains are genuine caller mistakes detected
/// while building or rewriting a graph.
///
/// # Error Categories
///
/// ## Construction Errors
/// - [`Error::MalformedGraph`] - Structurally invalid graph (arity, ordering, wiring)
/// - [`Error::TypeError`] - Operand or result type inconsistency
///
/// ## Lookup Errors
/// - [`Error::BlockNotFound`] - Block id referring to a removed or never-created block
/// - [`Error::InstNotFound`] - Instruction id outside the graph's arena
///
/// # Examples
///
/// ```rust
/// use optir::{Error, ir::GraphBuilder};
///
/// let builder = GraphBuilder::new();
/// match builder.finish() {
///     Ok(graph) => {
///         println!("graph with {} blocks", graph.block_count());
///     }
///     Err(Error::MalformedGraph { message, file, line }) => {
///         eprintln!("malformed graph: {message} ({file}:{line})");
///     }
///     Err(e) => {
///         eprintln!("other error: {e}");
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The graph is structurally invalid.
    ///
    /// Raised by the builder's final validation and by mutation operations whose
    /// preconditions do not hold, such as a phi whose input count disagrees with its
    /// block's predecessor count, a two-successor block without a branch terminator,
    /// or an edge removal for an edge that does not exist. The error records the
    /// source location where the defect was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed graph - {file}:{line}: {message}")]
    MalformedGraph {
        /// The message to be printed for the malformed graph error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A block id does not name a live block.
    ///
    /// Block slots are tombstoned when control-flow merges remove a block; any
    /// later access through a stale id reports this error instead of resurrecting
    /// the slot.
    #[error("Block {0} does not exist or was removed")]
    BlockNotFound(BlockId),

    /// An instruction id lies outside the graph's instruction arena.
    #[error("Instruction {0} does not exist in this graph")]
    InstNotFound(InstId),

    /// Operand or result types are inconsistent for the requested operation.
    ///
    /// Covers builder-level typing mistakes, e.g. a select whose two value inputs
    /// disagree with its declared result type.
    #[error("{0}")]
    TypeError(String),
}
