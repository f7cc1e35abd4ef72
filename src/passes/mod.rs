//! Optimization passes over the graph.
//!
//! Passes implement the [`OptPass`] trait and are run in a caller-chosen
//! order; there is no scheduler deciding for you. The two passes here form the
//! tail of a typical pipeline:
//!
//! 1. **If-conversion**: rewrites small branch patterns into `Select`
//!    instructions, shrinking the CFG.
//! 2. **Lowering**: canonicalizes branches and folds constant operands into
//!    immediate instruction forms ahead of code generation.
//!
//! Both passes mutate the graph in place and report whether they changed
//! anything, so callers can iterate pipelines until stable if they want to.

mod if_conversion;
mod lowering;

pub use if_conversion::IfConversion;
pub use lowering::Lowering;

use crate::ir::Graph;
use crate::Result;

/// An optimization pass over a [`Graph`].
pub trait OptPass {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Runs the pass on a graph.
    ///
    /// Returns `true` if any changes were made, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass encounters a malformed graph.
    fn run(&mut self, graph: &mut Graph) -> Result<bool>;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

/// Runs a sequence of passes once each, in order.
///
/// Returns `true` if any pass changed the graph.
///
/// # Errors
///
/// Stops at and returns the first pass failure.
pub fn run_pipeline(graph: &mut Graph, passes: &mut [Box<dyn OptPass>]) -> Result<bool> {
    let mut changed = false;
    for pass in passes.iter_mut() {
        let pass_changed = pass.run(graph)?;
        log::debug!(
            "pass {}: {}",
            pass.name(),
            if pass_changed { "changed the graph" } else { "no changes" }
        );
        changed |= pass_changed;
    }
    Ok(changed)
}
