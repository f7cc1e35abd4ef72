//! The SSA intermediate representation.
//!
//! A method is a [`Graph`] of [`BasicBlock`]s holding [`Inst`]s in static single
//! assignment form. Value types are drawn from [`DataType`], branch and compare
//! predicates from [`ConditionCode`], and instruction behavior is classified by
//! [`Opcode`] property flags. [`GraphBuilder`] is the checked construction
//! surface; [`Target`] answers which immediates the backend can encode.

mod block;
mod builder;
mod condition;
mod graph;
mod inst;
mod opcode;
mod target;
mod types;

pub use block::{BasicBlock, BlockFlags, BlockId};
pub use builder::GraphBuilder;
pub use condition::ConditionCode;
pub use graph::Graph;
pub use inst::{Inst, InstId};
pub use opcode::{OpProps, Opcode};
pub use target::Target;
pub use types::DataType;
