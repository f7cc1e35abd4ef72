// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # optir
//!
//! [![Crates.io](https://img.shields.io/crates/v/optir.svg)](https://crates.io/crates/optir)
//! [![Documentation](https://docs.rs/optir/badge.svg)](https://docs.rs/optir)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/optir/blob/main/LICENSE)
//!
//! Value-range analysis and scalar optimization passes over a method-level SSA
//! intermediate representation. Built in pure Rust, `optir` derives integer
//! intervals from branch conditions, rewrites small if/else regions into
//! branch-free selects, and lowers compares, branches and ALU instructions into
//! the immediate-operand forms a target can actually encode.
//!
//! ## Features
//!
//! - **📐 Interval analysis** - Closed `[left, right]` ranges per `(block, instruction)`
//!   pair, sharpened by compare-guarded branches and widened through phi merges
//! - **🔀 If-conversion** - Turns triangle and diamond regions into `Select`
//!   instructions when the speculated side is small enough
//! - **⚙️ Branch lowering** - Fuses `Compare` + branch pairs into direct conditional
//!   branches and folds encodable constants into immediate ALU forms
//! - **🧱 Arena-backed IR** - Blocks and instructions addressed by copyable ids,
//!   def-use chains maintained on every edit
//! - **🛡️ Checked construction** - [`ir::GraphBuilder`] validates phi arities, branch
//!   shapes and return placement before handing a graph over
//! - **📊 Cached analyses** - Dominators, natural loops and value ranges computed on
//!   demand and invalidated when the CFG changes
//!
//! ## Quick Start
//!
//! Add `optir` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! optir = "0.2"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use optir::prelude::*;
//!
//! // abs(x): the taken side negates, the join phi picks a side.
//! let mut b = GraphBuilder::new();
//! let x = b.parameter(DataType::I32);
//! let zero = b.int_constant(0);
//!
//! let (head, then_bb, join) = (b.block(), b.block(), b.block());
//! b.edge(b.entry(), head);
//! b.edge(head, then_bb); // true edge
//! b.edge(head, join); // false edge
//! b.edge(then_bb, join);
//! b.edge(join, b.exit());
//!
//! b.switch_to(head);
//! let cmp = b.compare(ConditionCode::Lt, DataType::I32, x, zero);
//! b.if_imm(ConditionCode::Ne, 0, DataType::Bool, cmp);
//!
//! b.switch_to(then_bb);
//! let neg = b.unary(Opcode::Neg, DataType::I32, x);
//!
//! b.switch_to(join);
//! let abs = b.phi(DataType::I32, &[(then_bb, neg), (head, x)]);
//! b.ret(DataType::I32, abs);
//!
//! let mut graph = b.finish()?;
//!
//! // Flatten the triangle into a Select, then lower what remains.
//! let mut passes: Vec<Box<dyn OptPass>> = vec![
//!     Box::new(IfConversion::new()),
//!     Box::new(Lowering::new()),
//! ];
//! let changed = run_pipeline(&mut graph, &mut passes)?;
//! assert!(changed);
//! # Ok::<(), optir::Error>(())
//! ```
//!
//! ### Querying Value Ranges
//!
//! The range analysis runs lazily the first time it is asked for and answers
//! per block, so a guard sharpens everything the guarded block dominates:
//!
//! ```rust
//! use optir::prelude::*;
//!
//! let mut b = GraphBuilder::new();
//! let x = b.parameter(DataType::I32);
//! let zero = b.int_constant(0);
//!
//! let (head, guarded) = (b.block(), b.block());
//! b.edge(b.entry(), head);
//! b.edge(head, guarded); // true edge: x > 0 holds here
//! b.edge(head, b.exit()); // false edge
//! b.edge(guarded, b.exit());
//!
//! b.switch_to(head);
//! let cmp = b.compare(ConditionCode::Gt, DataType::I32, x, zero);
//! b.if_imm(ConditionCode::Ne, 0, DataType::Bool, cmp);
//!
//! b.switch_to(guarded);
//! b.ret(DataType::I32, x);
//!
//! let graph = b.finish()?;
//! let ranges = graph.bounds_range_info();
//! assert_eq!(ranges.find_bounds_range(&graph, guarded, x).left(), 1);
//! # Ok::<(), optir::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `optir` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`ir`] - The SSA graph: blocks, instructions, opcodes, types, construction
//! - [`analysis`] - Dominators, natural loops and the value-range analysis
//! - [`passes`] - Graph-transforming passes behind the [`passes::OptPass`] trait
//! - [`Error`] and [`Result`] - Error handling for graph surgery and passes
//!
//! ### Analysis Layer
//!
//! Analyses are pure functions of the graph, cached on it and recomputed on
//! demand after CFG edits:
//!
//! - **Dominators**: Lengauer-Tarjan with path compression
//! - **Loops**: back edges grouped per header into natural loops with depths
//! - **Ranges**: a single forward reverse-postorder pass, not a fixpoint; facts
//!   are keyed by `(block, instruction)` and resolved through the dominator tree
//!
//! ### Pass Layer
//!
//! Passes mutate the graph through its checked mutation API and report whether
//! they changed anything, so pipelines can iterate or log per pass:
//!
//! - [`passes::IfConversion`] - triangle/diamond regions into `Select`/`SelectImm`
//! - [`passes::Lowering`] - branch fusion, immediate ALU forms, immediate returns
//!
//! ## Error Handling
//!
//! Graph surgery and passes return [`Result<T, Error>`](Result); malformed graph
//! shapes carry the offending detail plus the source location that rejected them:
//!
//! ```rust
//! use optir::{ir::GraphBuilder, Error};
//!
//! let mut b = GraphBuilder::new();
//! let head = b.block();
//! let (left, right) = (b.block(), b.block());
//! b.edge(b.entry(), head);
//! b.edge(head, left);
//! b.edge(head, right);
//!
//! // Two successors but no branch instruction.
//! match b.finish() {
//!     Err(Error::MalformedGraph { message, .. }) => assert!(message.contains("no branch")),
//!     other => panic!("expected a malformed-graph error, got {other:?}"),
//! }
//! ```
//!
//! ## Testing
//!
//! The test suite builds graphs through the public builder API and checks pass
//! output shape by shape:
//!
//! ```bash
//! cargo test
//! cargo bench  # pass throughput on synthetic graphs
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the optir library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use optir::prelude::*;
///
/// let mut b = GraphBuilder::new();
/// let x = b.parameter(DataType::I32);
/// let head = b.block();
/// b.edge(b.entry(), head);
/// b.edge(head, b.exit());
/// b.switch_to(head);
/// b.ret(DataType::I32, x);
/// let graph = b.finish()?;
/// assert_eq!(graph.block_count(), 3);
/// # Ok::<(), optir::Error>(())
/// ```
pub mod prelude;

/// Method-level SSA intermediate representation.
///
/// The IR is a control-flow graph of basic blocks holding instructions in SSA
/// form. Blocks and instructions live in arenas owned by the graph and are
/// addressed by copyable ids; instructions know their operands and their users,
/// so rewrites keep def-use chains intact.
///
/// # Key Types
///
/// - [`ir::Graph`] - Arena-backed CFG with the mutation API and cached analyses
/// - [`ir::GraphBuilder`] - Checked block-by-block construction
/// - [`ir::BasicBlock`] - Ordered predecessor/successor lists, phis, instructions
/// - [`ir::Inst`] / [`ir::Opcode`] - Instructions and their static properties
/// - [`ir::ConditionCode`] - Signed and unsigned comparison codes
/// - [`ir::DataType`] - Value types and their integral domains
/// - [`ir::Target`] - Immediate-encoding rules consulted by lowering
///
/// # Conventions
///
/// Branching blocks order their successors as `[true, false]`. Phi inputs align
/// positionally with the owning block's predecessor list, and every structural
/// edit maintains that alignment.
pub mod ir;

/// Graph analyses consumed by the optimization passes.
///
/// Every analysis borrows the graph, computes a side table and never mutates
/// IR. The graph caches the results and drops them when the CFG changes.
///
/// # Key Types
///
/// - [`analysis::DominatorTree`] - Immediate dominators via Lengauer-Tarjan
/// - [`analysis::LoopInfo`] - Natural loops grouped by header, with depths
/// - [`analysis::BoundsRange`] - A closed `[left, right]` interval over `i64`
/// - [`analysis::BoundsRangeInfo`] - Ranges proven per `(block, instruction)` pair
/// - [`analysis::BoundsAnalysis`] - The forward pass that fills the table
///
/// # Example
///
/// ```rust
/// use optir::ir::Graph;
///
/// let mut graph = Graph::new();
/// let head = graph.create_block();
/// graph.connect(graph.entry(), head);
/// graph.connect(head, graph.exit());
///
/// let dominators = graph.dominators();
/// assert!(dominators.dominates(graph.entry(), head));
/// ```
pub mod analysis;

/// Optimization passes over the SSA graph.
///
/// Each pass implements [`passes::OptPass`]: it mutates the graph through the
/// checked mutation API and reports whether anything changed. Passes run in a
/// caller-chosen order through [`passes::run_pipeline`].
///
/// # Key Types
///
/// - [`passes::IfConversion`] - Rewrites triangle and diamond regions into
///   `Select`/`SelectImm` instructions
/// - [`passes::Lowering`] - Fuses compare/branch pairs and folds constants into
///   immediate operand slots
///
/// # Example
///
/// ```rust
/// use optir::ir::Graph;
/// use optir::passes::{run_pipeline, IfConversion, Lowering, OptPass};
///
/// let mut graph = Graph::new();
/// let mut passes: Vec<Box<dyn OptPass>> = vec![
///     Box::new(IfConversion::new()),
///     Box::new(Lowering::new()),
/// ];
/// // An empty graph gives the passes nothing to do.
/// let changed = run_pipeline(&mut graph, &mut passes)?;
/// assert!(!changed);
/// # Ok::<(), optir::Error>(())
/// ```
pub mod passes;

/// `optir` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. This is used consistently throughout the crate for all
/// fallible operations.
///
/// # Examples
///
/// ```rust
/// use optir::{ir::Graph, Result};
///
/// fn optimize(graph: &mut Graph) -> Result<bool> {
///     let mut passes = vec![];
///     optir::passes::run_pipeline(graph, &mut passes)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `optir` Error type
///
/// The main error type for all operations in this crate. Covers malformed graph
/// shapes, dangling block and instruction ids, and type mismatches discovered
/// during graph surgery.
///
/// # Examples
///
/// ```rust
/// use optir::{ir::Graph, Error};
///
/// let graph = Graph::new();
/// match graph.try_block(optir::ir::BlockId::new(99)) {
///     Err(Error::BlockNotFound(id)) => assert_eq!(id.index(), 99),
///     other => panic!("expected a missing-block error, got {other:?}"),
/// }
/// ```
pub use error::Error;

/// Main entry points for building and transforming SSA graphs.
///
/// See [`ir::GraphBuilder`] for checked construction and [`ir::Graph`] for the
/// mutation API used by passes.
///
/// # Example
///
/// ```rust
/// use optir::GraphBuilder;
/// let graph = GraphBuilder::new().finish()?;
/// assert_eq!(graph.block_count(), 2); // entry and exit
/// # Ok::<(), optir::Error>(())
/// ```
pub use ir::{Graph, GraphBuilder};
