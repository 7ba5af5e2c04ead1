//! tacc-regalloc — two-stage backward liveness analysis over a function's
//! CFG, followed by interference-graph construction and greedy coloring.
//! Every public entry point here is infallible: by the time a [`FunctionBlock`]
//! reaches this crate, `tacc-sem` has already rejected anything that could
//! make liveness or coloring fail.

mod interference;
mod liveness;

pub use interference::{build_interference_graph, greedy_color, ColorMap, InterferenceGraph};
pub use liveness::{analyze_block_liveness, analyze_instruction_liveness, BlockLiveness, InstructionLiveness};
