//! Command-line surface, parsed with `clap`'s derive macros.

use std::path::PathBuf;

use clap::Parser;

/// tacc - a front-to-back compiler for a restricted, integer-only C dialect.
///
/// Compiles a single source file into three-address code, optionally
/// running the dataflow optimizer and printing an x86-64-style assembly
/// listing produced by a greedy register allocator.
#[derive(Parser, Debug)]
#[command(name = "tacc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A front-to-back compiler for a restricted C dialect", long_about = None)]
pub struct Cli {
    /// Source file to compile
    pub input: PathBuf,

    /// Print the token stream
    #[arg(short = 'l')]
    pub tokens: bool,

    /// Print the AST as an indented tree
    #[arg(short = 'a')]
    pub ast: bool,

    /// Print the symbol table, depth-first in creation order
    #[arg(short = 't')]
    pub symbols: bool,

    /// Print TAC at a given stage: 0 = before optimization, 1 = after
    /// constant folding, 2 = after the fold/propagate/DCE fixpoint
    #[arg(short = 'o', value_name = "STAGE")]
    pub opt_dump: Option<OptStage>,

    /// Print the register allocation map produced after liveness analysis
    #[arg(short = 'r')]
    pub regalloc: bool,

    /// Print the final assembly listing
    #[arg(short = 's')]
    pub asm: bool,

    /// Path to write the token listing to
    #[arg(short = 'w', default_value = "./output.txt")]
    pub write_path: PathBuf,

    /// Echo the phase currently executing to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Which TAC snapshot `-o<n>` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptStage {
    BeforeOptimization,
    AfterConstantFold,
    AfterFixpoint,
}

impl std::str::FromStr for OptStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(OptStage::BeforeOptimization),
            "1" => Ok(OptStage::AfterConstantFold),
            "2" => Ok(OptStage::AfterFixpoint),
            other => Err(format!("unknown optimization dump stage '-o{other}' (expected 0, 1, or 2)")),
        }
    }
}
