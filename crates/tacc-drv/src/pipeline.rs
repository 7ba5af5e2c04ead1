//! Phase orchestration: `tokenize -> parse -> symbol table -> semantic
//! check -> TAC gen -> optimize -> liveness -> register allocation ->
//! emit`, fixed and sequential, each phase receiving the previous one's
//! output exclusively. The first typed error aborts the whole run.

use std::collections::HashMap;
use std::path::Path;

use tacc_lex::Lexer;
use tacc_par::Parser as TaccParser;
use tacc_regalloc::{analyze_block_liveness, analyze_instruction_liveness, build_interference_graph, greedy_color, ColorMap};
use tacc_sem::SymbolTable;
use tacc_tac::optimize::{constant_fold, optimize_to_fixpoint};
use tacc_tac::{generate as generate_tac, Cfg, Tac};
use tacc_util::{Idx, Token};

use crate::error::DriverError;

/// Every artifact a full compilation can be asked to hand back, one field
/// per inspection point named in the CLI surface.
pub struct PipelineOutput {
    pub tokens: Vec<Token>,
    pub ast: tacc_par::ast::Program,
    pub symbols: SymbolTable,
    pub tac_before_optimization: Tac,
    pub tac_after_fold: Tac,
    pub tac_after_fixpoint: Tac,
    pub colors: HashMap<String, ColorMap>,
    pub asm: String,
}

/// Runs every phase in order over `source`, stopping at the first typed
/// error. `on_phase` is called at each phase boundary (wired to `tracing`
/// by the caller, gated behind `-v`).
pub fn run(source: &str, mut on_phase: impl FnMut(&str)) -> Result<PipelineOutput, DriverError> {
    on_phase("lexing");
    let tokens = Lexer::tokenize(source)?;

    on_phase("parsing");
    let ast = TaccParser::parse(tokens.clone())?;

    on_phase("building symbol table and running semantic analysis");
    let symbols = tacc_sem::analyze(&ast)?;

    on_phase("generating three-address code");
    let tac_before_optimization = generate_tac(&ast)?;

    on_phase("folding constants");
    let mut tac_after_fold = tac_before_optimization.clone();
    constant_fold(&mut tac_after_fold)?;

    on_phase("running the fold/propagate/dead-code fixpoint");
    let mut tac_after_fixpoint = tac_before_optimization.clone();
    optimize_to_fixpoint(&mut tac_after_fixpoint)?;

    on_phase("analyzing liveness and allocating registers");
    let mut colors = HashMap::new();
    for func in &tac_after_fixpoint.functions {
        let cfg = Cfg::build(func);
        let block_liveness = analyze_block_liveness(func, &cfg);
        let instr_liveness = analyze_instruction_liveness(func, &block_liveness);
        let graph = build_interference_graph(func, &instr_liveness);
        colors.insert(func.name.lexeme.clone(), greedy_color(&graph));
    }

    on_phase("emitting assembly");
    let asm = tacc_gen::generate(&tac_after_fixpoint, &colors)?;

    Ok(PipelineOutput {
        tokens,
        ast,
        symbols,
        tac_before_optimization,
        tac_after_fold,
        tac_after_fixpoint,
        colors,
        asm,
    })
}

/// Renders the token stream one per line, the form the `-l` flag and the
/// `-w` file both use.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        out.push_str(&format!("{:?} {:?} line={} col={}\n", tok.kind, tok.lexeme, tok.line, tok.column));
    }
    out
}

/// Depth-first preorder dump of the symbol table, one scope per line:
/// `{id, name, symbols: [...]}`.
pub fn render_symbol_table(symbols: &SymbolTable) -> String {
    let mut out = String::new();
    for id in symbols.dump_order() {
        let scope = &symbols.scopes[id];
        let names: Vec<&str> = scope.symbols.keys().map(|s| s.as_str()).collect();
        out.push_str(&format!("{{id: {}, name: {}, symbols: {:?}}}\n", id.index(), scope.name, names));
    }
    out
}

/// Renders the register-coloring map for every function, sorted by name
/// so the output is stable across hash-map iteration order.
pub fn render_colors(colors: &HashMap<String, ColorMap>) -> String {
    let mut out = String::new();
    let mut funcs: Vec<&String> = colors.keys().collect();
    funcs.sort();
    for func in funcs {
        out.push_str(&format!("function {func}:\n"));
        let map = &colors[func];
        let mut names: Vec<&String> = map.keys().collect();
        names.sort();
        for name in names {
            out.push_str(&format!("  {name} -> r{}\n", map[name]));
        }
    }
    out
}

/// Writes the rendered token listing to `path`, creating parent
/// directories as needed (the default `./output.txt` never needs any).
pub fn write_tokens(path: &Path, rendered: &str) -> Result<(), DriverError> {
    std::fs::write(path, rendered).map_err(|source| DriverError::Io { path: path.to_path_buf(), source })
}
