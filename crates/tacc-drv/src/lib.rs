//! tacc-drv — the CLI binary and phase orchestration for the tacc compiler.
//!
//! Owns nothing algorithmic: every phase lives in its own crate. This
//! crate's job is wiring them together in the fixed order the pipeline
//! requires, turning CLI flags into "which intermediate artifact to
//! print", and rendering the closed error taxonomy as a diagnostic with a
//! source snippet and caret.

mod cli;
mod error;
mod pipeline;

pub use cli::{Cli, OptStage};
pub use error::DriverError;
pub use pipeline::{render_colors, render_symbol_table, render_tokens, run, write_tokens, PipelineOutput};

use clap::Parser as _;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tacc_util::Diagnostic;

/// Parses CLI arguments, runs the pipeline, and prints whatever was asked
/// for. Returns the process exit code (`0` on success, `1` on any typed
/// error) rather than calling `std::process::exit` itself, so `main` stays
/// a one-liner and tests can call this directly.
pub fn main() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_cli(&cli) {
        Ok(()) => 0,
        Err(err) => {
            report(&cli, &err);
            1
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };
    let subscriber = fmt::layer().with_target(false).with_thread_ids(false).with_thread_names(false);
    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}

fn run_cli(cli: &Cli) -> Result<(), DriverError> {
    let source = std::fs::read_to_string(&cli.input).map_err(|source| DriverError::Io { path: cli.input.clone(), source })?;

    let output = run(&source, |phase| tracing::debug!(phase = %phase, "running compiler phase"))?;

    let token_listing = render_tokens(&output.tokens);
    write_tokens(&cli.write_path, &token_listing)?;

    if cli.tokens {
        print!("{token_listing}");
    }
    if cli.ast {
        println!("{:#?}", output.ast);
    }
    if cli.symbols {
        print!("{}", render_symbol_table(&output.symbols));
    }
    match cli.opt_dump {
        Some(OptStage::BeforeOptimization) => print!("{}", output.tac_before_optimization.pretty_print()),
        Some(OptStage::AfterConstantFold) => print!("{}", output.tac_after_fold.pretty_print()),
        Some(OptStage::AfterFixpoint) => print!("{}", output.tac_after_fixpoint.pretty_print()),
        None => {}
    }
    if cli.regalloc {
        print!("{}", render_colors(&output.colors));
    }
    if cli.asm {
        print!("{}", output.asm);
    }

    Ok(())
}

/// Prints a typed compiler error to stderr, with a source snippet and
/// caret when the failing stage named a token.
fn report(cli: &Cli, err: &DriverError) {
    let source = std::fs::read_to_string(&cli.input).ok();
    let token = err.token();
    let mut diag = Diagnostic::new(err.kind(), err.to_string());
    if let Some(token) = &token {
        diag = diag.with_token(token);
    }
    if let Some(source) = &source {
        diag = diag.with_source(source);
    }
    eprintln!("error: {diag}");
}
