//! The closed error taxonomy's final aggregation point.
//!
//! Every stage crate defines its own error enum; this one wraps each via
//! `#[from]`, exactly as the pipeline is wired in `run_pipeline` below.
//! Any variant here is a typed, terminating failure: the driver prints it
//! and exits with code 1.

use std::path::PathBuf;

use tacc_sem::AnalysisError;
use tacc_util::Token;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("could not read '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error(transparent)]
    Lexer(#[from] tacc_lex::LexError),

    #[error(transparent)]
    Parser(#[from] tacc_par::ParserError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Tac(#[from] tacc_tac::TacError),

    #[error(transparent)]
    Asm(#[from] tacc_gen::AsmError),
}

impl DriverError {
    /// The taxonomy name used by the diagnostic renderer and by tests that
    /// assert on which stage failed.
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::Io { .. } => "IoError",
            DriverError::Lexer(_) => "LexerError",
            DriverError::Parser(_) => "ParserError",
            DriverError::Analysis(AnalysisError::SymbolTable(_)) => "SymbolTableError",
            DriverError::Analysis(AnalysisError::Semantic(_)) => "SemanticError",
            DriverError::Tac(_) => "TACError",
            DriverError::Asm(_) => "ASMError",
        }
    }

    /// The offending token, when the failing stage could name one. Whole-
    /// program errors (an escaped global scope, a bare redeclaration) have
    /// none, so the diagnostic renderer falls back to a bare message.
    pub fn token(&self) -> Option<Token> {
        match self {
            DriverError::Io { .. } => None,
            DriverError::Lexer(e) => Some(e.token()),
            DriverError::Parser(e) => Some(e.token().clone()),
            DriverError::Analysis(AnalysisError::SymbolTable(_)) => None,
            DriverError::Analysis(AnalysisError::Semantic(e)) => Some(e.token().clone()),
            DriverError::Tac(e) => e.token(),
            DriverError::Asm(e) => e.token(),
        }
    }
}
