use tacc_util::Token;
use thiserror::Error;

/// Errors raised while scanning source text into tokens.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("unrecognized character '{ch}'")]
    UnrecognizedChar { ch: char, line: usize, column: usize },

    #[error("unterminated string literal")]
    UnterminatedString { line: usize, column: usize },

    #[error("unterminated character literal")]
    UnterminatedChar { line: usize, column: usize },

    #[error("unterminated block comment")]
    UnterminatedBlockComment { line: usize, column: usize },
}

impl LexError {
    /// A synthetic token naming the position of the error, for diagnostic
    /// rendering by the driver.
    pub fn token(&self) -> Token {
        let (line, column) = match self {
            LexError::UnrecognizedChar { line, column, .. }
            | LexError::UnterminatedString { line, column }
            | LexError::UnterminatedChar { line, column }
            | LexError::UnterminatedBlockComment { line, column } => (*line, *column),
        };
        Token::new(tacc_util::TokenKind::Eof, "", line, column)
    }
}
