use tacc_util::Token;
use thiserror::Error;

/// Raised when the token stream does not match any production at the
/// current position.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParserError {
    pub message: String,
    pub token: Token,
}

impl ParserError {
    pub fn new(message: impl Into<String>, token: Token) -> Self {
        Self {
            message: message.into(),
            token,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}
