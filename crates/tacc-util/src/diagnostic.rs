//! Rendering a compiler error against its originating source text.
//!
//! Every stage error in the closed taxonomy carries an optional [`Token`]
//! naming the offending position. This module turns that into the
//! familiar `file:line:col` plus source-line-and-caret rendering used by
//! the driver when it prints a fatal error to stderr.

use crate::token::Token;
use std::fmt;

/// A rendered diagnostic, ready to print.
pub struct Diagnostic<'a> {
    pub kind: &'static str,
    pub message: String,
    pub token: Option<&'a Token>,
    pub source: Option<&'a str>,
}

impl<'a> Diagnostic<'a> {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            token: None,
            source: None,
        }
    }

    pub fn with_token(mut self, token: &'a Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(token) = self.token else {
            return write!(f, "{}: {}", self.kind, self.message);
        };

        // Tokens are produced with 0-indexed lines; reported line numbers
        // are 1-indexed for a human reader.
        writeln!(
            f,
            "{} at line {}, column {}:",
            self.kind,
            token.line + 1,
            token.column
        )?;
        writeln!(f, "  {}", self.message)?;

        if let Some(source_line) = self.source.and_then(|s| s.lines().nth(token.line)) {
            writeln!(f)?;
            writeln!(f, "  {} | {}", token.line + 1, source_line)?;
            write!(f, "      | {}^", " ".repeat(token.column))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn renders_without_token() {
        let diag = Diagnostic::new("LexerError", "unrecognized character");
        assert_eq!(format!("{diag}"), "LexerError: unrecognized character");
    }

    #[test]
    fn renders_with_caret_under_column() {
        let tok = Token::new(TokenKind::Identifier, "x", 0, 4);
        let diag = Diagnostic::new("SemanticError", "used before being initialized")
            .with_token(&tok)
            .with_source("int main() { return x; }");
        let rendered = format!("{diag}");
        assert!(rendered.contains("line 1, column 4"));
        assert!(rendered.contains("int main()"));
        assert!(rendered.ends_with('^'));
    }
}
