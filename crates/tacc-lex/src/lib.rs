//! tacc-lex — lexical scanner for the restricted C dialect
//!
//! A conventional hand-written scanner: skip whitespace/comments, then
//! dispatch on the current byte to produce one [`Token`]. Nothing here
//! is part of the "hard core" the rest of the workspace exists to
//! showcase (see the crate root docs of `tacc-tac`); it exists so the
//! pipeline has a front door.

mod cursor;
mod error;

use cursor::Cursor;
pub use error::LexError;
use tacc_util::{Token, TokenKind};

pub type LexResult<T> = Result<T, LexError>;

/// Scans an entire source string into a token stream terminated by EOF.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Tokenize the whole source, returning every token including the
    /// trailing EOF.
    pub fn tokenize(source: &'a str) -> LexResult<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> LexResult<Token> {
        self.skip_trivia()?;

        let line = self.cursor.line();
        let column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(Token::eof(line, column));
        }

        let c = self.cursor.current() as char;

        if c.is_ascii_digit() {
            return Ok(self.lex_number(line, column));
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.lex_identifier(line, column));
        }
        if c == '"' {
            return self.lex_string(line, column);
        }
        if c == '\'' {
            return self.lex_char(line, column);
        }

        self.lex_operator(line, column)
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            match self.cursor.current() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.cursor.advance();
                }
                b'/' if self.cursor.peek_at(1) == b'/' => {
                    while !self.cursor.is_at_end() && self.cursor.current() != b'\n' {
                        self.cursor.advance();
                    }
                }
                b'/' if self.cursor.peek_at(1) == b'*' => {
                    let line = self.cursor.line();
                    let column = self.cursor.column();
                    self.cursor.advance();
                    self.cursor.advance();
                    let mut closed = false;
                    while !self.cursor.is_at_end() {
                        if self.cursor.current() == b'*' && self.cursor.peek_at(1) == b'/' {
                            self.cursor.advance();
                            self.cursor.advance();
                            closed = true;
                            break;
                        }
                        self.cursor.advance();
                    }
                    if !closed {
                        return Err(LexError::UnterminatedBlockComment { line, column });
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Token {
        let mut lexeme = String::new();
        while self.cursor.current().is_ascii_digit() {
            lexeme.push(self.cursor.advance() as char);
        }
        Token::new(TokenKind::Number, lexeme, line, column)
    }

    fn lex_identifier(&mut self, line: usize, column: usize) -> Token {
        let mut lexeme = String::new();
        while {
            let c = self.cursor.current() as char;
            c.is_ascii_alphanumeric() || c == '_'
        } {
            lexeme.push(self.cursor.advance() as char);
        }
        let kind = TokenKind::keyword(&lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, line, column)
    }

    fn lex_string(&mut self, line: usize, column: usize) -> LexResult<Token> {
        self.cursor.advance(); // opening quote
        let mut lexeme = String::new();
        loop {
            if self.cursor.is_at_end() || self.cursor.current() == b'\n' {
                return Err(LexError::UnterminatedString { line, column });
            }
            if self.cursor.current() == b'"' {
                self.cursor.advance();
                break;
            }
            if self.cursor.current() == b'\\' {
                lexeme.push(self.cursor.advance() as char);
                if self.cursor.is_at_end() {
                    return Err(LexError::UnterminatedString { line, column });
                }
            }
            lexeme.push(self.cursor.advance() as char);
        }
        Ok(Token::new(TokenKind::StringLiteral, lexeme, line, column))
    }

    fn lex_char(&mut self, line: usize, column: usize) -> LexResult<Token> {
        self.cursor.advance(); // opening quote
        let mut lexeme = String::new();
        loop {
            if self.cursor.is_at_end() || self.cursor.current() == b'\n' {
                return Err(LexError::UnterminatedChar { line, column });
            }
            if self.cursor.current() == b'\'' {
                self.cursor.advance();
                break;
            }
            if self.cursor.current() == b'\\' {
                lexeme.push(self.cursor.advance() as char);
                if self.cursor.is_at_end() {
                    return Err(LexError::UnterminatedChar { line, column });
                }
            }
            lexeme.push(self.cursor.advance() as char);
        }
        Ok(Token::new(TokenKind::CharLiteral, lexeme, line, column))
    }

    fn lex_operator(&mut self, line: usize, column: usize) -> LexResult<Token> {
        use TokenKind::*;

        // Longest-match-first over the punctuator/operator table.
        let three = self.peek_str(3);
        if three == "<<=" {
            return Ok(self.take(3, LShiftAssign, line, column));
        }
        if three == ">>=" {
            return Ok(self.take(3, RShiftAssign, line, column));
        }

        let two = self.peek_str(2);
        let two_kind = match two.as_str() {
            "++" => Some(Increment),
            "--" => Some(Decrement),
            "<=" => Some(LessThanEqual),
            ">=" => Some(GreaterThanEqual),
            "==" => Some(Equal),
            "!=" => Some(NotEqual),
            "&&" => Some(LogAnd),
            "||" => Some(LogOr),
            "<<" => Some(LeftShift),
            ">>" => Some(RightShift),
            "+=" => Some(PlusAssign),
            "-=" => Some(MinusAssign),
            "*=" => Some(MultAssign),
            "/=" => Some(DivAssign),
            "%=" => Some(ModAssign),
            "&=" => Some(AndAssign),
            "|=" => Some(OrAssign),
            "^=" => Some(XorAssign),
            _ => None,
        };
        if let Some(kind) = two_kind {
            return Ok(self.take(2, kind, line, column));
        }

        let c = self.cursor.current() as char;
        let one_kind = match c {
            '+' => Plus,
            '-' => Minus,
            '*' => Multiply,
            '/' => Divide,
            '%' => Modulus,
            '<' => LessThan,
            '>' => GreaterThan,
            '=' => Assign,
            '!' => LogNot,
            '&' => BitAnd,
            '|' => BitOr,
            '^' => BitXor,
            '~' => BitNot,
            '[' => LBrack,
            ']' => RBrack,
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            ',' => Comma,
            ':' => Colon,
            ';' => Semicolon,
            '#' => Preproc,
            '.' => Dot,
            other => return Err(LexError::UnrecognizedChar { ch: other, line, column }),
        };
        Ok(self.take(1, one_kind, line, column))
    }

    fn peek_str(&self, len: usize) -> String {
        (0..len)
            .map(|i| self.cursor.peek_at(i) as char)
            .collect()
    }

    fn take(&mut self, n: usize, kind: TokenKind, line: usize, column: usize) -> Token {
        let mut lexeme = String::with_capacity(n);
        for _ in 0..n {
            lexeme.push(self.cursor.advance() as char);
        }
        Token::new(kind, lexeme, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_a_minimal_function() {
        let kinds = kinds("int main() { return 0; }");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn longest_match_wins_for_compound_operators() {
        let toks = Lexer::tokenize("a <<= 1").unwrap();
        assert_eq!(toks[1].kind, TokenKind::LShiftAssign);
        assert_eq!(toks[1].lexeme, "<<=");
    }

    #[test]
    fn line_comments_are_skipped() {
        let toks = Lexer::tokenize("int x; // trailing comment\nint y;").unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let err = Lexer::tokenize("int x; /* never closed").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedBlockComment { .. }));
    }

    #[test]
    fn relexing_is_deterministic() {
        let src = "int main() { int x = 2 + 3 * 4; return x; }";
        let first = Lexer::tokenize(src).unwrap();
        let second = Lexer::tokenize(src).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tracks_line_and_column() {
        let toks = Lexer::tokenize("int x;\nint y;").unwrap();
        // second `int` starts on line 1 (0-indexed), column 0.
        let second_int = &toks[3];
        assert_eq!(second_int.kind, TokenKind::Int);
        assert_eq!(second_int.line, 1);
        assert_eq!(second_int.column, 0);
    }
}
