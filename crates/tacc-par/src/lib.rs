//! tacc-par — AST definitions and the parser for the restricted C dialect.
//!
//! Recursive descent for statements and declarations, Pratt (operator
//! precedence climbing) for expressions. `None`-returning helpers in the
//! source this was ported from become `Result`s here; everything else —
//! the grammar shape, the precedence table, the prefix/postfix operator
//! sets — is unchanged.

pub mod ast;
mod error;

pub use error::ParserError;

use ast::*;
use tacc_util::{Token, TokenKind};

pub type ParseResult<T> = Result<T, ParserError>;

/// Binding powers for the Pratt expression parser, lowest to highest.
/// Assignment is right-associative (`a = b = c` parses as `a = (b = c)`);
/// every other level is left-associative.
mod prec {
    pub const COMMA: u8 = 0;
    pub const ASSIGNMENT: u8 = 2;
    pub const LOGICAL_OR: u8 = 4;
    pub const LOGICAL_AND: u8 = 6;
    pub const BITWISE_OR: u8 = 8;
    pub const BITWISE_XOR: u8 = 10;
    pub const BITWISE_AND: u8 = 12;
    pub const EQUALITY: u8 = 14;
    pub const RELATIONAL: u8 = 16;
    pub const SHIFT: u8 = 18;
    pub const ADDITIVE: u8 = 20;
    pub const MULTIPLICATIVE: u8 = 22;
    pub const PREFIX: u8 = 24;
}

fn infix_precedence(kind: TokenKind) -> Option<u8> {
    use TokenKind::*;
    Some(match kind {
        Assign | PlusAssign | MinusAssign | MultAssign | DivAssign | ModAssign | AndAssign
        | OrAssign | XorAssign | LShiftAssign | RShiftAssign => prec::ASSIGNMENT,
        LogOr => prec::LOGICAL_OR,
        LogAnd => prec::LOGICAL_AND,
        BitOr => prec::BITWISE_OR,
        BitXor => prec::BITWISE_XOR,
        BitAnd => prec::BITWISE_AND,
        Equal | NotEqual => prec::EQUALITY,
        LessThan | GreaterThan | LessThanEqual | GreaterThanEqual => prec::RELATIONAL,
        LeftShift | RightShift => prec::SHIFT,
        Plus | Minus => prec::ADDITIVE,
        Multiply | Divide | Modulus => prec::MULTIPLICATIVE,
        _ => return None,
    })
}

fn is_assignment(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Assign
            | PlusAssign
            | MinusAssign
            | MultAssign
            | DivAssign
            | ModAssign
            | AndAssign
            | OrAssign
            | XorAssign
            | LShiftAssign
            | RShiftAssign
    )
}

fn is_prefix_operator(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(kind, Plus | Minus | LogNot | BitNot | Increment | Decrement)
}

fn is_postfix_operator(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(kind, LParen | Dot | Increment | Decrement)
}

/// Storage-class/qualifier keywords that may prefix a type specifier.
fn is_declaration_specifier(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(kind, Auto | Const | Extern | Register | Static | Typedef | Volatile)
}

/// Base type keywords. Only `int` survives semantic analysis but the
/// grammar accepts the full restricted-C type-specifier set so the
/// analyzer can name the offending specifier in its diagnostic.
fn is_type_specifier(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Char | Double | Float | Int | Long | Short | Signed | Unsigned | Void | Struct | Union
            | Enum
    )
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(tokens: Vec<Token>) -> ParseResult<Program> {
        Parser::new(tokens).parse_program()
    }

    // ---- token stream helpers ----

    fn cur(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos + 1)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn advance(&mut self) -> Token {
        let tok = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.cur().kind)
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.cur().kind != kind {
            return Err(ParserError::new(
                format!("expected {kind:?}, found {:?} ('{}')", self.cur().kind, self.cur().lexeme),
                self.cur().clone(),
            ));
        }
        Ok(self.advance())
    }

    fn unexpected(&self) -> ParserError {
        ParserError::new(
            format!("unexpected token {:?} ('{}')", self.cur().kind, self.cur().lexeme),
            self.cur().clone(),
        )
    }

    // ---- program / top level ----

    fn parse_program(&mut self) -> ParseResult<Program> {
        let mut units = Vec::new();
        while !self.at(TokenKind::Eof) {
            units.push(self.translation_unit()?);
        }
        Ok(Program { units })
    }

    fn translation_unit(&mut self) -> ParseResult<TopLevel> {
        let start = self.pos;
        match self.function() {
            Ok(item) => return Ok(item),
            Err(_) => self.pos = start,
        }
        self.declaration_statement().map(TopLevel::Declaration)
    }

    fn declaration_types(&mut self) -> ParseResult<DeclarationTypes> {
        let mut specifiers = Vec::new();
        while is_declaration_specifier(self.cur().kind) {
            specifiers.push(self.advance());
        }
        if !is_type_specifier(self.cur().kind) {
            return Err(self.unexpected());
        }
        let base = self.advance();
        Ok(DeclarationTypes { specifiers, base })
    }

    fn declaration_statement(&mut self) -> ParseResult<DeclarationStatement> {
        let decl_type = self.declaration_types()?;
        let declarations = self.var_declaration_list()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(DeclarationStatement { decl_type, declarations })
    }

    fn var_declaration_list(&mut self) -> ParseResult<Vec<VarDeclaration>> {
        let mut list = vec![self.var_declaration()?];
        while self.at(TokenKind::Comma) {
            self.advance();
            list.push(self.var_declaration()?);
        }
        Ok(list)
    }

    fn var_declaration(&mut self) -> ParseResult<VarDeclaration> {
        let name = self.expect(TokenKind::Identifier)?;
        let initializer = if self.at(TokenKind::Assign) {
            self.advance();
            Some(self.expression(prec::COMMA + 1)?)
        } else {
            None
        };
        Ok(VarDeclaration { name, initializer })
    }

    fn function(&mut self) -> ParseResult<TopLevel> {
        let decl_type = self.declaration_types()?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::LParen)?;
        let params = if self.at(TokenKind::RParen) {
            Vec::new()
        } else {
            self.function_param_list()?
        };
        self.expect(TokenKind::RParen)?;

        if self.at(TokenKind::Semicolon) {
            self.advance();
            return Ok(TopLevel::FunctionDeclaration(FunctionDeclaration {
                return_type: decl_type,
                name,
                params,
            }));
        }
        let body = self.compound_statement()?;
        Ok(TopLevel::FunctionDefinition(FunctionDefinition {
            return_type: decl_type,
            name,
            params,
            body,
        }))
    }

    fn function_param_list(&mut self) -> ParseResult<Vec<ParamDeclaration>> {
        let mut params = vec![self.param_declaration()?];
        while self.at(TokenKind::Comma) {
            self.advance();
            params.push(self.param_declaration()?);
        }
        Ok(params)
    }

    fn param_declaration(&mut self) -> ParseResult<ParamDeclaration> {
        let decl_type = self.declaration_types()?;
        let name = if self.at(TokenKind::Identifier) {
            Some(self.expect(TokenKind::Identifier)?)
        } else {
            None
        };
        Ok(ParamDeclaration { decl_type, name })
    }

    // ---- statements ----

    fn compound_statement(&mut self) -> ParseResult<CompoundStatement> {
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if is_declaration_specifier(self.cur().kind) || is_type_specifier(self.cur().kind) {
                items.push(Stmt::Declaration(self.declaration_statement()?));
                continue;
            }
            items.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(CompoundStatement { items })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.cur().kind {
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Do => self.do_while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Goto => self.goto_statement(),
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Continue)
            }
            // label needs to be checked before a bare expression statement,
            // otherwise the identifier is swallowed as an expression.
            TokenKind::Identifier if self.peek().kind == TokenKind::Colon => self.label_statement(),
            TokenKind::LBrace => Ok(Stmt::Compound(self.compound_statement()?)),
            _ => self.expr_statement(),
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.expression(prec::COMMA)?;
        self.expect(TokenKind::RParen)?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.at(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStatement { condition, then_branch, else_branch }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.expression(prec::COMMA)?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(WhileStatement { condition, body }))
    }

    fn do_while_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.statement()?);
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.expression(prec::COMMA)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::DoWhile(DoWhileStatement { body, condition }))
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let initializer = if self.at(TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            let start = self.pos;
            match self.declaration_statement() {
                Ok(decl) => Some(ForInit::Declaration(decl)),
                Err(_) => {
                    self.pos = start;
                    let expr = self.expression(prec::COMMA)?;
                    self.expect(TokenKind::Semicolon)?;
                    Some(ForInit::Expression(ExpressionStatement { expression: Some(expr) }))
                }
            }
        };

        let condition = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression(prec::COMMA)?)
        };
        self.expect(TokenKind::Semicolon)?;

        let increment = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.expression(prec::COMMA)?)
        };
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::For(ForStatement { initializer, condition, increment, body }))
    }

    fn switch_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Switch)?;
        self.expect(TokenKind::LParen)?;
        let expression = self.expression(prec::COMMA)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let mut sections = Vec::new();
        while !self.at(TokenKind::RBrace) {
            sections.push(self.switch_section()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Switch(SwitchStatement { expression, sections }))
    }

    fn switch_section(&mut self) -> ParseResult<SwitchSection> {
        let mut labels = vec![self.switch_label()?];
        while self.at_any(&[TokenKind::Case, TokenKind::Default]) {
            labels.push(self.switch_label()?);
        }
        let mut items = Vec::new();
        while !self.at_any(&[TokenKind::Case, TokenKind::Default, TokenKind::RBrace]) {
            items.push(self.statement()?);
        }
        Ok(SwitchSection { labels, items })
    }

    fn switch_label(&mut self) -> ParseResult<SwitchLabel> {
        if self.at(TokenKind::Case) {
            let token = self.advance();
            let expression = self.expression(prec::COMMA)?;
            self.expect(TokenKind::Colon)?;
            return Ok(SwitchLabel::Case { token, expression });
        }
        let token = self.expect(TokenKind::Default)?;
        self.expect(TokenKind::Colon)?;
        Ok(SwitchLabel::Default { token })
    }

    fn expr_statement(&mut self) -> ParseResult<Stmt> {
        if self.at(TokenKind::Semicolon) {
            self.advance();
            return Ok(Stmt::Expr(ExpressionStatement::default()));
        }
        let expr = self.expression(prec::COMMA)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Expr(ExpressionStatement { expression: Some(expr) }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Return)?;
        let expression = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression(prec::COMMA)?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return(ReturnStatement { expression }))
    }

    fn goto_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Goto)?;
        let label = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Goto(GotoStatement { label }))
    }

    fn label_statement(&mut self) -> ParseResult<Stmt> {
        let label = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Colon)?;
        let statement = Box::new(self.statement()?);
        Ok(Stmt::Label(LabelStatement { label, statement }))
    }

    // ---- expressions: Pratt parsing ----

    fn expression(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut node = self.parse_prefix()?;
        loop {
            let kind = self.cur().kind;
            if is_postfix_operator(kind) {
                node = self.apply_postfix(node)?;
                continue;
            }
            let prec = match infix_precedence(kind) {
                Some(p) => p,
                None => break,
            };
            if prec < min_prec {
                break;
            }
            let operator = self.advance();
            let next_prec = if is_assignment(kind) { prec } else { prec + 1 };
            let right = self.expression(next_prec)?;
            node = if is_assignment(kind) {
                Expr::Assignment(AssignmentExpr {
                    operator,
                    left: Box::new(node),
                    right: Box::new(right),
                })
            } else {
                Expr::Binary(BinaryExpr {
                    operator,
                    left: Box::new(node),
                    right: Box::new(right),
                })
            };
        }
        Ok(node)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        if is_prefix_operator(self.cur().kind) {
            let operator = self.advance();
            let operand = self.expression(prec::PREFIX)?;
            return Ok(Expr::Prefix(PrefixExpr { operator, operand: Box::new(operand) }));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.cur().kind {
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression(prec::COMMA)?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Number | TokenKind::StringLiteral | TokenKind::CharLiteral => {
                Ok(Expr::Literal(self.advance()))
            }
            TokenKind::Identifier => Ok(Expr::Identifier(self.advance())),
            _ => Err(self.unexpected()),
        }
    }

    fn apply_postfix(&mut self, node: Expr) -> ParseResult<Expr> {
        match self.cur().kind {
            TokenKind::LParen => self.function_call(node),
            TokenKind::Dot => {
                self.advance();
                let property = self.expect(TokenKind::Identifier)?;
                Ok(Expr::Member(MemberExpr { object: Box::new(node), property }))
            }
            TokenKind::Increment | TokenKind::Decrement => {
                let operator = self.advance();
                Ok(Expr::Postfix(PostfixExpr { operator, operand: Box::new(node) }))
            }
            _ => Ok(node),
        }
    }

    fn function_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let mut arguments = Vec::new();
        if !self.at(TokenKind::RParen) {
            arguments.push(self.expression(prec::COMMA + 1)?);
            while self.at(TokenKind::Comma) {
                self.advance();
                arguments.push(self.expression(prec::COMMA + 1)?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Expr::Call(CallExpr { callee: Box::new(callee), arguments }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacc_lex::Lexer;

    fn parse(src: &str) -> ParseResult<Program> {
        let tokens = Lexer::tokenize(src).unwrap();
        Parser::parse(tokens)
    }

    #[test]
    fn parses_minimal_function() {
        let program = parse("int main() { return 0; }").unwrap();
        assert_eq!(program.units.len(), 1);
        assert!(matches!(program.units[0], TopLevel::FunctionDefinition(_)));
    }

    #[test]
    fn parses_function_declaration_without_body() {
        let program = parse("int helper(int x);").unwrap();
        match &program.units[0] {
            TopLevel::FunctionDeclaration(decl) => assert_eq!(decl.params.len(), 1),
            other => panic!("expected function declaration, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse("int main() { int a, b, c; a = b = c; return 0; }").unwrap();
        let TopLevel::FunctionDefinition(def) = &program.units[0] else { panic!() };
        let Stmt::Expr(stmt) = &def.body.items[1] else { panic!() };
        let Expr::Assignment(outer) = stmt.expression.as_ref().unwrap() else { panic!() };
        assert!(matches!(*outer.right, Expr::Assignment(_)));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse("int main() { return 2 + 3 * 4; }").unwrap();
        let TopLevel::FunctionDefinition(def) = &program.units[0] else { panic!() };
        let Stmt::Return(ret) = &def.body.items[0] else { panic!() };
        let Expr::Binary(top) = ret.expression.as_ref().unwrap() else { panic!() };
        assert_eq!(top.operator.kind, TokenKind::Plus);
        assert!(matches!(*top.right, Expr::Binary(_)));
    }

    #[test]
    fn do_while_requires_trailing_semicolon() {
        let err = parse("int main() { do { x = 1; } while (x) }").unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn identifier_followed_by_colon_is_a_label_not_an_expression() {
        let program = parse("int main() { start: return 0; }").unwrap();
        let TopLevel::FunctionDefinition(def) = &program.units[0] else { panic!() };
        assert!(matches!(def.body.items[0], Stmt::Label(_)));
    }

    #[test]
    fn for_loop_parses_all_three_clauses() {
        let program = parse("int main() { for (int i = 0; i; i = i + 1) { } return 0; }").unwrap();
        let TopLevel::FunctionDefinition(def) = &program.units[0] else { panic!() };
        let Stmt::For(for_stmt) = &def.body.items[0] else { panic!() };
        assert!(matches!(for_stmt.initializer, Some(ForInit::Declaration(_))));
        assert!(for_stmt.condition.is_some());
        assert!(for_stmt.increment.is_some());
    }

    #[test]
    fn switch_collects_fallthrough_case_labels() {
        let program = parse(
            "int main() { int x; switch (x) { case 1: case 2: x = 1; break; default: x = 0; } return x; }",
        )
        .unwrap();
        let TopLevel::FunctionDefinition(def) = &program.units[0] else { panic!() };
        let Stmt::Switch(sw) = &def.body.items[1] else { panic!() };
        assert_eq!(sw.sections[0].labels.len(), 2);
        assert_eq!(sw.sections.len(), 2);
    }

    #[test]
    fn call_arguments_do_not_consume_a_top_level_assignment_as_comma_operator() {
        let program = parse("int main() { return f(1, 2, 3); }").unwrap();
        let TopLevel::FunctionDefinition(def) = &program.units[0] else { panic!() };
        let Stmt::Return(ret) = &def.body.items[0] else { panic!() };
        let Expr::Call(call) = ret.expression.as_ref().unwrap() else { panic!() };
        assert_eq!(call.arguments.len(), 3);
    }
}
