//! AST node definitions for the restricted C dialect.
//!
//! A tagged tree rather than a class hierarchy: every later stage
//! dispatches on these variants directly. Expression subtrees only ever
//! hold [`Token`]s or further [`Expr`] nodes — there is no way to build
//! a dangling reference into the tree.

use tacc_util::Token;

/// Root of a parsed translation unit: an ordered sequence of top-level items.
#[derive(Debug, Clone)]
pub struct Program {
    pub units: Vec<TopLevel>,
}

#[derive(Debug, Clone)]
pub enum TopLevel {
    FunctionDefinition(FunctionDefinition),
    FunctionDeclaration(FunctionDeclaration),
    Declaration(DeclarationStatement),
}

#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub return_type: DeclarationTypes,
    pub name: Token,
    pub params: Vec<ParamDeclaration>,
    pub body: CompoundStatement,
}

#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub return_type: DeclarationTypes,
    pub name: Token,
    pub params: Vec<ParamDeclaration>,
}

/// A run of declaration specifiers (`static`, `const`, ...) followed by the
/// base type specifier (`int`, `char`, ...). Only `int` survives semantic
/// analysis; the rest are recognized so diagnostics can name the offender.
#[derive(Debug, Clone)]
pub struct DeclarationTypes {
    pub specifiers: Vec<Token>,
    pub base: Token,
}

#[derive(Debug, Clone)]
pub struct ParamDeclaration {
    pub decl_type: DeclarationTypes,
    pub name: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct DeclarationStatement {
    pub decl_type: DeclarationTypes,
    pub declarations: Vec<VarDeclaration>,
}

#[derive(Debug, Clone)]
pub struct VarDeclaration {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Compound(CompoundStatement),
    Declaration(DeclarationStatement),
    If(IfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    For(ForStatement),
    Switch(SwitchStatement),
    Return(ReturnStatement),
    Goto(GotoStatement),
    Break,
    Continue,
    Label(LabelStatement),
    Expr(ExpressionStatement),
}

#[derive(Debug, Clone, Default)]
pub struct CompoundStatement {
    pub items: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct DoWhileStatement {
    pub body: Box<Stmt>,
    pub condition: Expr,
}

/// `for` initializer is either a full declaration or a bare expression
/// statement — this mirrors a deliberate asymmetry in how each later
/// interacts with the enclosing initialization-tracking set (see
/// `tacc-sem`).
#[derive(Debug, Clone)]
pub enum ForInit {
    Declaration(DeclarationStatement),
    Expression(ExpressionStatement),
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub initializer: Option<ForInit>,
    pub condition: Option<Expr>,
    pub increment: Option<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct SwitchStatement {
    pub expression: Expr,
    pub sections: Vec<SwitchSection>,
}

#[derive(Debug, Clone)]
pub struct SwitchSection {
    pub labels: Vec<SwitchLabel>,
    pub items: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum SwitchLabel {
    Case { token: Token, expression: Expr },
    Default { token: Token },
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub expression: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct GotoStatement {
    pub label: Token,
}

#[derive(Debug, Clone)]
pub struct LabelStatement {
    pub label: Token,
    pub statement: Box<Stmt>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionStatement {
    pub expression: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Identifier(Token),
    Literal(Token),
    Assignment(AssignmentExpr),
    Binary(BinaryExpr),
    Prefix(PrefixExpr),
    Postfix(PostfixExpr),
    Call(CallExpr),
    Member(MemberExpr),
}

#[derive(Debug, Clone)]
pub struct AssignmentExpr {
    pub operator: Token,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub operator: Token,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct PrefixExpr {
    pub operator: Token,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct PostfixExpr {
    pub operator: Token,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub property: Token,
}
