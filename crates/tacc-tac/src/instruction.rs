//! The three-address-code instruction model.
//!
//! An [`Instruction`] is a fixed four-slot record (`res`, `left`, `right`,
//! `op`) whose interpretation depends on its [`InstrKind`] tag — see the
//! encoding table this mirrors. Keeping every instruction the same shape,
//! rather than one enum variant per kind with its own fields, is what lets
//! every optimizer pass walk a function's instructions uniformly instead
//! of matching out each kind's unique layout first.

use std::fmt;
use tacc_util::{define_index, Token, TokenKind};

define_index!(
    /// Identifies a basic block within one function's block list.
    pub struct BlockId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrKind {
    Decl,
    Assign,
    Param,
    Call,
    Label,
    Goto,
    If,
    While,
    For,
    Return,
}

/// A single three-address instruction.
///
/// Field occupancy by kind (see the crate-level encoding table):
/// - `Decl`: `res` = declared name, `left` = initializer value or none.
/// - `Assign`: `res` = target name, `left`/`right` = operands, `op` =
///   the source operator or none for a pure copy.
/// - `Param`: `res` = the literal `param` marker token, `left` = the
///   argument value.
/// - `Call`: `res` = return temp, `left` = callee name, `op` = `call`.
/// - `Label`: `res` = the label name, `op` = the `label` marker.
/// - `Goto`: `res` = target label, `op` = the `goto` marker.
/// - `If`/`While`/`For`: `res` = condition, `left` = true/body label,
///   `right` = false/exit label, `op` names which of the three this is.
/// - `Return`: `res` = the returned value, or none for a bare `return;`.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub kind: InstrKind,
    pub res: Option<Token>,
    pub left: Option<Token>,
    pub right: Option<Token>,
    pub op: Option<Token>,
}

impl Instruction {
    pub fn decl(name: Token, initializer: Option<Token>) -> Self {
        Self { kind: InstrKind::Decl, res: Some(name), left: initializer, right: None, op: None }
    }

    pub fn assign(target: Token, left: Token, right: Option<Token>, op: Option<Token>) -> Self {
        Self { kind: InstrKind::Assign, res: Some(target), left: Some(left), right, op }
    }

    pub fn param(value: Token) -> Self {
        Self {
            kind: InstrKind::Param,
            res: Some(Token::synthetic(TokenKind::Param, "param")),
            left: Some(value),
            right: None,
            op: None,
        }
    }

    pub fn call(result_temp: Token, callee: Token) -> Self {
        Self {
            kind: InstrKind::Call,
            res: Some(result_temp),
            left: Some(callee),
            right: None,
            op: Some(Token::synthetic(TokenKind::Call, "call")),
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: InstrKind::Label,
            res: Some(Token::synthetic(TokenKind::Label, name)),
            left: None,
            right: None,
            op: Some(Token::synthetic(TokenKind::Label, "label")),
        }
    }

    pub fn goto(target: impl Into<String>) -> Self {
        Self {
            kind: InstrKind::Goto,
            res: Some(Token::synthetic(TokenKind::Label, target.into())),
            left: None,
            right: None,
            op: Some(Token::synthetic(TokenKind::Goto, "goto")),
        }
    }

    pub fn branch(kind: InstrKind, condition: Token, true_label: impl Into<String>, false_label: impl Into<String>) -> Self {
        let marker = match kind {
            InstrKind::If => Token::synthetic(TokenKind::IfStmt, "if"),
            InstrKind::While => Token::synthetic(TokenKind::WhileStmt, "while"),
            InstrKind::For => Token::synthetic(TokenKind::ForStmt, "for"),
            _ => unreachable!("branch() only builds If/While/For instructions"),
        };
        Self {
            kind,
            res: Some(condition),
            left: Some(Token::synthetic(TokenKind::Label, true_label.into())),
            right: Some(Token::synthetic(TokenKind::Label, false_label.into())),
            op: Some(marker),
        }
    }

    pub fn ret(value: Option<Token>) -> Self {
        Self { kind: InstrKind::Return, res: value, left: None, right: None, op: Some(Token::synthetic(TokenKind::Return, "return")) }
    }

    /// True for instructions that end a basic block: every kind except
    /// `Decl`/`Assign`/`Param`/`Call`/`Label` may terminate a block, but in
    /// practice only `Goto`/`If`/`While`/`For`/`Return` ever appear last.
    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, InstrKind::Goto | InstrKind::If | InstrKind::While | InstrKind::For | InstrKind::Return)
    }

    pub fn is_label(&self) -> bool {
        self.kind == InstrKind::Label
    }

    /// The label this instruction's `res` names, for `Label`/`Goto`.
    pub fn label_name(&self) -> Option<&str> {
        match self.kind {
            InstrKind::Label | InstrKind::Goto => self.res.as_ref().map(|t| t.lexeme.as_str()),
            _ => None,
        }
    }

    /// The branch targets this terminator names, in `(true, false)` order
    /// for `If`/`While`/`For`, or a single-element list for `Goto`.
    pub fn branch_targets(&self) -> Vec<&str> {
        match self.kind {
            InstrKind::Goto => self.res.iter().map(|t| t.lexeme.as_str()).collect(),
            InstrKind::If | InstrKind::While | InstrKind::For => {
                let mut targets = Vec::new();
                if let Some(t) = &self.left {
                    targets.push(t.lexeme.as_str());
                }
                if let Some(t) = &self.right {
                    targets.push(t.lexeme.as_str());
                }
                targets
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InstrKind::Decl => match &self.left {
                Some(init) => write!(f, "{} = {}", self.res.as_ref().unwrap(), init),
                None => write!(f, "decl {}", self.res.as_ref().unwrap()),
            },
            InstrKind::Assign => {
                let res = self.res.as_ref().unwrap();
                let left = self.left.as_ref().unwrap();
                match (&self.op, &self.right) {
                    (Some(op), Some(right)) => write!(f, "{res} = {left} {op} {right}"),
                    (Some(op), None) => write!(f, "{res} = {op} {left}"),
                    (None, _) => write!(f, "{res} = {left}"),
                }
            }
            InstrKind::Param => write!(f, "param {}", self.left.as_ref().unwrap()),
            InstrKind::Call => write!(f, "{} = call {}", self.res.as_ref().unwrap(), self.left.as_ref().unwrap()),
            InstrKind::Label => write!(f, "label {}:", self.res.as_ref().unwrap().lexeme),
            InstrKind::Goto => write!(f, "goto {}", self.res.as_ref().unwrap().lexeme),
            InstrKind::If | InstrKind::While | InstrKind::For => write!(
                f,
                "if {} goto {} else {}",
                self.res.as_ref().unwrap(),
                self.left.as_ref().unwrap().lexeme,
                self.right.as_ref().unwrap().lexeme,
            ),
            InstrKind::Return => match &self.res {
                Some(v) => write!(f, "return {v}"),
                None => write!(f, "return"),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn leading_label(&self) -> Option<&str> {
        self.instructions.first().filter(|i| i.is_label()).and_then(|i| i.label_name())
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_label_ignores_a_leading_goto() {
        // Only the entry block can start with something other than the
        // label that opened it; a `goto` there names its *target*, not
        // this block's own label.
        let mut block = BasicBlock::default();
        block.instructions.push(Instruction::goto("L0"));
        assert_eq!(block.leading_label(), None);
    }

    #[test]
    fn leading_label_recognizes_an_actual_label() {
        let mut block = BasicBlock::default();
        block.instructions.push(Instruction::label("L0"));
        assert_eq!(block.leading_label(), Some("L0"));
    }
}
