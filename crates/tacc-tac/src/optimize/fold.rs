//! Local constant folding: any `DECL`/`ASSIGN` whose both operands are
//! already numeric literals collapses to a single literal, op cleared.
//! Idempotent — a folded instruction has no `op` left to look at again.

use tacc_util::{Token, TokenKind};

use crate::error::TacError;
use crate::instruction::{InstrKind, Instruction};
use crate::Tac;

pub fn constant_fold(tac: &mut Tac) -> Result<(), TacError> {
    for func in &mut tac.functions {
        for block in func.blocks.iter_mut() {
            for instr in &mut block.instructions {
                fold_instruction(instr)?;
            }
        }
    }
    Ok(())
}

fn fold_instruction(instr: &mut Instruction) -> Result<(), TacError> {
    if !matches!(instr.kind, InstrKind::Decl | InstrKind::Assign) {
        return Ok(());
    }
    let Some(op) = instr.op.clone() else { return Ok(()) };
    let (Some(left), Some(right)) = (instr.left.as_ref(), instr.right.as_ref()) else {
        return Ok(());
    };
    let (Some(lv), Some(rv)) = (left.as_i64(), right.as_i64()) else {
        return Ok(());
    };

    let result = match op.kind {
        TokenKind::Plus => lv.wrapping_add(rv),
        TokenKind::Minus => lv.wrapping_sub(rv),
        TokenKind::Multiply => lv.wrapping_mul(rv),
        TokenKind::Divide => {
            if rv == 0 {
                return Err(TacError::DivisionByZero { token: op });
            }
            lv / rv // truncates toward zero, matching Rust's native `i64` division.
        }
        TokenKind::Modulus => {
            if rv == 0 {
                return Err(TacError::DivisionByZero { token: op });
            }
            lv % rv
        }
        TokenKind::LessThan => (lv < rv) as i64,
        TokenKind::GreaterThan => (lv > rv) as i64,
        TokenKind::Equal => (lv == rv) as i64,
        _ => return Ok(()),
    };

    instr.left = Some(Token::synthetic(TokenKind::Number, result.to_string()));
    instr.right = None;
    instr.op = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn fold_src(src: &str) -> Tac {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        let mut tac = generate(&program).unwrap();
        constant_fold(&mut tac).unwrap();
        tac
    }

    #[test]
    fn folds_a_literal_addition() {
        let tac = fold_src("int main() { int x = 2 + 3; return x; }");
        let instr = &tac.functions[0].blocks[tacc_util::Idx::from_usize(0)].instructions[0];
        assert_eq!(instr.left.as_ref().unwrap().lexeme, "5");
        assert!(instr.op.is_none());
    }

    #[test]
    fn does_not_fold_when_an_operand_is_a_variable() {
        let tac = fold_src("int main() { int x = 1; int y = x + 3; return y; }");
        let instr = &tac.functions[0].blocks[tacc_util::Idx::from_usize(0)].instructions[1];
        assert!(instr.op.is_some());
    }

    #[test]
    fn division_by_zero_literal_is_an_error() {
        let tokens = Lexer::tokenize("int main() { int x = 1 / 0; return x; }").unwrap();
        let program = Parser::parse(tokens).unwrap();
        let mut tac = generate(&program).unwrap();
        assert!(matches!(constant_fold(&mut tac), Err(TacError::DivisionByZero { .. })));
    }

    #[test]
    fn truncates_toward_zero() {
        // Unary minus on a literal lowers to a separate `0 - 7` instruction
        // before the division, so folding that instruction first (via the
        // full optimize pipeline) is what exposes the division as
        // literal/literal for this second fold pass to collapse.
        let tokens = Lexer::tokenize("int main() { int x = -7 / 2; return x; }").unwrap();
        let program = Parser::parse(tokens).unwrap();
        let mut tac = generate(&program).unwrap();
        crate::optimize::optimize_to_fixpoint(&mut tac).unwrap();
        let block = &tac.functions[0].blocks[tacc_util::Idx::from_usize(0)];
        let decl_x = block.instructions.iter().find(|i| i.res.as_ref().map(|r| r.lexeme == "x").unwrap_or(false)).unwrap();
        assert_eq!(decl_x.left.as_ref().unwrap().lexeme, "-3");
    }
}
