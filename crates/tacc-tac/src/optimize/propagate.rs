//! Forward copy/constant propagation over the CFG.
//!
//! The lattice element is a finite map from identifier name to the token
//! it is known to equal (a number, or another identifier it was copied
//! from) — combining copy and constant propagation in one map lets a
//! later fold pass re-expose opportunities the first fold pass couldn't
//! see, without a third dedicated pass.

use std::collections::{HashMap, VecDeque};

use tacc_util::{Idx, Token, TokenKind};

use crate::cfg::Cfg;
use crate::instruction::{BasicBlock, BlockId, InstrKind, Instruction};
use crate::{FunctionBlock, Tac};

type Fact = HashMap<String, Token>;

pub fn copy_constant_propagation(tac: &mut Tac) {
    for func in &mut tac.functions {
        propagate_function(func);
    }
}

fn propagate_function(func: &mut FunctionBlock) {
    let cfg = Cfg::build(func);
    let n = func.blocks.len();
    if n == 0 {
        return;
    }
    let entry = cfg.entry();

    let mut in_facts: Vec<Option<Fact>> = vec![None; n];
    let mut out_facts: Vec<Option<Fact>> = vec![None; n];
    let mut queued = vec![false; n];
    let mut worklist = VecDeque::new();
    worklist.push_back(entry);
    queued[entry.index()] = true;

    while let Some(b) = worklist.pop_front() {
        queued[b.index()] = false;
        let new_in = if b == entry {
            Some(Fact::new())
        } else {
            meet(cfg.node(b).predecessors.iter().map(|p| out_facts[p.index()].as_ref()))
        };
        let new_out = new_in.as_ref().map(|m| transfer_block(m, &func.blocks[b]));
        in_facts[b.index()] = new_in;
        if new_out != out_facts[b.index()] {
            out_facts[b.index()] = new_out;
            for &succ in &cfg.node(b).successors {
                if !queued[succ.index()] {
                    queued[succ.index()] = true;
                    worklist.push_back(succ);
                }
            }
        }
    }

    for (i, block) in func.blocks.iter_mut().enumerate() {
        let id: BlockId = Idx::from_usize(i);
        let mut current = in_facts[id.index()].clone().unwrap_or_default();
        for instr in block.instructions.iter_mut() {
            rewrite_uses(instr, &current);
            apply_def(&mut current, instr);
        }
    }
}

fn meet<'a>(preds: impl Iterator<Item = Option<&'a Fact>>) -> Option<Fact> {
    let mut acc: Option<Fact> = None;
    for pred in preds {
        let Some(fact) = pred else { continue };
        acc = Some(match acc {
            None => fact.clone(),
            Some(current) => intersect(&current, fact),
        });
    }
    acc
}

fn intersect(a: &Fact, b: &Fact) -> Fact {
    a.iter().filter(|(k, v)| b.get(k.as_str()) == Some(v)).map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn transfer_block(entry: &Fact, block: &BasicBlock) -> Fact {
    let mut map = entry.clone();
    for instr in &block.instructions {
        apply_def(&mut map, instr);
    }
    map
}

/// `DECL x = e` / `ASSIGN x = e` with no `op` and no `right` install a new
/// fact (`e`'s value, resolved through the map when `e` is itself a known
/// identifier); every other defining form just invalidates `x`.
fn apply_def(map: &mut Fact, instr: &Instruction) {
    match instr.kind {
        InstrKind::Decl | InstrKind::Assign => {
            let Some(res) = &instr.res else { return };
            map.remove(&res.lexeme);
            if instr.op.is_none() && instr.right.is_none() {
                if let Some(rhs) = &instr.left {
                    match rhs.kind {
                        TokenKind::Number => {
                            map.insert(res.lexeme.clone(), rhs.clone());
                        }
                        TokenKind::Identifier => {
                            let resolved = map.get(&rhs.lexeme).cloned().unwrap_or_else(|| rhs.clone());
                            map.insert(res.lexeme.clone(), resolved);
                        }
                        _ => {}
                    }
                }
            }
        }
        _ => {}
    }
}

fn rewrite_uses(instr: &mut Instruction, map: &Fact) {
    match instr.kind {
        InstrKind::Label | InstrKind::Goto | InstrKind::Call => {}
        InstrKind::Param => rewrite_operand(&mut instr.left, map),
        InstrKind::Decl | InstrKind::Assign => {
            rewrite_operand(&mut instr.left, map);
            rewrite_operand(&mut instr.right, map);
        }
        InstrKind::If | InstrKind::While | InstrKind::For | InstrKind::Return => {
            rewrite_operand(&mut instr.res, map);
        }
    }
}

fn rewrite_operand(slot: &mut Option<Token>, map: &Fact) {
    if let Some(tok) = slot {
        if tok.kind == TokenKind::Identifier {
            if let Some(value) = map.get(&tok.lexeme) {
                *tok = value.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn propagate_src(src: &str) -> Tac {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        let mut tac = generate(&program).unwrap();
        copy_constant_propagation(&mut tac);
        tac
    }

    #[test]
    fn propagates_a_known_constant_into_a_later_use() {
        let tac = propagate_src("int main() { int x = 5; int y = x + 1; return y; }");
        let entry = &tac.functions[0].blocks[Idx::from_usize(0)];
        let add = &entry.instructions[1];
        assert_eq!(add.left.as_ref().unwrap().lexeme, "5");
    }

    #[test]
    fn does_not_propagate_across_a_branch_that_redefines_the_name() {
        let tac = propagate_src(
            "int main() { int x = 1; if (x) { x = 2; } int y = x + 1; return y; }",
        );
        let func = &tac.functions[0];
        let join_block = func.blocks.iter().last().unwrap();
        let add = join_block.instructions.iter().find(|i| i.kind == InstrKind::Assign && i.op.is_some()).unwrap();
        // x could be 1 or 2 depending on the branch, so it must stay symbolic.
        assert_eq!(add.left.as_ref().unwrap().kind, TokenKind::Identifier);
    }

    #[test]
    fn chains_copies_through_an_intermediate_identifier() {
        let tac = propagate_src("int main() { int x = 7; int y = x; int z = y + 1; return z; }");
        let entry = &tac.functions[0].blocks[Idx::from_usize(0)];
        let add = &entry.instructions[2];
        assert_eq!(add.left.as_ref().unwrap().lexeme, "7");
    }
}
