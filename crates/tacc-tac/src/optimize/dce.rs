//! Dead-code elimination: literal-condition branches collapse to a plain
//! `goto`, names nothing reads get dropped, label trampolines collapse
//! to their eventual target, and blocks nothing can reach are pruned.

use std::collections::{HashMap, HashSet};

use tacc_util::{Idx, Token, TokenKind};

use crate::cfg::Cfg;
use crate::instruction::{InstrKind, Instruction};
use crate::{FunctionBlock, Tac};

pub fn dead_code_elimination(tac: &mut Tac) {
    for func in &mut tac.functions {
        rewrite_literal_conditions(func);
        remove_unused_defs(func);
        redirect_trampoline_labels(func);
        truncate_after_goto(func);
        prune_unreachable_blocks(func);
    }
}

fn rewrite_literal_conditions(func: &mut FunctionBlock) {
    for block in func.blocks.iter_mut() {
        for instr in block.instructions.iter_mut() {
            if !matches!(instr.kind, InstrKind::If | InstrKind::While | InstrKind::For) {
                continue;
            }
            let Some(value) = instr.res.as_ref().and_then(Token::as_i64) else { continue };
            let target = if value != 0 { instr.left.clone() } else { instr.right.clone() };
            if let Some(target) = target {
                *instr = Instruction::goto(target.lexeme);
            }
        }
    }
}

fn remove_unused_defs(func: &mut FunctionBlock) {
    let mut used = HashSet::new();
    for block in func.blocks.iter() {
        for instr in &block.instructions {
            collect_uses(instr, &mut used);
        }
    }
    for block in func.blocks.iter_mut() {
        block.instructions.retain(|instr| match instr.kind {
            InstrKind::Decl | InstrKind::Assign => instr.res.as_ref().map(|r| used.contains(&r.lexeme)).unwrap_or(true),
            _ => true,
        });
    }
}

fn collect_uses(instr: &Instruction, used: &mut HashSet<String>) {
    match instr.kind {
        InstrKind::Label | InstrKind::Goto | InstrKind::Call => {}
        InstrKind::Param => note_use(&instr.left, used),
        InstrKind::Decl | InstrKind::Assign => {
            note_use(&instr.left, used);
            note_use(&instr.right, used);
        }
        InstrKind::If | InstrKind::While | InstrKind::For | InstrKind::Return => note_use(&instr.res, used),
    }
}

fn note_use(slot: &Option<Token>, used: &mut HashSet<String>) {
    if let Some(tok) = slot {
        if tok.kind == TokenKind::Identifier {
            used.insert(tok.lexeme.clone());
        }
    }
}

/// A block that is exactly `[LABEL l, GOTO target]` is a trampoline: every
/// reference to `l` may as well point straight at `target`. Chains of
/// these collapse transitively.
fn redirect_trampoline_labels(func: &mut FunctionBlock) {
    let mut redirect: HashMap<String, String> = HashMap::new();
    for block in func.blocks.iter() {
        if let [label_instr, goto_instr] = block.instructions.as_slice() {
            if label_instr.kind == InstrKind::Label && goto_instr.kind == InstrKind::Goto {
                let label = label_instr.res.as_ref().unwrap().lexeme.clone();
                let target = goto_instr.res.as_ref().unwrap().lexeme.clone();
                if label != target {
                    redirect.insert(label, target);
                }
            }
        }
    }
    if redirect.is_empty() {
        return;
    }
    let resolve = |name: &str| -> String {
        let mut current = name.to_string();
        let mut seen = HashSet::new();
        while let Some(next) = redirect.get(&current) {
            if !seen.insert(current.clone()) {
                break;
            }
            current = next.clone();
        }
        current
    };
    for block in func.blocks.iter_mut() {
        for instr in block.instructions.iter_mut() {
            match instr.kind {
                InstrKind::Goto => {
                    if let Some(res) = &mut instr.res {
                        res.lexeme = resolve(&res.lexeme);
                    }
                }
                InstrKind::If | InstrKind::While | InstrKind::For => {
                    if let Some(t) = &mut instr.left {
                        t.lexeme = resolve(&t.lexeme);
                    }
                    if let Some(t) = &mut instr.right {
                        t.lexeme = resolve(&t.lexeme);
                    }
                }
                _ => {}
            }
        }
    }
}

fn truncate_after_goto(func: &mut FunctionBlock) {
    for block in func.blocks.iter_mut() {
        if let Some(pos) = block.instructions.iter().position(|i| i.kind == InstrKind::Goto) {
            block.instructions.truncate(pos + 1);
        }
    }
}

fn prune_unreachable_blocks(func: &mut FunctionBlock) {
    let cfg = Cfg::build(func);
    let entry = cfg.entry();
    let mut visited = HashSet::new();
    visited.insert(entry);
    let mut stack = vec![entry];
    while let Some(b) = stack.pop() {
        for &succ in &cfg.node(b).successors {
            if visited.insert(succ) {
                stack.push(succ);
            }
        }
    }
    let mut retained = tacc_util::IndexVec::new();
    for (id, block) in func.blocks.iter_enumerated() {
        if visited.contains(&id) {
            retained.push(block.clone());
        }
    }
    func.blocks = retained;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn dce_src(src: &str) -> Tac {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        let mut tac = generate(&program).unwrap();
        dead_code_elimination(&mut tac);
        tac
    }

    #[test]
    fn drops_an_assignment_nothing_reads() {
        let tac = dce_src("int main() { int x = 1; int y = 2; return x; }");
        let entry = &tac.functions[0].blocks[Idx::from_usize(0)];
        assert!(entry.instructions.iter().all(|i| i.res.as_ref().map(|r| r.lexeme != "y").unwrap_or(true)));
    }

    #[test]
    fn a_literal_true_condition_becomes_an_unconditional_goto() {
        let mut tac = generate(&Parser::parse(Lexer::tokenize("int main() { if (1) { return 1; } return 0; }").unwrap()).unwrap()).unwrap();
        crate::optimize::constant_fold(&mut tac).unwrap(); // not required here, but harmless
        dead_code_elimination(&mut tac);
        let func = &tac.functions[0];
        assert!(func.blocks[Idx::from_usize(0)].instructions.iter().any(|i| i.kind == InstrKind::Goto));
    }

    #[test]
    fn prunes_blocks_unreachable_after_a_literal_condition_resolves() {
        let tac = dce_src("int main() { if (0) { return 1; } return 0; }");
        let func = &tac.functions[0];
        // the `return 1` block is unreachable once `if (0)` becomes `goto false`.
        let returns_one = func.blocks.iter().flat_map(|b| &b.instructions).any(|i| {
            i.kind == InstrKind::Return && i.res.as_ref().map(|t| t.lexeme == "1").unwrap_or(false)
        });
        assert!(!returns_one);
    }
}
