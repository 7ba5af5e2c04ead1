//! Backward liveness analysis, in two stages: a block-level fixpoint over
//! the CFG, then a per-instruction walk within each block seeded from that
//! block's exit set. Mirrors the worklist shape of a standard MIR liveness
//! pass, but over [`tacc_tac`]'s four-slot [`Instruction`] rather than a
//! statement/terminator split.

use std::collections::{HashMap, HashSet};

use tacc_tac::{BasicBlock, BlockId, Cfg, FunctionBlock, InstrKind, Instruction};
use tacc_util::{Idx, TokenKind};

pub type NameSet = HashSet<String>;

/// Per-block live-in/live-out sets, computed at the block's boundary.
#[derive(Debug, Default)]
pub struct BlockLiveness {
    pub live_in: HashMap<BlockId, NameSet>,
    pub live_out: HashMap<BlockId, NameSet>,
}

/// Per-instruction live-in/live-out sets, in the same order as the block's
/// instruction list.
#[derive(Debug, Default)]
pub struct InstructionLiveness {
    pub per_block: HashMap<BlockId, Vec<(NameSet, NameSet)>>,
}

impl InstructionLiveness {
    pub fn at(&self, block: BlockId, index: usize) -> Option<&(NameSet, NameSet)> {
        self.per_block.get(&block).and_then(|v| v.get(index))
    }
}

pub(crate) fn is_param_placeholder(name: &str) -> bool {
    name.starts_with("%param")
}

/// The name an instruction defines, if any — excludes `Label`/`Goto` (which
/// name a target, not a value) and the synthetic `param` marker token.
pub(crate) fn defined_name(instr: &Instruction) -> Option<String> {
    match instr.kind {
        InstrKind::Decl | InstrKind::Assign | InstrKind::Call => {
            instr.res.as_ref().filter(|t| t.kind == TokenKind::Identifier).map(|t| t.lexeme.clone())
        }
        _ => None,
    }
}

/// Every identifier an instruction reads, in no particular order.
fn read_names(instr: &Instruction) -> Vec<String> {
    let mut names = Vec::new();
    let mut push = |slot: &Option<tacc_util::Token>| {
        if let Some(t) = slot {
            if t.kind == TokenKind::Identifier {
                names.push(t.lexeme.clone());
            }
        }
    };
    match instr.kind {
        InstrKind::Label | InstrKind::Goto | InstrKind::Call => {}
        InstrKind::Param => push(&instr.left),
        InstrKind::Decl | InstrKind::Assign => {
            push(&instr.left);
            push(&instr.right);
        }
        InstrKind::If | InstrKind::While | InstrKind::For | InstrKind::Return => push(&instr.res),
    }
    names
}

fn use_def(block: &BasicBlock) -> (NameSet, NameSet) {
    let mut use_set = NameSet::new();
    let mut def_set = NameSet::new();
    for instr in &block.instructions {
        for name in read_names(instr) {
            if !def_set.contains(&name) {
                use_set.insert(name);
            }
        }
        if let Some(name) = defined_name(instr) {
            def_set.insert(name);
        }
    }
    (use_set, def_set)
}

/// Block-level backward fixpoint: `out = ⋃ in(succ)`, `in = use ∪ (out − def)`.
pub fn analyze_block_liveness(func: &FunctionBlock, cfg: &Cfg) -> BlockLiveness {
    let n = func.blocks.len();
    let mut use_sets = HashMap::with_capacity(n);
    let mut def_sets = HashMap::with_capacity(n);
    for (id, block) in func.blocks.iter_enumerated() {
        let (u, d) = use_def(block);
        use_sets.insert(id, u);
        def_sets.insert(id, d);
    }

    let mut live_in: HashMap<BlockId, NameSet> = (0..n).map(|i| (Idx::from_usize(i), NameSet::new())).collect();
    let mut live_out: HashMap<BlockId, NameSet> = live_in.clone();

    // A reversed block order is a reasonable approximation of reverse
    // postorder for the straight-line-with-branches shape the generator
    // emits; the fixpoint converges regardless, just possibly in more
    // rounds if the order doesn't match the true traversal.
    let order: Vec<BlockId> = (0..n).rev().map(Idx::from_usize).collect();

    loop {
        let mut changed = false;
        for &id in &order {
            let mut out = NameSet::new();
            for succ in &cfg.node(id).successors {
                out.extend(live_in[succ].iter().cloned());
            }
            let def = &def_sets[&id];
            let mut new_in = use_sets[&id].clone();
            for name in out.difference(def) {
                new_in.insert(name.clone());
            }
            if new_in != live_in[&id] {
                live_in.insert(id, new_in);
                changed = true;
            }
            if out != live_out[&id] {
                live_out.insert(id, out);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    BlockLiveness { live_in, live_out }
}

/// Per-instruction backward walk within each block, seeded from that
/// block's live-out set.
pub fn analyze_instruction_liveness(func: &FunctionBlock, block_liveness: &BlockLiveness) -> InstructionLiveness {
    let mut per_block = HashMap::new();
    for (id, block) in func.blocks.iter_enumerated() {
        let mut current = block_liveness.live_out.get(&id).cloned().unwrap_or_default();
        let mut entries = Vec::with_capacity(block.instructions.len());
        for instr in block.instructions.iter().rev() {
            let out = current.clone();
            if let Some(def) = defined_name(instr) {
                current.remove(&def);
            }
            for name in read_names(instr) {
                current.insert(name);
            }
            entries.push((current.clone(), out));
        }
        entries.reverse();
        per_block.insert(id, entries);
    }
    InstructionLiveness { per_block }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacc_lex::Lexer;
    use tacc_par::Parser;
    use tacc_tac::generate;

    fn liveness_for(src: &str) -> (FunctionBlock, Cfg, BlockLiveness, InstructionLiveness) {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        let tac = generate(&program).unwrap();
        let func = tac.functions.into_iter().next().unwrap();
        let cfg = Cfg::build(&func);
        let block_liveness = analyze_block_liveness(&func, &cfg);
        let instr_liveness = analyze_instruction_liveness(&func, &block_liveness);
        (func, cfg, block_liveness, instr_liveness)
    }

    #[test]
    fn a_name_never_read_again_dies_after_its_last_use() {
        let (func, _cfg, _bl, il) = liveness_for("int main() { int x = 1; int y = x + 1; return y; }");
        let entry = func.entry();
        // after `y = x + 1`, x is dead.
        let (_in, out) = &il.per_block[&entry][1];
        assert!(!out.contains("x"));
    }

    #[test]
    fn a_variable_live_across_a_branch_is_live_at_the_join_predecessors() {
        let (func, cfg, bl, _il) = liveness_for("int main() { int x = 1; if (x) { int y = 2; } return x; }");
        let entry = func.entry();
        assert!(bl.live_out[&entry].contains("x"));
        // the join block's predecessors must all see x live-in.
        let join = cfg.nodes.last().unwrap().id;
        for pred in &cfg.node(join).predecessors {
            assert!(bl.live_out[pred].contains("x"));
        }
    }

    #[test]
    fn a_loop_variable_is_live_into_the_header_from_the_back_edge() {
        let (func, cfg, bl, _il) = liveness_for("int main() { int x = 0; while (x) { x = x + 1; } return x; }");
        let header = cfg.node(func.entry()).successors[0];
        assert!(bl.live_in[&header].contains("x"));
    }
}
