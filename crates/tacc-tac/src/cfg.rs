//! Builds the per-function control-flow graph from its linear block list.
//!
//! The CFG is rebuilt from scratch by every pass that needs it rather than
//! kept in sync incrementally — cheap here since a function rarely has
//! more than a few dozen blocks, and it keeps the optimizer passes from
//! having to reason about a graph that drifted out of step with the
//! blocks it was built from.

use std::collections::HashMap;

use crate::instruction::{BlockId, InstrKind};
use crate::FunctionBlock;
use tacc_util::Idx;

#[derive(Debug, Clone)]
pub struct CfgNode {
    pub id: BlockId,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
}

#[derive(Debug)]
pub struct Cfg {
    pub nodes: Vec<CfgNode>,
    label_index: HashMap<String, BlockId>,
}

impl Cfg {
    pub fn build(func: &FunctionBlock) -> Self {
        let mut label_index = HashMap::new();
        for (id, block) in func.blocks.iter_enumerated() {
            if let Some(label) = block.leading_label() {
                label_index.insert(label.to_string(), id);
            }
        }

        let mut nodes: Vec<CfgNode> =
            func.blocks.iter_enumerated().map(|(id, _)| CfgNode { id, predecessors: Vec::new(), successors: Vec::new() }).collect();

        let last_index = func.blocks.len().saturating_sub(1);
        for (id, block) in func.blocks.iter_enumerated() {
            let targets = match block.terminator() {
                Some(term) if term.kind == InstrKind::Return => Vec::new(),
                Some(term) => term.branch_targets().into_iter().filter_map(|name| label_index.get(name).copied()).collect(),
                None if id.index() < last_index => {
                    vec![tacc_util::Idx::from_usize(id.index() + 1)]
                }
                None => Vec::new(),
            };
            for target in targets {
                add_edge(&mut nodes, id, target);
            }
        }

        Self { nodes, label_index }
    }

    pub fn node(&self, id: BlockId) -> &CfgNode {
        &self.nodes[id.index()]
    }

    pub fn block_for_label(&self, label: &str) -> Option<BlockId> {
        self.label_index.get(label).copied()
    }

    pub fn entry(&self) -> BlockId {
        tacc_util::Idx::from_usize(0)
    }
}

fn add_edge(nodes: &mut [CfgNode], from: BlockId, to: BlockId) {
    use tacc_util::Idx;
    if !nodes[from.index()].successors.contains(&to) {
        nodes[from.index()].successors.push(to);
    }
    if !nodes[to.index()].predecessors.contains(&from) {
        nodes[to.index()].predecessors.push(from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn cfg_for(src: &str) -> (crate::FunctionBlock, Cfg) {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        let tac = generate(&program).unwrap();
        let func = tac.functions.into_iter().next().unwrap();
        let cfg = Cfg::build(&func);
        (func, cfg)
    }

    #[test]
    fn if_without_else_has_two_predecessors_at_the_join() {
        let (_func, cfg) = cfg_for("int main() { int x = 0; if (x) { x = 1; } return x; }");
        let join = cfg.nodes.last().unwrap();
        assert_eq!(join.predecessors.len(), 2);
    }

    #[test]
    fn while_loop_header_has_two_predecessors() {
        let (_func, cfg) = cfg_for("int main() { int x = 0; while (x) { x = x + 1; } return x; }");
        let header = &cfg.nodes[1];
        assert_eq!(header.predecessors.len(), 2);
    }

    #[test]
    fn return_block_has_no_successors() {
        let (_func, cfg) = cfg_for("int main() { return 0; }");
        assert!(cfg.nodes[0].successors.is_empty());
    }
}
