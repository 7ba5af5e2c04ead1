//! Interference-graph construction and greedy coloring.
//!
//! An edge joins every pair of names simultaneously live at some point in
//! the program — concretely, a defined name interferes with everything
//! live immediately after the instruction that defines it. `%paramN`
//! placeholders are pre-colored/external and never become graph nodes.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use tacc_tac::FunctionBlock;

use crate::liveness::{defined_name, is_param_placeholder, InstructionLiveness};

/// Undirected interference graph, keyed by identifier name. Neighbor sets
/// and the node list both preserve first-seen order, so coloring has a
/// deterministic tie-break.
#[derive(Debug, Default)]
pub struct InterferenceGraph {
    edges: IndexMap<String, IndexSet<String>>,
}

impl InterferenceGraph {
    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.edges.keys()
    }

    pub fn neighbors(&self, name: &str) -> impl Iterator<Item = &String> {
        self.edges.get(name).into_iter().flatten()
    }

    pub fn degree(&self, name: &str) -> usize {
        self.edges.get(name).map(IndexSet::len).unwrap_or(0)
    }

    fn ensure_node(&mut self, name: &str) {
        self.edges.entry(name.to_string()).or_default();
    }

    fn add_edge(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        self.ensure_node(a);
        self.ensure_node(b);
        self.edges.get_mut(a).unwrap().insert(b.to_string());
        self.edges.get_mut(b).unwrap().insert(a.to_string());
    }
}

pub fn build_interference_graph(func: &FunctionBlock, liveness: &InstructionLiveness) -> InterferenceGraph {
    let mut graph = InterferenceGraph::default();

    for (id, block) in func.blocks.iter_enumerated() {
        for instr in &block.instructions {
            if let Some(name) = defined_name(instr) {
                if !is_param_placeholder(&name) {
                    graph.ensure_node(&name);
                }
            }
        }
        let Some(entries) = liveness.per_block.get(&id) else { continue };
        for (instr, (_, out)) in block.instructions.iter().zip(entries) {
            let Some(def) = defined_name(instr) else { continue };
            if is_param_placeholder(&def) {
                continue;
            }
            for live in out {
                if !is_param_placeholder(live) {
                    graph.add_edge(&def, live);
                }
            }
        }
    }

    graph
}

pub type ColorMap = HashMap<String, usize>;

/// Greedy coloring: visit nodes in descending interference degree (ties
/// broken by first-seen order), assign the smallest color not already
/// used by a colored neighbor. Colors are unbounded — this crate never
/// spills.
pub fn greedy_color(graph: &InterferenceGraph) -> ColorMap {
    let mut order: Vec<&String> = graph.nodes().collect();
    order.sort_by(|a, b| graph.degree(b).cmp(&graph.degree(a)));

    let mut colors: ColorMap = HashMap::new();
    for name in order {
        let used: HashSet<usize> = graph.neighbors(name).filter_map(|n| colors.get(n).copied()).collect();
        let mut color = 0;
        while used.contains(&color) {
            color += 1;
        }
        colors.insert(name.clone(), color);
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::{analyze_block_liveness, analyze_instruction_liveness};
    use tacc_lex::Lexer;
    use tacc_par::Parser;
    use tacc_tac::{generate, Cfg};

    fn graph_for(src: &str) -> InterferenceGraph {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        let tac = generate(&program).unwrap();
        let func = tac.functions.into_iter().next().unwrap();
        let cfg = Cfg::build(&func);
        let block_liveness = analyze_block_liveness(&func, &cfg);
        let instr_liveness = analyze_instruction_liveness(&func, &block_liveness);
        build_interference_graph(&func, &instr_liveness)
    }

    #[test]
    fn two_names_simultaneously_live_interfere() {
        let graph = graph_for("int main() { int x = 1; int y = 2; int z = x + y; return z; }");
        assert!(graph.neighbors("x").any(|n| n == "y") || graph.neighbors("y").any(|n| n == "x"));
    }

    #[test]
    fn a_name_dead_before_another_is_defined_does_not_interfere() {
        let graph = graph_for("int main() { int x = 1; int y = x + 1; int z = 2; return z; }");
        // x is dead after computing y, so x and z never share a color requirement.
        assert!(!graph.neighbors("x").any(|n| n == "z"));
    }

    #[test]
    fn coloring_never_assigns_the_same_color_to_interfering_names() {
        let graph = graph_for(
            "int main() { int a = 1; int b = 2; int c = 3; int d = a + b; int e = b + c; return d + e; }",
        );
        let colors = greedy_color(&graph);
        for name in graph.nodes() {
            let my_color = colors[name];
            for neighbor in graph.neighbors(name) {
                assert_ne!(my_color, colors[neighbor], "{name} and {neighbor} interfere but share a color");
            }
        }
    }

    #[test]
    fn parameter_placeholders_never_become_graph_nodes() {
        let graph = graph_for("int add(int a, int b) { return a + b; }");
        assert!(!graph.nodes().any(|n| n.starts_with("%param")));
    }
}
