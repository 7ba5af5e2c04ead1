//! tacc-tac — lowers the AST to three-address code, builds the per-function
//! control-flow graph, and runs the fold / copy-propagate / dead-code
//! optimizer pipeline to a fixpoint.

mod cfg;
mod error;
mod generator;
mod instruction;
pub mod optimize;

pub use cfg::{Cfg, CfgNode};
pub use error::TacError;
pub use generator::generate;
pub use instruction::{BasicBlock, BlockId, InstrKind, Instruction};

use tacc_util::Token;

/// One function's lowered body: an entry-first list of basic blocks.
#[derive(Debug, Clone)]
pub struct FunctionBlock {
    pub name: Token,
    pub blocks: tacc_util::IndexVec<BlockId, BasicBlock>,
}

impl FunctionBlock {
    pub fn entry(&self) -> BlockId {
        tacc_util::Idx::from_usize(0)
    }
}

/// The whole program's three-address code: global declarations, lowered
/// functions, and the final values of the temp/label counters that
/// produced them.
#[derive(Debug, Clone)]
pub struct Tac {
    pub globals: Vec<Instruction>,
    pub functions: Vec<FunctionBlock>,
    pub next_temp: u32,
    pub next_label: u32,
}

impl Tac {
    /// Renders every instruction as `NNNN: <stmt>`, globals first, then
    /// each function's blocks in order. This is the stable form the
    /// `-o0`/`-o1`/`-o2` dumps and the optimizer tests compare against.
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        let mut n = 0usize;
        for instr in &self.globals {
            out.push_str(&format!("{n:04}: {instr}\n"));
            n += 1;
        }
        for func in &self.functions {
            out.push_str(&format!("{n:04}: function {}\n", func.name.lexeme));
            n += 1;
            for block in func.blocks.iter() {
                for instr in &block.instructions {
                    out.push_str(&format!("{n:04}: {instr}\n"));
                    n += 1;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn generate_src(src: &str) -> Tac {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        generate(&program).unwrap()
    }

    #[test]
    fn straight_line_function_lowers_to_a_single_block() {
        let tac = generate_src("int main() { int x = 1; int y = x + 2; return y; }");
        let func = &tac.functions[0];
        assert_eq!(func.blocks.len(), 1);
        assert_eq!(func.blocks[func.entry()].instructions.len(), 4);
    }

    #[test]
    fn if_statement_splits_into_three_labeled_blocks_plus_entry() {
        let tac = generate_src("int main() { int x = 0; if (x) { x = 1; } return x; }");
        let func = &tac.functions[0];
        assert!(func.blocks.len() >= 3);
        for block in func.blocks.iter().skip(1) {
            assert!(block.leading_label().is_some());
        }
    }

    #[test]
    fn postfix_increment_captures_the_pre_increment_value() {
        let tac = generate_src("int main() { int x = 5; int y = x++; return y; }");
        let func = &tac.functions[0];
        let text: Vec<String> = func.blocks[func.entry()]
            .instructions
            .iter()
            .map(|i| i.to_string())
            .collect();
        // temp copy of x's old value happens before x is mutated.
        assert!(text[1].ends_with("= x"));
        assert!(text[2].contains("x + 1"));
        assert!(text[3].contains(&text[1].split(' ').next().unwrap().to_string()));
    }

    #[test]
    fn unary_minus_is_materialized_as_subtraction_from_zero() {
        let tac = generate_src("int main() { int x = 1; int y = -x; return y; }");
        let func = &tac.functions[0];
        let text: Vec<String> = func.blocks[func.entry()].instructions.iter().map(|i| i.to_string()).collect();
        assert!(text.iter().any(|line| line.contains("0 - x")));
    }

    #[test]
    fn unary_plus_emits_no_instruction() {
        let tac = generate_src("int main() { int x = 1; int y = +x; return y; }");
        let func = &tac.functions[0];
        assert_eq!(func.blocks[func.entry()].instructions.len(), 2); // decl x, decl y
    }

    #[test]
    fn break_outside_a_loop_is_rejected() {
        let tokens = Lexer::tokenize("int main() { break; return 0; }").unwrap();
        let program = Parser::parse(tokens).unwrap();
        assert!(matches!(generate(&program), Err(TacError::BreakOutsideLoop { .. })));
    }

    #[test]
    fn switch_checks_every_label_in_a_fallthrough_group() {
        let tac = generate_src(
            "int main() { int x = 2; int y = 0; switch (x) { case 1: case 2: y = 1; break; default: y = 2; } return y; }",
        );
        let func = &tac.functions[0];
        let if_count = func
            .blocks
            .iter()
            .flat_map(|b| &b.instructions)
            .filter(|i| i.kind == InstrKind::If)
            .count();
        assert_eq!(if_count, 2, "both case 1 and case 2 must be independently compared");
    }
}
