//! tacc-gen — walks a function's basic blocks and renders a textual,
//! x86-64-flavored assembly listing. Syntactic only: no ABI, no stack
//! frame, no calling convention — the listing exists to make register
//! pressure and control flow visible, not to be assembled.

mod error;

pub use error::AsmError;

use std::collections::HashMap;
use std::fmt::Write as _;

use tacc_regalloc::ColorMap;
use tacc_tac::{FunctionBlock, InstrKind, Instruction, Tac};
use tacc_util::{Token, TokenKind};

/// General-purpose registers available to the allocator's color indices.
/// `rax`/`rdx` are reserved for the return value and the `idiv` dividend
/// pair, so they never appear in a color mapping.
const REGISTERS: &[&str] = &["rbx", "rcx", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15"];
const RETURN_REGISTER: &str = "rax";

/// Renders the whole program. `colors` maps each function's name to the
/// register-coloring map `tacc-regalloc` produced for it.
pub fn generate(tac: &Tac, colors: &HashMap<String, ColorMap>) -> Result<String, AsmError> {
    let mut out = String::new();
    for func in &tac.functions {
        let empty = ColorMap::new();
        let map = colors.get(&func.name.lexeme).unwrap_or(&empty);
        emit_function(&mut out, func, map)?;
    }
    Ok(out)
}

fn emit_function(out: &mut String, func: &FunctionBlock, colors: &ColorMap) -> Result<(), AsmError> {
    let _ = writeln!(out, "{}:", func.name.lexeme);
    for block in func.blocks.iter() {
        for instr in &block.instructions {
            emit_instruction(out, instr, colors)?;
        }
    }
    Ok(())
}

fn operand(tok: &Token, colors: &ColorMap) -> Result<String, AsmError> {
    match tok.kind {
        TokenKind::Number => Ok(tok.lexeme.clone()),
        TokenKind::Identifier => register_for(&tok.lexeme, colors, Some(tok.clone())),
        _ => Ok(tok.lexeme.clone()),
    }
}

fn register_for(name: &str, colors: &ColorMap, token: Option<Token>) -> Result<String, AsmError> {
    if name.starts_with("%param") {
        return Ok(name.to_string());
    }
    let Some(&color) = colors.get(name) else {
        return Err(AsmError::UnallocatedName { name: name.to_string(), token });
    };
    REGISTERS.get(color).map(|r| r.to_string()).ok_or_else(|| AsmError::ImpossibleAllocation {
        detail: format!("color {color} for '{name}' exceeds the {}-register pool", REGISTERS.len()),
    })
}

fn emit_instruction(out: &mut String, instr: &Instruction, colors: &ColorMap) -> Result<(), AsmError> {
    match instr.kind {
        InstrKind::Decl | InstrKind::Assign => emit_decl_or_assign(out, instr, colors)?,
        InstrKind::Param | InstrKind::Call => {
            let _ = writeln!(out, "    ; unreachable: {} has no surviving call site", if instr.kind == InstrKind::Param { "param" } else { "call" });
        }
        InstrKind::Label => {
            let _ = writeln!(out, "{}:", instr.res.as_ref().unwrap().lexeme);
        }
        InstrKind::Goto => {
            let _ = writeln!(out, "    jmp {}", instr.res.as_ref().unwrap().lexeme);
        }
        InstrKind::If | InstrKind::While | InstrKind::For => {
            let cond = operand(instr.res.as_ref().unwrap(), colors)?;
            let true_label = &instr.left.as_ref().unwrap().lexeme;
            let false_label = &instr.right.as_ref().unwrap().lexeme;
            let _ = writeln!(out, "    cmp {cond}, 0");
            let _ = writeln!(out, "    jne {true_label}");
            let _ = writeln!(out, "    jmp {false_label}");
        }
        InstrKind::Return => {
            if let Some(v) = &instr.res {
                let src = operand(v, colors)?;
                let _ = writeln!(out, "    mov {RETURN_REGISTER}, {src}");
            }
            let _ = writeln!(out, "    ret");
        }
    }
    Ok(())
}

fn emit_decl_or_assign(out: &mut String, instr: &Instruction, colors: &ColorMap) -> Result<(), AsmError> {
    let dst = register_for(&instr.res.as_ref().unwrap().lexeme, colors, instr.res.clone())?;

    let Some(op) = &instr.op else {
        // Pure copy: `DECL x = v` or `ASSIGN x = v` with no operator.
        let src = operand(instr.left.as_ref().unwrap(), colors)?;
        let _ = writeln!(out, "    mov {dst}, {src}");
        return Ok(());
    };

    let left = operand(instr.left.as_ref().unwrap(), colors)?;

    let Some(right_tok) = &instr.right else {
        // Unary `!`/`~`: a single operand, no right-hand side.
        return match op.kind {
            TokenKind::BitNot => {
                let _ = writeln!(out, "    mov {dst}, {left}");
                let _ = writeln!(out, "    not {dst}");
                Ok(())
            }
            TokenKind::LogNot => {
                let _ = writeln!(out, "    cmp {left}, 0");
                let _ = writeln!(out, "    sete al");
                let _ = writeln!(out, "    movzx {dst}, al");
                Ok(())
            }
            _ => Err(AsmError::UnsupportedOperator { token: op.clone() }),
        };
    };
    let right = operand(right_tok, colors)?;

    match op.kind {
        TokenKind::Plus => {
            let _ = writeln!(out, "    mov {dst}, {left}");
            let _ = writeln!(out, "    add {dst}, {right}");
        }
        TokenKind::Minus => {
            let _ = writeln!(out, "    mov {dst}, {left}");
            let _ = writeln!(out, "    sub {dst}, {right}");
        }
        TokenKind::Multiply => {
            let _ = writeln!(out, "    mov {dst}, {left}");
            let _ = writeln!(out, "    imul {dst}, {right}");
        }
        TokenKind::Divide => {
            let _ = writeln!(out, "    mov rax, {left}");
            let _ = writeln!(out, "    cqo");
            let _ = writeln!(out, "    idiv {right}");
            let _ = writeln!(out, "    mov {dst}, rax");
        }
        TokenKind::Modulus => {
            let _ = writeln!(out, "    mov rax, {left}");
            let _ = writeln!(out, "    cqo");
            let _ = writeln!(out, "    idiv {right}");
            let _ = writeln!(out, "    mov {dst}, rdx");
        }
        TokenKind::LessThan | TokenKind::GreaterThan | TokenKind::Equal => {
            let set = match op.kind {
                TokenKind::LessThan => "setl",
                TokenKind::GreaterThan => "setg",
                _ => "sete",
            };
            let _ = writeln!(out, "    cmp {left}, {right}");
            let _ = writeln!(out, "    {set} al");
            let _ = writeln!(out, "    movzx {dst}, al");
        }
        _ => return Err(AsmError::UnsupportedOperator { token: op.clone() }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;
    use tacc_lex::Lexer;
    use tacc_par::Parser;
    use tacc_regalloc::{analyze_block_liveness, analyze_instruction_liveness, build_interference_graph, greedy_color};
    use tacc_tac::{generate as generate_tac, Cfg};

    fn asm_for(src: &str) -> String {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        let tac = generate_tac(&program).unwrap();
        let mut colors = Map::new();
        for func in &tac.functions {
            let cfg = Cfg::build(func);
            let block_liveness = analyze_block_liveness(func, &cfg);
            let instr_liveness = analyze_instruction_liveness(func, &block_liveness);
            let graph = build_interference_graph(func, &instr_liveness);
            colors.insert(func.name.lexeme.clone(), greedy_color(&graph));
        }
        generate(&tac, &colors).unwrap()
    }

    #[test]
    fn a_pure_copy_becomes_a_mov() {
        let asm = asm_for("int main() { int x = 1; int y = x; return y; }");
        assert!(asm.lines().any(|l| l.trim_start().starts_with("mov") && l.contains(", 1")));
    }

    #[test]
    fn addition_becomes_mov_then_add() {
        let asm = asm_for("int main() { int x = 1; int y = 2; int z = x + y; return z; }");
        assert!(asm.contains("add"));
    }

    #[test]
    fn division_lowers_through_cqo_and_idiv() {
        let asm = asm_for("int main() { int x = 10; int y = 3; int z = x / y; return z; }");
        assert!(asm.contains("cqo"));
        assert!(asm.contains("idiv"));
    }

    #[test]
    fn a_comparison_sets_and_zero_extends() {
        let asm = asm_for("int main() { int x = 1; int y = 2; int z = x < y; return z; }");
        assert!(asm.contains("setl"));
        assert!(asm.contains("movzx"));
    }

    #[test]
    fn an_if_condition_compares_against_zero_and_branches_both_ways() {
        let asm = asm_for("int main() { int x = 0; if (x) { x = 1; } return x; }");
        assert!(asm.contains("cmp") && asm.contains("jne") && asm.contains("jmp"));
    }

    #[test]
    fn a_return_moves_into_the_return_register() {
        let asm = asm_for("int main() { return 42; }");
        assert!(asm.lines().any(|l| l.contains("mov rax, 42")));
        assert!(asm.lines().any(|l| l.trim() == "ret"));
    }

    #[test]
    fn bitwise_not_becomes_mov_then_not() {
        let asm = asm_for("int main() { int x = 1; int y = ~x; return y; }");
        assert!(asm.lines().any(|l| l.trim_start().starts_with("not ")));
    }

    #[test]
    fn logical_not_compares_against_zero_and_zero_extends() {
        let asm = asm_for("int main() { int x = 0; int y = !x; return y; }");
        assert!(asm.contains("sete"));
        assert!(asm.contains("movzx"));
    }

    #[test]
    fn unallocated_name_is_reported_rather_than_panicking() {
        let tokens = Lexer::tokenize("int main() { int x = 1; return x; }").unwrap();
        let program = Parser::parse(tokens).unwrap();
        let tac = generate_tac(&program).unwrap();
        let colors = Map::new();
        assert!(matches!(generate(&tac, &colors), Err(AsmError::UnallocatedName { .. })));
    }
}
