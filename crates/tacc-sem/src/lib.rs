//! tacc-sem — symbol table construction and semantic analysis.

mod analyzer;
mod builder;
mod error;
mod scope;

pub use analyzer::SemanticAnalyzer;
pub use builder::build_symbol_table;
pub use error::{SemanticError, SymbolTableError};
pub use scope::{Scope, ScopeId, Symbol, SymbolKind, SymbolTable};

use tacc_par::ast::Program;

/// Build the symbol table and run all three analysis passes.
pub fn analyze(program: &Program) -> Result<SymbolTable, AnalysisError> {
    let table = build_symbol_table(program)?;
    SemanticAnalyzer::analyze(program, &table)?;
    Ok(table)
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    SymbolTable(#[from] SymbolTableError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn analyze_src(src: &str) -> Result<SymbolTable, AnalysisError> {
        let tokens = Lexer::tokenize(src).unwrap();
        let program = Parser::parse(tokens).unwrap();
        analyze(&program)
    }

    #[test]
    fn accepts_well_formed_program() {
        let table = analyze_src("int main() { int x = 1; return x; }").unwrap();
        assert!(table.lookup(table.global, "main").is_some());
    }

    #[test]
    fn rejects_non_int_type() {
        let err = analyze_src("char c;").unwrap_err();
        assert!(matches!(err, AnalysisError::Semantic(SemanticError::TypeRestriction { .. })));
    }

    #[test]
    fn rejects_string_literals() {
        let err = analyze_src("int main() { int x = \"hi\"; return 0; }").unwrap_err();
        assert!(matches!(err, AnalysisError::Semantic(SemanticError::TypeRestriction { .. })));
    }

    #[test]
    fn rejects_undefined_variable_use() {
        let err = analyze_src("int main() { return y; }").unwrap_err();
        assert!(matches!(err, AnalysisError::Semantic(SemanticError::UndefinedUse { .. })));
    }

    #[test]
    fn rejects_use_before_initialization() {
        let err = analyze_src("int main() { int x; return x; }").unwrap_err();
        assert!(matches!(err, AnalysisError::Semantic(SemanticError::Uninitialized { .. })));
    }

    #[test]
    fn if_branch_initializations_do_not_leak_out() {
        let err = analyze_src(
            "int main() { int x; if (1) { x = 1; } return x; }",
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Semantic(SemanticError::Uninitialized { .. })));
    }

    #[test]
    fn do_while_body_initializations_do_leak_out() {
        let table = analyze_src(
            "int main() { int x; int n = 0; do { x = 1; n = n + 1; } while (n); return x; }",
        )
        .unwrap();
        assert!(table.lookup(table.global, "main").is_some());
    }

    #[test]
    fn rejects_compound_assignment_to_an_uninitialized_variable() {
        let err = analyze_src("int main() { int x; x += 1; return x; }").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Semantic(SemanticError::UninitializedCompoundAssign { .. })
        ));
    }

    #[test]
    fn rejects_redeclaration_in_the_same_scope() {
        let err = analyze_src("int main() { int x; int x; return 0; }").unwrap_err();
        assert!(matches!(err, AnalysisError::SymbolTable(SymbolTableError::Redeclared { .. })));
    }

    #[test]
    fn function_may_be_redeclared_with_identical_return_type() {
        let table = analyze_src("int helper(int x); int helper(int x) { return x; }").unwrap();
        assert!(table.lookup(table.global, "helper").is_some());
    }

    #[test]
    fn rejects_function_calls() {
        let err = analyze_src("int main() { return helper(); } int helper() { return 0; }").unwrap_err();
        assert!(matches!(err, AnalysisError::Semantic(SemanticError::TypeRestriction { .. })));
    }
}
