//! Builds a [`SymbolTable`] by walking the parsed [`Program`] once.
//!
//! A function gets two nested scopes: one named after the function
//! (parameters live there), and a `block` scope nested inside it for the
//! body — exactly mirroring how `{ ... }` always opens its own scope.
//! `if`/`while`/`do`-`while` bodies only get a scope when they are
//! themselves a compound statement; a bare single statement body shares
//! the enclosing scope.

use crate::error::SymbolTableError;
use crate::scope::{Symbol, SymbolKind, SymbolTable};
use tacc_par::ast::*;

pub fn build_symbol_table(program: &Program) -> Result<SymbolTable, SymbolTableError> {
    let mut table = SymbolTable::new();
    for unit in &program.units {
        match unit {
            TopLevel::FunctionDefinition(def) => {
                add_function(&mut table, &def.name, &def.return_type, true)?;
                table.enter_scope(def.name.lexeme.clone());
                add_params(&mut table, &def.params)?;
                add_compound_stmt(&mut table, &def.body)?;
                table.exit_scope()?;
            }
            TopLevel::FunctionDeclaration(decl) => {
                add_function(&mut table, &decl.name, &decl.return_type, false)?;
            }
            TopLevel::Declaration(decl) => {
                add_decl_stmt(&mut table, decl, SymbolKind::Global)?;
            }
        }
    }
    Ok(table)
}

fn add_function(
    table: &mut SymbolTable,
    name: &tacc_util::Token,
    decl_type: &DeclarationTypes,
    _has_body: bool,
) -> Result<(), SymbolTableError> {
    let current = table.current();
    let scope = &mut table.scopes[current];
    if let Some(existing) = scope.symbols.get_mut(&name.lexeme) {
        if existing.kind == SymbolKind::Func {
            if existing.type_name != decl_type.base.lexeme {
                return Err(SymbolTableError::FunctionRedeclaredWithDifferentType {
                    name: name.lexeme.clone(),
                    token: name.clone(),
                });
            }
            existing.line = name.line;
            existing.column = name.column;
            return Ok(());
        }
        return Err(SymbolTableError::Redeclared { name: name.lexeme.clone() });
    }
    table.add_symbol(Symbol {
        name: name.lexeme.clone(),
        kind: SymbolKind::Func,
        type_name: decl_type.base.lexeme.clone(),
        line: name.line,
        column: name.column,
    })
}

fn add_params(table: &mut SymbolTable, params: &[ParamDeclaration]) -> Result<(), SymbolTableError> {
    for param in params {
        if let Some(name) = &param.name {
            table.add_symbol(Symbol {
                name: name.lexeme.clone(),
                kind: SymbolKind::Param,
                type_name: param.decl_type.base.lexeme.clone(),
                line: name.line,
                column: name.column,
            })?;
        }
    }
    Ok(())
}

fn add_decl_stmt(
    table: &mut SymbolTable,
    decl: &DeclarationStatement,
    kind: SymbolKind,
) -> Result<(), SymbolTableError> {
    for var in &decl.declarations {
        table.add_symbol(Symbol {
            name: var.name.lexeme.clone(),
            kind,
            type_name: decl.decl_type.base.lexeme.clone(),
            line: var.name.line,
            column: var.name.column,
        })?;
    }
    Ok(())
}

fn add_compound_stmt(table: &mut SymbolTable, block: &CompoundStatement) -> Result<(), SymbolTableError> {
    table.enter_scope("block");
    for stmt in &block.items {
        traverse_stmt(table, stmt)?;
    }
    table.exit_scope()
}

fn traverse_stmt(table: &mut SymbolTable, stmt: &Stmt) -> Result<(), SymbolTableError> {
    match stmt {
        Stmt::Declaration(decl) => add_decl_stmt(table, decl, SymbolKind::Local),
        Stmt::Compound(block) => add_compound_stmt(table, block),
        Stmt::If(if_stmt) => {
            traverse_stmt(table, &if_stmt.then_branch)?;
            if let Some(else_branch) = &if_stmt.else_branch {
                traverse_stmt(table, else_branch)?;
            }
            Ok(())
        }
        Stmt::While(while_stmt) => traverse_stmt(table, &while_stmt.body),
        Stmt::DoWhile(do_while) => traverse_stmt(table, &do_while.body),
        Stmt::For(for_stmt) => {
            table.enter_scope("for_stmt");
            if let Some(ForInit::Declaration(decl)) = &for_stmt.initializer {
                add_decl_stmt(table, decl, SymbolKind::Local)?;
            }
            traverse_stmt(table, &for_stmt.body)?;
            table.exit_scope()
        }
        Stmt::Switch(switch) => {
            for section in &switch.sections {
                for item in &section.items {
                    traverse_stmt(table, item)?;
                }
            }
            Ok(())
        }
        Stmt::Label(label) => traverse_stmt(table, &label.statement),
        Stmt::Return(_) | Stmt::Goto(_) | Stmt::Break | Stmt::Continue | Stmt::Expr(_) => Ok(()),
    }
}
