//! The three-pass semantic analyzer:
//!
//! 1. type restrictions — only `int` survives; strings/chars/calls/member
//!    access are rejected outright.
//! 2. undefined use — every identifier reference must resolve by walking
//!    the scope chain.
//! 3. uninitialized use — a conservative, path-insensitive
//!    definite-assignment check.
//!
//! Each pass re-walks the AST in lockstep with the scope tree built by
//! [`crate::builder::build_symbol_table`]. Scopes are entered by an
//! ordered cursor over each scope's children rather than by name lookup:
//! sibling `block` scopes (e.g. the two arms of an `if`/`else`, both
//! compound statements) share a name, so a name-indexed lookup cannot
//! tell them apart. An index keyed to AST visitation order can, because
//! the builder and the analyzer visit children in the same order.

use crate::error::SemanticError;
use crate::scope::{ScopeId, SymbolTable};
use std::collections::{HashMap, HashSet};
use tacc_par::ast::*;
use tacc_util::TokenKind;

pub struct SemanticAnalyzer<'a> {
    table: &'a SymbolTable,
    current: ScopeId,
    /// Per-scope count of `block`/`for_stmt` children already consumed by
    /// this pass, reset at the start of every pass.
    cursor: HashMap<ScopeId, usize>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table, current: table.global, cursor: HashMap::new() }
    }

    pub fn analyze(program: &Program, table: &SymbolTable) -> Result<(), SemanticError> {
        let mut analyzer = SemanticAnalyzer::new(table);
        analyzer.check_type_restrictions(program)?;
        analyzer.current = table.global;
        analyzer.cursor.clear();
        analyzer.check_undefined_variables(program)?;
        analyzer.current = table.global;
        analyzer.cursor.clear();
        analyzer.check_uninitialized_usage(program)
    }

    fn enter_named_child(&mut self, name: &str) {
        for &child in &self.table.scopes[self.current].children {
            if self.table.scopes[child].name == name {
                self.current = child;
                return;
            }
        }
        unreachable!("internal error: scope '{name}' not found");
    }

    /// Enter the next not-yet-visited `block`/`for_stmt` child of the
    /// current scope, in creation order.
    fn enter_next_nested_scope(&mut self) {
        let next_index = *self.cursor.entry(self.current).or_insert(0);
        let child = self.table.scopes[self.current].children[next_index];
        self.cursor.insert(self.current, next_index + 1);
        self.current = child;
    }

    fn exit_scope(&mut self) {
        if let Some(parent) = self.table.scopes[self.current].parent {
            self.current = parent;
        }
    }

    fn is_defined(&self, name: &str) -> bool {
        self.table.lookup(self.current, name).is_some()
    }

    fn check_compound_restrictions(&mut self, block: &CompoundStatement) -> Result<(), SemanticError> {
        self.enter_next_nested_scope();
        for item in &block.items {
            self.check_stmt_restrictions(item)?;
        }
        self.exit_scope();
        Ok(())
    }

    fn check_compound_undefined(&mut self, block: &CompoundStatement) -> Result<(), SemanticError> {
        self.enter_next_nested_scope();
        for item in &block.items {
            self.check_stmt_undefined(item)?;
        }
        self.exit_scope();
        Ok(())
    }

    fn check_compound_initialization(
        &mut self,
        block: &CompoundStatement,
        initialized: &mut HashSet<String>,
    ) -> Result<(), SemanticError> {
        let mut block_init = initialized.clone();
        self.enter_next_nested_scope();
        for item in &block.items {
            self.check_stmt_initialization(item, &mut block_init)?;
        }
        self.exit_scope();
        Ok(())
    }

    // ================= Pass 1: type restrictions =================

    fn check_type_restrictions(&mut self, program: &Program) -> Result<(), SemanticError> {
        for unit in &program.units {
            match unit {
                TopLevel::FunctionDefinition(def) => {
                    check_type_is_int(&def.return_type)?;
                    for param in &def.params {
                        check_type_is_int(&param.decl_type)?;
                    }
                    self.enter_named_child(&def.name.lexeme);
                    self.check_compound_restrictions(&def.body)?;
                    self.exit_scope();
                }
                TopLevel::FunctionDeclaration(decl) => {
                    check_type_is_int(&decl.return_type)?;
                    for param in &decl.params {
                        check_type_is_int(&param.decl_type)?;
                    }
                }
                TopLevel::Declaration(decl) => {
                    check_type_is_int(&decl.decl_type)?;
                    for var in &decl.declarations {
                        if let Some(init) = &var.initializer {
                            check_expr_restrictions(init)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_stmt_restrictions(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Declaration(decl) => {
                check_type_is_int(&decl.decl_type)?;
                for var in &decl.declarations {
                    if let Some(init) = &var.initializer {
                        check_expr_restrictions(init)?;
                    }
                }
                Ok(())
            }
            Stmt::Expr(stmt) => {
                if let Some(expr) = &stmt.expression {
                    check_expr_restrictions(expr)?;
                }
                Ok(())
            }
            Stmt::Return(ret) => {
                if let Some(expr) = &ret.expression {
                    check_expr_restrictions(expr)?;
                }
                Ok(())
            }
            Stmt::Compound(block) => self.check_compound_restrictions(block),
            Stmt::If(if_stmt) => {
                check_expr_restrictions(&if_stmt.condition)?;
                self.check_stmt_restrictions(&if_stmt.then_branch)?;
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.check_stmt_restrictions(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(w) => {
                check_expr_restrictions(&w.condition)?;
                self.check_stmt_restrictions(&w.body)
            }
            Stmt::DoWhile(d) => {
                self.check_stmt_restrictions(&d.body)?;
                check_expr_restrictions(&d.condition)
            }
            Stmt::For(f) => {
                self.enter_next_nested_scope();
                if let Some(init) = &f.initializer {
                    match init {
                        ForInit::Declaration(decl) => {
                            check_type_is_int(&decl.decl_type)?;
                            for var in &decl.declarations {
                                if let Some(e) = &var.initializer {
                                    check_expr_restrictions(e)?;
                                }
                            }
                        }
                        ForInit::Expression(expr_stmt) => {
                            if let Some(e) = &expr_stmt.expression {
                                check_expr_restrictions(e)?;
                            }
                        }
                    }
                }
                if let Some(cond) = &f.condition {
                    check_expr_restrictions(cond)?;
                }
                if let Some(inc) = &f.increment {
                    check_expr_restrictions(inc)?;
                }
                self.check_stmt_restrictions(&f.body)?;
                self.exit_scope();
                Ok(())
            }
            Stmt::Switch(sw) => {
                check_expr_restrictions(&sw.expression)?;
                for section in &sw.sections {
                    for label in &section.labels {
                        if let SwitchLabel::Case { expression, .. } = label {
                            check_expr_restrictions(expression)?;
                        }
                    }
                    for item in &section.items {
                        self.check_stmt_restrictions(item)?;
                    }
                }
                Ok(())
            }
            Stmt::Label(label) => self.check_stmt_restrictions(&label.statement),
            Stmt::Goto(_) | Stmt::Break | Stmt::Continue => Ok(()),
        }
    }

    // ================= Pass 2: undefined use =================

    fn check_undefined_variables(&mut self, program: &Program) -> Result<(), SemanticError> {
        for unit in &program.units {
            match unit {
                TopLevel::FunctionDefinition(def) => {
                    self.enter_named_child(&def.name.lexeme);
                    self.check_compound_undefined(&def.body)?;
                    self.exit_scope();
                }
                TopLevel::Declaration(decl) => {
                    for var in &decl.declarations {
                        if let Some(init) = &var.initializer {
                            self.check_expr_undefined(init)?;
                        }
                    }
                }
                TopLevel::FunctionDeclaration(_) => {}
            }
        }
        Ok(())
    }

    fn check_stmt_undefined(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Declaration(decl) => {
                for var in &decl.declarations {
                    if let Some(init) = &var.initializer {
                        self.check_expr_undefined(init)?;
                    }
                }
                Ok(())
            }
            Stmt::Expr(stmt) => {
                if let Some(expr) = &stmt.expression {
                    self.check_expr_undefined(expr)?;
                }
                Ok(())
            }
            Stmt::Return(ret) => {
                if let Some(expr) = &ret.expression {
                    self.check_expr_undefined(expr)?;
                }
                Ok(())
            }
            Stmt::Compound(block) => self.check_compound_undefined(block),
            Stmt::If(if_stmt) => {
                self.check_expr_undefined(&if_stmt.condition)?;
                self.check_stmt_undefined(&if_stmt.then_branch)?;
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.check_stmt_undefined(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(w) => {
                self.check_expr_undefined(&w.condition)?;
                self.check_stmt_undefined(&w.body)
            }
            Stmt::DoWhile(d) => {
                self.check_stmt_undefined(&d.body)?;
                self.check_expr_undefined(&d.condition)
            }
            Stmt::For(f) => {
                self.enter_next_nested_scope();
                if let Some(init) = &f.initializer {
                    match init {
                        ForInit::Declaration(decl) => {
                            for var in &decl.declarations {
                                if let Some(e) = &var.initializer {
                                    self.check_expr_undefined(e)?;
                                }
                            }
                        }
                        ForInit::Expression(expr_stmt) => {
                            if let Some(e) = &expr_stmt.expression {
                                self.check_expr_undefined(e)?;
                            }
                        }
                    }
                }
                if let Some(cond) = &f.condition {
                    self.check_expr_undefined(cond)?;
                }
                if let Some(inc) = &f.increment {
                    self.check_expr_undefined(inc)?;
                }
                self.check_stmt_undefined(&f.body)?;
                self.exit_scope();
                Ok(())
            }
            Stmt::Switch(sw) => {
                self.check_expr_undefined(&sw.expression)?;
                for section in &sw.sections {
                    for label in &section.labels {
                        if let SwitchLabel::Case { expression, .. } = label {
                            self.check_expr_undefined(expression)?;
                        }
                    }
                    for item in &section.items {
                        self.check_stmt_undefined(item)?;
                    }
                }
                Ok(())
            }
            Stmt::Label(label) => self.check_stmt_undefined(&label.statement),
            Stmt::Goto(_) | Stmt::Break | Stmt::Continue => Ok(()),
        }
    }

    fn check_expr_undefined(&mut self, expr: &Expr) -> Result<(), SemanticError> {
        match expr {
            Expr::Identifier(tok) => {
                if !self.is_defined(&tok.lexeme) {
                    return Err(SemanticError::UndefinedUse {
                        name: tok.lexeme.clone(),
                        token: tok.clone(),
                    });
                }
                Ok(())
            }
            Expr::Binary(b) => {
                self.check_expr_undefined(&b.left)?;
                self.check_expr_undefined(&b.right)
            }
            Expr::Assignment(a) => {
                self.check_expr_undefined(&a.right)?;
                if let Expr::Identifier(tok) = a.left.as_ref() {
                    if !self.is_defined(&tok.lexeme) {
                        return Err(SemanticError::UndefinedAssign {
                            name: tok.lexeme.clone(),
                            token: tok.clone(),
                        });
                    }
                }
                Ok(())
            }
            Expr::Prefix(p) => self.check_expr_undefined(&p.operand),
            Expr::Postfix(p) => self.check_expr_undefined(&p.operand),
            Expr::Literal(_) => Ok(()),
            Expr::Call(_) | Expr::Member(_) => Ok(()),
        }
    }

    // ================= Pass 3: uninitialized use =================

    fn check_uninitialized_usage(&mut self, program: &Program) -> Result<(), SemanticError> {
        for unit in &program.units {
            if let TopLevel::FunctionDefinition(def) = unit {
                self.enter_named_child(&def.name.lexeme);
                let mut initialized: HashSet<String> = HashSet::new();
                for param in &def.params {
                    if let Some(name) = &param.name {
                        initialized.insert(name.lexeme.clone());
                    }
                }
                self.check_compound_initialization(&def.body, &mut initialized)?;
                self.exit_scope();
            }
        }
        Ok(())
    }

    fn check_stmt_initialization(
        &mut self,
        stmt: &Stmt,
        initialized: &mut HashSet<String>,
    ) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Declaration(decl) => {
                for var in &decl.declarations {
                    if let Some(init) = &var.initializer {
                        check_expr_initialization(init, initialized)?;
                        initialized.insert(var.name.lexeme.clone());
                    }
                }
                Ok(())
            }
            Stmt::Expr(stmt) => {
                if let Some(expr @ Expr::Assignment(a)) = &stmt.expression {
                    if a.operator.kind == TokenKind::Assign {
                        check_expr_initialization(&a.right, initialized)?;
                        if let Expr::Identifier(tok) = a.left.as_ref() {
                            initialized.insert(tok.lexeme.clone());
                        }
                    } else {
                        // Compound assignment reads the LHS before writing
                        // it, so the LHS-initialized requirement applies.
                        check_expr_initialization(expr, initialized)?;
                    }
                } else if let Some(expr) = &stmt.expression {
                    check_expr_initialization(expr, initialized)?;
                }
                Ok(())
            }
            Stmt::Return(ret) => {
                if let Some(expr) = &ret.expression {
                    check_expr_initialization(expr, initialized)?;
                }
                Ok(())
            }
            // A fresh copy is passed down: block-local initializations never leak out.
            Stmt::Compound(block) => self.check_compound_initialization(block, initialized),
            Stmt::If(if_stmt) => {
                check_expr_initialization(&if_stmt.condition, initialized)?;
                let mut then_init = initialized.clone();
                self.check_stmt_initialization(&if_stmt.then_branch, &mut then_init)?;
                if let Some(else_branch) = &if_stmt.else_branch {
                    let mut else_init = initialized.clone();
                    self.check_stmt_initialization(else_branch, &mut else_init)?;
                }
                // Conservative: neither branch's initializations propagate out.
                Ok(())
            }
            Stmt::While(w) => {
                check_expr_initialization(&w.condition, initialized)?;
                let mut body_init = initialized.clone();
                self.check_stmt_initialization(&w.body, &mut body_init)
            }
            Stmt::DoWhile(d) => {
                // The body runs at least once: it mutates the *same* set,
                // so its initializations ARE visible after the loop (and
                // to the condition). This is the one asymmetric case.
                self.check_stmt_initialization(&d.body, initialized)?;
                check_expr_initialization(&d.condition, initialized)
            }
            Stmt::For(f) => {
                self.enter_next_nested_scope();
                let mut for_init = initialized.clone();
                if let Some(init) = &f.initializer {
                    match init {
                        ForInit::Declaration(decl) => {
                            for var in &decl.declarations {
                                if let Some(e) = &var.initializer {
                                    check_expr_initialization(e, &mut for_init)?;
                                    for_init.insert(var.name.lexeme.clone());
                                }
                            }
                        }
                        ForInit::Expression(expr_stmt) => {
                            if let Some(Expr::Assignment(a)) = &expr_stmt.expression {
                                check_expr_initialization(&a.right, &mut for_init)?;
                                if a.operator.kind == TokenKind::Assign {
                                    if let Expr::Identifier(tok) = a.left.as_ref() {
                                        for_init.insert(tok.lexeme.clone());
                                        // Unlike the declaration arm, a plain
                                        // `=` initializer also marks the
                                        // *outer* set — an asymmetry carried
                                        // over verbatim.
                                        initialized.insert(tok.lexeme.clone());
                                    }
                                }
                            } else if let Some(expr) = &expr_stmt.expression {
                                check_expr_initialization(expr, &mut for_init)?;
                            }
                        }
                    }
                }
                if let Some(cond) = &f.condition {
                    check_expr_initialization(cond, &mut for_init)?;
                }
                let mut body_init = for_init.clone();
                self.check_stmt_initialization(&f.body, &mut body_init)?;
                if let Some(inc) = &f.increment {
                    check_expr_initialization(inc, &mut for_init)?;
                }
                self.exit_scope();
                Ok(())
            }
            Stmt::Switch(sw) => {
                check_expr_initialization(&sw.expression, initialized)?;
                for section in &sw.sections {
                    for label in &section.labels {
                        if let SwitchLabel::Case { expression, .. } = label {
                            check_expr_initialization(expression, initialized)?;
                        }
                    }
                    for item in &section.items {
                        self.check_stmt_initialization(item, initialized)?;
                    }
                }
                Ok(())
            }
            Stmt::Label(label) => self.check_stmt_initialization(&label.statement, initialized),
            Stmt::Goto(_) | Stmt::Break | Stmt::Continue => Ok(()),
        }
    }
}

fn check_type_is_int(decl_type: &DeclarationTypes) -> Result<(), SemanticError> {
    if decl_type.base.kind != TokenKind::Int {
        return Err(SemanticError::TypeRestriction {
            message: format!(
                "type '{}' is not supported; this compiler only supports 'int' (signed 64-bit integers)",
                decl_type.base.lexeme
            ),
            token: decl_type.base.clone(),
        });
    }
    for spec in &decl_type.specifiers {
        if matches!(spec.kind, TokenKind::Unsigned | TokenKind::Const | TokenKind::Static) {
            return Err(SemanticError::TypeRestriction {
                message: format!(
                    "type specifier '{}' is not supported; this compiler only supports plain 'int' (signed 64-bit)",
                    spec.lexeme
                ),
                token: spec.clone(),
            });
        }
    }
    Ok(())
}

fn check_expr_restrictions(expr: &Expr) -> Result<(), SemanticError> {
    match expr {
        Expr::Literal(tok) => match tok.kind {
            TokenKind::StringLiteral => Err(SemanticError::TypeRestriction {
                message: "string literals are not supported; this compiler only supports signed 64-bit integers".into(),
                token: tok.clone(),
            }),
            TokenKind::CharLiteral => Err(SemanticError::TypeRestriction {
                message: "character literals are not supported; this compiler only supports signed 64-bit integers".into(),
                token: tok.clone(),
            }),
            _ => Ok(()),
        },
        Expr::Call(call) => Err(SemanticError::TypeRestriction {
            message: "function calls are not supported in this compiler; only variable declarations, assignments, and control flow are allowed".into(),
            token: callee_token(&call.callee),
        }),
        Expr::Member(member) => Err(SemanticError::TypeRestriction {
            message: "member access (struct/union fields) is not supported in this compiler; only simple integer variables are allowed".into(),
            token: member.property.clone(),
        }),
        Expr::Binary(b) => {
            check_expr_restrictions(&b.left)?;
            check_expr_restrictions(&b.right)
        }
        Expr::Assignment(a) => {
            check_expr_restrictions(&a.left)?;
            check_expr_restrictions(&a.right)
        }
        Expr::Prefix(p) => check_expr_restrictions(&p.operand),
        Expr::Postfix(p) => check_expr_restrictions(&p.operand),
        Expr::Identifier(_) => Ok(()),
    }
}

fn callee_token(expr: &Expr) -> tacc_util::Token {
    match expr {
        Expr::Identifier(tok) | Expr::Literal(tok) => tok.clone(),
        _ => tacc_util::Token::synthetic(TokenKind::Eof, ""),
    }
}

fn check_expr_initialization(expr: &Expr, initialized: &HashSet<String>) -> Result<(), SemanticError> {
    match expr {
        Expr::Identifier(tok) => {
            if !initialized.contains(&tok.lexeme) {
                return Err(SemanticError::Uninitialized {
                    name: tok.lexeme.clone(),
                    token: tok.clone(),
                });
            }
            Ok(())
        }
        Expr::Binary(b) => {
            check_expr_initialization(&b.left, initialized)?;
            check_expr_initialization(&b.right, initialized)
        }
        Expr::Assignment(a) => {
            check_expr_initialization(&a.right, initialized)?;
            if a.operator.kind != TokenKind::Assign {
                if let Expr::Identifier(tok) = a.left.as_ref() {
                    if !initialized.contains(&tok.lexeme) {
                        return Err(SemanticError::UninitializedCompoundAssign {
                            name: tok.lexeme.clone(),
                            token: tok.clone(),
                        });
                    }
                }
            }
            Ok(())
        }
        Expr::Prefix(p) => {
            if matches!(p.operator.kind, TokenKind::Increment | TokenKind::Decrement) {
                if let Expr::Identifier(tok) = p.operand.as_ref() {
                    if !initialized.contains(&tok.lexeme) {
                        return Err(SemanticError::UninitializedIncDec {
                            name: tok.lexeme.clone(),
                            token: tok.clone(),
                        });
                    }
                }
                Ok(())
            } else {
                check_expr_initialization(&p.operand, initialized)
            }
        }
        Expr::Postfix(p) => {
            if matches!(p.operator.kind, TokenKind::Increment | TokenKind::Decrement) {
                if let Expr::Identifier(tok) = p.operand.as_ref() {
                    if !initialized.contains(&tok.lexeme) {
                        return Err(SemanticError::UninitializedIncDec {
                            name: tok.lexeme.clone(),
                            token: tok.clone(),
                        });
                    }
                }
                Ok(())
            } else {
                check_expr_initialization(&p.operand, initialized)
            }
        }
        Expr::Literal(_) => Ok(()),
        Expr::Call(_) | Expr::Member(_) => Ok(()),
    }
}
