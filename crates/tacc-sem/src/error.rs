use tacc_util::Token;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymbolTableError {
    #[error("cannot redeclare variable: {name}")]
    Redeclared { name: String },

    #[error("function redeclared with a different type: {name}")]
    FunctionRedeclaredWithDifferentType { name: String, token: Token },

    #[error("cannot escape the global scope")]
    EscapedGlobalScope,

    #[error("internal error: scope '{name}' not found")]
    ScopeNotFound { name: String },
}

#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("{message}")]
    TypeRestriction { message: String, token: Token },

    #[error("variable '{name}' is used before being declared")]
    UndefinedUse { name: String, token: Token },

    #[error("variable '{name}' is assigned before being declared")]
    UndefinedAssign { name: String, token: Token },

    #[error("variable '{name}' is used before being initialized")]
    Uninitialized { name: String, token: Token },

    #[error("variable '{name}' is used in compound assignment before being initialized")]
    UninitializedCompoundAssign { name: String, token: Token },

    #[error("variable '{name}' is used in increment/decrement before being initialized")]
    UninitializedIncDec { name: String, token: Token },
}

impl SemanticError {
    pub fn token(&self) -> &Token {
        match self {
            SemanticError::TypeRestriction { token, .. }
            | SemanticError::UndefinedUse { token, .. }
            | SemanticError::UndefinedAssign { token, .. }
            | SemanticError::Uninitialized { token, .. }
            | SemanticError::UninitializedCompoundAssign { token, .. }
            | SemanticError::UninitializedIncDec { token, .. } => token,
        }
    }
}
