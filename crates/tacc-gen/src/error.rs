use tacc_util::Token;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsmError {
    #[error("register allocation produced no mapping for '{name}'")]
    UnallocatedName { name: String, token: Option<Token> },

    #[error("impossible allocation request: {detail}")]
    ImpossibleAllocation { detail: String },

    #[error("assembly emitter cannot lower this operator")]
    UnsupportedOperator { token: Token },
}

impl AsmError {
    /// The token naming the offending position, when the failing variant
    /// has one to offer; `ImpossibleAllocation` is a whole-function error.
    pub fn token(&self) -> Option<Token> {
        match self {
            AsmError::UnallocatedName { token, .. } => token.clone(),
            AsmError::ImpossibleAllocation { .. } => None,
            AsmError::UnsupportedOperator { token } => Some(token.clone()),
        }
    }
}
