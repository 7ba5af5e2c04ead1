use tacc_util::Token;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TacError {
    #[error("'{what}' requires an identifier operand")]
    RequiresIdentifier { what: &'static str, token: Token },

    #[error("break used outside of a loop or switch")]
    BreakOutsideLoop { token: Token },

    #[error("continue used outside of a loop")]
    ContinueOutsideLoop { token: Token },

    #[error("call to an expression that is not a plain function name")]
    UnsupportedCallee { token: Token },

    #[error("member access is not supported by the three-address code generator")]
    UnsupportedMemberAccess { token: Token },

    #[error("global initializer must be a literal or another identifier")]
    NonConstantGlobalInitializer { token: Token },

    #[error("division or modulus by zero")]
    DivisionByZero { token: Token },
}

impl TacError {
    /// The token naming the offending position, for diagnostic rendering.
    pub fn token(&self) -> Option<Token> {
        match self {
            TacError::RequiresIdentifier { token, .. }
            | TacError::BreakOutsideLoop { token }
            | TacError::ContinueOutsideLoop { token }
            | TacError::UnsupportedCallee { token }
            | TacError::UnsupportedMemberAccess { token }
            | TacError::NonConstantGlobalInitializer { token }
            | TacError::DivisionByZero { token } => Some(token.clone()),
        }
    }
}
