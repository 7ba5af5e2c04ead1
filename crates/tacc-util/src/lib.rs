//! tacc-util — Foundation types shared across the tacc compiler
//!
//! This crate holds the pieces every later stage needs and none of them
//! own: the [`Token`] value type, a typed [`IndexVec`] arena used for
//! symbol-table scopes and basic blocks, and a [`Diagnostic`] renderer
//! shared by every stage's typed error.

pub mod diagnostic;
pub mod index_vec;
pub mod token;

pub use diagnostic::Diagnostic;
pub use index_vec::{Idx, IndexVec};
pub use token::{Token, TokenKind};
