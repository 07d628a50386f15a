//! Common data shared across the compiler
//! (tokens and their source locations).
pub mod token;

pub use token::{Keyword, Span, Token, TokenKind};
