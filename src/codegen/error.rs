use thiserror::Error;

use crate::{common::Span, tokenizer};

/// List of all errors that could possibly occur while compiling a class.
///
/// Every error is fatal: compilation stops at the first one.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Tokenizer(#[from] tokenizer::Error),

    #[error("expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("expected {expected}, found end of input")]
    UnexpectedEndOfInput { expected: String },

    #[error("unexpected `{found}` after the end of class `{class_name}`")]
    TrailingInput {
        class_name: String,
        found: String,
        span: Span,
    },

    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String, span: Span },

    #[error("`{name}` is already defined in this scope")]
    SymbolAlreadyDefined { name: String, span: Span },

    #[error("cannot call `{subroutine_name}` on `{name}` of primitive type `{type_name}`")]
    InvalidCallTarget {
        name: String,
        type_name: String,
        subroutine_name: String,
        span: Span,
    },

    #[error("failed to emit instruction: {0}")]
    Emit(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Semantic,
    Input,
    Output,
}

impl Error {
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Tokenizer(tokenizer::Error::Io(_)) => ErrorCategory::Input,
            Self::Tokenizer(_) => ErrorCategory::Lexical,
            Self::UnexpectedToken { .. }
            | Self::UnexpectedEndOfInput { .. }
            | Self::TrailingInput { .. } => ErrorCategory::Syntax,
            Self::UndefinedSymbol { .. }
            | Self::SymbolAlreadyDefined { .. }
            | Self::InvalidCallTarget { .. } => ErrorCategory::Semantic,
            Self::Emit(_) => ErrorCategory::Output,
        }
    }

    /// Location of the offending lexeme, if the error relates to one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Tokenizer(error) => error.span(),
            Self::UnexpectedToken { span, .. }
            | Self::TrailingInput { span, .. }
            | Self::UndefinedSymbol { span, .. }
            | Self::SymbolAlreadyDefined { span, .. }
            | Self::InvalidCallTarget { span, .. } => Some(span.clone()),
            Self::UnexpectedEndOfInput { .. } | Self::Emit(_) => None,
        }
    }
}

pub type FallableAction = Result<(), Error>;
