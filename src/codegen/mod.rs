//! Logic for converting `Jack` source directly
//! to Hack VM instructions.
//!
//! There is no intermediate syntax tree: every grammar production
//! consumes its tokens and emits its instructions in a single pass.

use std::io::BufRead;

use context::{ClassContext, Symbol, SymbolKind};
use error::{Error, FallableAction};
use vm::VMWriter;

use crate::{
    common::{Keyword, Span, Token, TokenKind},
    tokenizer::Tokenizer,
};

mod array;
mod call;
mod class;
pub mod context;
pub mod error;
mod expression;
mod literal;
pub mod runtime;
mod statements;
mod subroutine;
mod variable;
pub mod vm;

#[cfg(test)]
mod interpreter;

/// Compile a single class, emitting its instructions into `output`.
pub fn construct_class<R: BufRead, W: VMWriter>(source: R, output: W) -> Result<W, Error> {
    let mut compiler = Compiler::new(source, output)?;

    class::construct(&mut compiler)?;

    Ok(compiler.output)
}

/// Everything needed while compiling one class: the token source,
/// the class context (symbols, labels) and the instruction sink.
#[derive(Debug)]
struct Compiler<R, W> {
    tokenizer: Tokenizer<R>,
    context: ClassContext,
    output: W,
}

impl<R: BufRead, W: VMWriter> Compiler<R, W> {
    fn new(source: R, output: W) -> Result<Self, Error> {
        Ok(Self {
            tokenizer: Tokenizer::new(source)?,
            context: ClassContext::new(),
            output,
        })
    }

    // region: emission

    fn emit(&mut self, instruction: vm::VMInstruction) -> FallableAction {
        log::trace!("{instruction}");

        self.output.write(instruction).map_err(Error::Emit)
    }

    fn emit_all<I>(&mut self, instructions: I) -> FallableAction
    where
        I: IntoIterator<Item = vm::VMInstruction>,
    {
        instructions
            .into_iter()
            .try_for_each(|instruction| self.emit(instruction))
    }

    // endregion

    // region: tokens

    fn current_keyword(&self) -> Option<Keyword> {
        match self.tokenizer.current()?.kind {
            TokenKind::Keyword(keyword) => Some(keyword),
            _ => None,
        }
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.current_keyword() == Some(keyword)
    }

    fn at_symbol(&self, symbol: char) -> bool {
        self.tokenizer
            .current()
            .is_some_and(|token| token.is_symbol(symbol))
    }

    /// Error describing that the current token is not the `expected` one.
    fn unexpected(&self, expected: &str) -> Error {
        match self.tokenizer.current() {
            Some(token) => unexpected_token(token.clone(), expected),
            None => Error::UnexpectedEndOfInput {
                expected: expected.to_owned(),
            },
        }
    }

    /// Consume the current token, whatever it is.
    fn advance(&mut self, expected: &str) -> Result<Token, Error> {
        self.tokenizer
            .advance()?
            .ok_or_else(|| Error::UnexpectedEndOfInput {
                expected: expected.to_owned(),
            })
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<Token, Error> {
        let expected = format!("`{symbol}`");

        if self.at_symbol(symbol) {
            self.advance(&expected)
        } else {
            Err(self.unexpected(&expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, Error> {
        let expected = format!("`{keyword}`");

        if self.at_keyword(keyword) {
            self.advance(&expected)
        } else {
            Err(self.unexpected(&expected))
        }
    }

    /// Consume an identifier, returning its name and location.
    fn expect_identifier(&mut self, expected: &str) -> Result<(String, Span), Error> {
        let is_identifier = matches!(
            self.tokenizer.current(),
            Some(Token {
                kind: TokenKind::Identifier(_),
                ..
            })
        );

        if !is_identifier {
            return Err(self.unexpected(expected));
        }

        let token = self.advance(expected)?;

        Ok((token.lexeme, token.span))
    }

    /// Consume a variable type (`int`, `char`, `boolean` or a class name).
    fn expect_type(&mut self) -> Result<String, Error> {
        let expected = "a type";

        let is_type = matches!(
            self.tokenizer.current().map(|token| &token.kind),
            Some(
                TokenKind::Keyword(Keyword::Int | Keyword::Char | Keyword::Boolean)
                    | TokenKind::Identifier(_)
            )
        );

        if !is_type {
            return Err(self.unexpected(expected));
        }

        Ok(self.advance(expected)?.lexeme)
    }

    // endregion

    // region: symbols

    /// Define a symbol in the scope its kind belongs to.
    ///
    /// Names have to be unique within a single scope.
    fn define(
        &mut self,
        name: String,
        type_name: String,
        kind: SymbolKind,
        span: Span,
    ) -> FallableAction {
        let scope = match kind {
            SymbolKind::Static | SymbolKind::Field => &mut self.context.class_scope,
            SymbolKind::Argument | SymbolKind::Local => &mut self.context.subroutine_scope,
        };

        if scope.lookup(&name).is_some() {
            return Err(Error::SymbolAlreadyDefined { name, span });
        }

        scope.define(name, type_name, kind);

        Ok(())
    }

    fn resolve(&self, name: &str, span: Span) -> Result<Symbol, Error> {
        self.context
            .resolve(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedSymbol {
                name: name.to_owned(),
                span,
            })
    }

    // endregion
}

fn unexpected_token(token: Token, expected: &str) -> Error {
    Error::UnexpectedToken {
        expected: expected.to_owned(),
        found: token.lexeme,
        span: token.span,
    }
}
