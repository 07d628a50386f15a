//! Classification of a single, already delimited lexeme.

use chumsky::{error::SimpleReason, prelude::*};
use phf::phf_map;

use crate::common::{Keyword, TokenKind};

type LexemeError = Simple<char>;

/// Characters which always form a token on their own.
pub const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

/// Largest integer constant the target machine can load.
pub const MAX_INTEGER: u16 = 32767;

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "function" => Keyword::Function,
    "method" => Keyword::Method,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "boolean" => Keyword::Boolean,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

pub fn is_symbol(c: char) -> bool {
    SYMBOLS.contains(c)
}

/// Whether the character ends a word or number lexeme.
pub fn is_boundary(c: char) -> bool {
    c.is_whitespace() || is_symbol(c) || c == '"'
}

#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Lexeme matches no token class.
    Invalid,
    /// Lexeme is an integer constant larger than [`MAX_INTEGER`].
    OutOfRange,
    /// Lexeme is a string constant with a character code larger than [`MAX_INTEGER`].
    CharacterOutOfRange,
}

const INTEGER_OUT_OF_RANGE: &str = "integer constant out of range";
const CHARACTER_OUT_OF_RANGE: &str = "character out of range";

/// Classify a lexeme, checking (in order) for a string constant,
/// an integer constant, a symbol and finally a keyword or an identifier.
pub fn classify(lexeme: &str) -> Result<TokenKind, Rejection> {
    lexeme_parser().parse(lexeme).map_err(|errors| {
        errors
            .iter()
            .find_map(|error| match error.reason() {
                SimpleReason::Custom(message) if message == CHARACTER_OUT_OF_RANGE => {
                    Some(Rejection::CharacterOutOfRange)
                }
                SimpleReason::Custom(_) => Some(Rejection::OutOfRange),
                _ => None,
            })
            .unwrap_or(Rejection::Invalid)
    })
}

fn lexeme_parser() -> impl Parser<char, TokenKind, Error = LexemeError> {
    let string = just('"')
        .ignore_then(none_of('"').repeated())
        .then_ignore(just('"'))
        .try_map(|chars: Vec<char>, span| {
            // every character is pushed as an integer constant
            if chars.iter().all(|&c| u32::from(c) <= u32::from(MAX_INTEGER)) {
                Ok(TokenKind::StringConstant(chars.into_iter().collect()))
            } else {
                Err(LexemeError::custom(span, CHARACTER_OUT_OF_RANGE))
            }
        });

    let integer = filter(char::is_ascii_digit)
        .repeated()
        .at_least(1)
        .try_map(|digits: Vec<char>, span| {
            digits
                .into_iter()
                .collect::<String>()
                .parse::<u16>()
                .ok()
                .filter(|value| *value <= MAX_INTEGER)
                .map(TokenKind::IntegerConstant)
                .ok_or_else(|| LexemeError::custom(span, INTEGER_OUT_OF_RANGE))
        });

    let symbol = one_of(SYMBOLS).map(TokenKind::Symbol);

    // a word cannot start with a digit (that would be an integer constant)
    let word = filter(|c: &char| !c.is_ascii_digit() && !is_boundary(*c))
        .then(filter(|c: &char| !is_boundary(*c)).repeated())
        .map(|(first, rest)| std::iter::once(first).chain(rest).collect::<String>())
        .map(|word| {
            KEYWORDS
                .get(word.as_str())
                .copied()
                .map_or(TokenKind::Identifier(word), TokenKind::Keyword)
        });

    string.or(integer).or(symbol).or(word).then_ignore(end())
}
