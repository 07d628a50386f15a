//! Types representing a single lexical unit of a Jack class.

/// Byte range of a lexeme within the compiled source
/// (used for error reporting).
pub type Span = std::ops::Range<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text of the token (string constants keep their quotes).
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn is_symbol(&self, symbol: char) -> bool {
        matches!(self.kind, TokenKind::Symbol(s) if s == symbol)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.kind, TokenKind::Keyword(k) if k == keyword)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(char),
    Identifier(String),
    IntegerConstant(u16),
    /// Content between the quotes, with no escape processing.
    StringConstant(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}
