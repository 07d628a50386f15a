//! Logic for splitting raw `Jack` source into tokens,
//! one token at a time (with a single token of lookahead).

use std::{io::BufRead, ops::Range};

use thiserror::Error;

use crate::common::{Span, Token};

mod lexeme;

pub use lexeme::{MAX_INTEGER, SYMBOLS};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors occurring while reading the source or classifying lexemes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token `{lexeme}`")]
    InvalidToken { lexeme: String, span: Span },

    #[error("integer constant `{lexeme}` is out of range (0..=32767)")]
    IntegerOutOfRange { lexeme: String, span: Span },

    #[error("string constant `{lexeme}` contains a character outside 0..=32767")]
    CharacterOutOfRange { lexeme: String, span: Span },

    #[error("unterminated string constant")]
    UnterminatedString { span: Span },

    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::InvalidToken { span, .. }
            | Self::IntegerOutOfRange { span, .. }
            | Self::CharacterOutOfRange { span, .. }
            | Self::UnterminatedString { span } => Some(span.clone()),
            Self::Io(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct Tokenizer<R> {
    reader: R,
    /// Current physical line, with comments replaced by spaces
    /// (so that byte offsets stay valid).
    line: String,
    cursor: usize,
    /// Byte offset of the current line within the whole source.
    line_offset: usize,
    in_block_comment: bool,
    current: Option<Token>,
}

impl<R: BufRead> Tokenizer<R> {
    /// Create a tokenizer and decode the first token.
    pub fn new(reader: R) -> Result<Self> {
        let mut tokenizer = Self {
            reader,
            line: String::new(),
            cursor: 0,
            line_offset: 0,
            in_block_comment: false,
            current: None,
        };

        tokenizer.current = tokenizer.next_token()?;

        Ok(tokenizer)
    }

    /// The buffered token the compiler is currently looking at
    /// (`None` once the source is exhausted).
    pub const fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    pub const fn has_more_tokens(&self) -> bool {
        self.current.is_some()
    }

    /// Discard the current token (returning it) and decode the next one.
    pub fn advance(&mut self) -> Result<Option<Token>> {
        let next = self.next_token()?;

        Ok(std::mem::replace(&mut self.current, next))
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            self.skip_whitespace();

            if self.cursor < self.line.len() {
                return self.scan_token().map(Some);
            }

            if !self.read_line()? {
                return Ok(None);
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.line[self.cursor..];
        self.cursor += rest.len() - rest.trim_start().len();
    }

    /// Read the next physical line, returning `false` at the end of input.
    fn read_line(&mut self) -> Result<bool> {
        self.line_offset += self.line.len();
        self.line.clear();
        self.cursor = 0;

        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(false);
        }

        self.blank_comments();

        Ok(true)
    }

    /// Replace every comment (or part of a block comment) on the current line with spaces.
    fn blank_comments(&mut self) {
        let bytes = self.line.as_bytes();
        let mut comments: Vec<Range<usize>> = Vec::new();
        let mut block_start = self.in_block_comment.then_some(0);
        let mut in_string = false;
        let mut i = 0;

        while i < bytes.len() {
            let rest = &bytes[i..];

            if let Some(start) = block_start {
                if rest.starts_with(b"*/") {
                    comments.push(start..i + 2);
                    block_start = None;
                    i += 2;
                    continue;
                }
            } else if in_string {
                in_string = bytes[i] != b'"';
            } else if bytes[i] == b'"' {
                in_string = true;
            } else if rest.starts_with(b"//") {
                comments.push(i..bytes.len());
                break;
            } else if rest.starts_with(b"/*") {
                block_start = Some(i);
                i += 2;
                continue;
            }

            i += 1;
        }

        if let Some(start) = block_start {
            comments.push(start..bytes.len());
        }
        self.in_block_comment = block_start.is_some();

        for comment in comments {
            let blank = " ".repeat(comment.len());
            self.line.replace_range(comment, &blank);
        }
    }

    fn scan_token(&mut self) -> Result<Token> {
        let rest = &self.line[self.cursor..];
        let start = self.line_offset + self.cursor;

        let length = match rest.chars().next() {
            Some('"') => match rest[1..].find('"') {
                Some(closing) => closing + 2,
                None => {
                    return Err(Error::UnterminatedString {
                        span: start..start + rest.trim_end().len(),
                    })
                }
            },
            Some(c) if lexeme::is_symbol(c) => c.len_utf8(),
            _ => rest.find(lexeme::is_boundary).unwrap_or(rest.len()),
        };

        let text = rest[..length].to_owned();
        let span = start..start + length;
        self.cursor += length;

        match lexeme::classify(&text) {
            Ok(kind) => Ok(Token {
                kind,
                lexeme: text,
                span,
            }),
            Err(lexeme::Rejection::OutOfRange) => {
                Err(Error::IntegerOutOfRange { lexeme: text, span })
            }
            Err(lexeme::Rejection::CharacterOutOfRange) => {
                Err(Error::CharacterOutOfRange { lexeme: text, span })
            }
            Err(lexeme::Rejection::Invalid) => Err(Error::InvalidToken { lexeme: text, span }),
        }
    }
}
