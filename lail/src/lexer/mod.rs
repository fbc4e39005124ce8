//! Lexer implementation using logos
//!
//! [`Lexer`] pulls one [`Token`] at a time and tracks the 1-based line and
//! column of each token's first character. Once the input is exhausted every
//! further call yields an `Eof` token.

mod token;

pub use token::{Token, TokenKind};

use crate::ast::Span;
use logos::Logos;
use token::{unescape, RawToken};

/// Lazy token stream over a source string
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, RawToken>,
    /// Byte offset up to which `line`/`column` have been computed
    cursor: usize,
    line: usize,
    /// Characters consumed on the current line
    column: usize,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: RawToken::lexer(source),
            cursor: 0,
            line: 1,
            column: 0,
            done: false,
        }
    }

    /// Produce the next token; `Eof` forever once the input is exhausted
    pub fn next_token(&mut self) -> Token {
        let Some(result) = self.inner.next() else {
            self.done = true;
            let end = self.source.len();
            let (line, column) = self.position_of(end);
            return Token::new(TokenKind::Eof, "", line, column, Span::new(end, end));
        };

        let span = Span::from(self.inner.span());
        let (line, column) = self.position_of(span.start);
        let slice = self.inner.slice();

        let (kind, literal) = match result {
            Ok(RawToken::String) => {
                let body = &slice[1..slice.len() - 1];
                (TokenKind::String, unescape(body))
            }
            Ok(RawToken::Ident) => (TokenKind::lookup_ident(slice), slice.to_string()),
            Ok(raw) => (raw.kind(), slice.to_string()),
            Err(()) => (TokenKind::Illegal, slice.to_string()),
        };

        Token::new(kind, literal, line, column, span)
    }

    /// Whether `Eof` has been produced at least once
    pub fn is_exhausted(&self) -> bool {
        self.done
    }

    /// Advance the line/column bookkeeping up to `offset`
    fn position_of(&mut self, offset: usize) -> (usize, usize) {
        if offset > self.cursor {
            for ch in self.source[self.cursor..offset].chars() {
                if ch == '\n' {
                    self.line += 1;
                    self.column = 0;
                } else {
                    self.column += 1;
                }
            }
            self.cursor = offset;
        }
        (self.line, self.column + 1)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token up to, but not including, `Eof`
    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

/// Tokenize a whole source string (without the trailing `Eof`)
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}
