//! Token definitions

use crate::ast::Span;
use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a lexical unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Unrecognized input (never silently dropped)
    Illegal,
    /// End of input
    Eof,

    // Literals
    Ident,
    Int,
    String,

    // Operators
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,

    // Punctuation
    Comma,
    Dot,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Import,
    Return,
}

/// Reserved words. Anything not listed here lexes as [`TokenKind::Ident`].
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("fn", TokenKind::Function),
    ("let", TokenKind::Let),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("import", TokenKind::Import),
    ("return", TokenKind::Return),
];

impl TokenKind {
    /// Resolve an identifier against the keyword table
    pub fn lookup_ident(ident: &str) -> TokenKind {
        KEYWORDS
            .iter()
            .find(|(word, _)| *word == ident)
            .map(|(_, kind)| *kind)
            .unwrap_or(TokenKind::Ident)
    }

    /// Human-readable name used in diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::String => "STRING",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Semicolon => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Function => "fn",
            TokenKind::Let => "let",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Import => "import",
            TokenKind::Return => "return",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A positioned token
///
/// `line` and `column` are 1-based and point at the first character.
/// For string tokens `literal` holds the decoded contents (escapes applied,
/// quotes stripped); for every other kind it is the source slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize, span: Span) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::String => write!(f, "{:?}", self.literal),
            _ => write!(f, "{}", self.literal),
        }
    }
}

/// Raw scanner output, before keyword resolution and position tracking
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub(super) enum RawToken {
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Assign,
    #[token("!")]
    Bang,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token("\"", lex_string)]
    String,

    #[regex("[0-9]+")]
    Int,

    // Letters, underscore, and the emoji blocks (emoticons, pictographs,
    // transport, misc symbols, dingbats, variation selectors, flags)
    #[regex(
        r"[\p{L}_\x{2600}-\x{27BF}\x{FE00}-\x{FE0F}\x{1F1E6}-\x{1F1FF}\x{1F300}-\x{1F64F}\x{1F680}-\x{1F6FF}\x{1F900}-\x{1F9FF}][\p{L}0-9_\x{2600}-\x{27BF}\x{FE00}-\x{FE0F}\x{1F1E6}-\x{1F1FF}\x{1F300}-\x{1F64F}\x{1F680}-\x{1F6FF}\x{1F900}-\x{1F9FF}]*"
    )]
    Ident,
}

impl RawToken {
    pub(super) fn kind(self) -> TokenKind {
        match self {
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::Assign => TokenKind::Assign,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Asterisk => TokenKind::Asterisk,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::String => TokenKind::String,
            RawToken::Int => TokenKind::Int,
            RawToken::Ident => TokenKind::Ident,
        }
    }
}

/// Scan to the closing quote, honouring backslash escapes.
/// An unterminated string consumes the rest of the input and is rejected.
fn lex_string(lex: &mut logos::Lexer<RawToken>) -> bool {
    let rest = lex.remainder();
    let mut escaped = false;
    for (i, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => {
                lex.bump(i + 1);
                return true;
            }
            _ => {}
        }
    }
    lex.bump(rest.len());
    false
}

/// Decode the body of a string literal (without its quotes).
/// Unknown escapes are dropped along with their backslash.
pub(super) fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            _ => {}
        }
    }
    out
}
