//! Binding power of infix-position tokens

use crate::lexer::TokenKind;

/// Ordered lowest to highest; `Ord` is what the parser compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `=`
    Assignment,
    /// `==` `!=`
    Equals,
    /// `<` `>` `<=` `>=`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// unary `!` `-`
    Prefix,
    /// `(` and `.`
    Call,
}

impl Precedence {
    /// Precedence of `kind` in infix position
    pub fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Assign => Precedence::Assignment,
            TokenKind::EqEq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
                Precedence::LessGreater
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
            TokenKind::LParen | TokenKind::Dot => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}
