//! Pratt parser
//!
//! Every token kind that can start an expression has a prefix rule; every
//! kind that can continue one has an infix rule and a [`Precedence`].
//! `parse_expression(min)` runs the prefix rule for the current token and
//! then keeps folding infix rules while the next token binds tighter than
//! `min`.
//!
//! Diagnostics are accumulated rather than returned on the first failure. A
//! statement that fails contributes no node; the parser skips to the next
//! statement boundary and carries on.

mod precedence;

#[cfg(test)]
mod tests;

pub use precedence::Precedence;

use crate::ast::{
    BlockStatement, Expr, FnLiteral, ImportStatement, InfixOp, PrefixOp, Program, Span, Spanned,
    Statement,
};
use crate::config::{Config, DEFAULT_MAX_IMPORT_DEPTH};
use crate::error::{CompileError, ParseError, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::loader::{FileLoader, SourceLoader};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, trace, warn};

type PResult<T> = std::result::Result<T, ParseError>;

/// Stack growth parameters for deeply nested input
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

type PrefixRule<'a> = fn(&mut Parser<'a>) -> PResult<Spanned<Expr>>;
type InfixRule<'a> = fn(&mut Parser<'a>, Spanned<Expr>) -> PResult<Spanned<Expr>>;

static FILE_LOADER: FileLoader = FileLoader;

/// Parser over a single source text
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
    peek: Token,
    errors: Vec<ParseError>,

    loader: &'a dyn SourceLoader,
    /// Directory relative imports resolve against
    base_dir: PathBuf,
    bare_blocks: bool,
    max_import_depth: usize,
    /// Origins of the files currently being imported, outermost first
    import_stack: Vec<String>,
}

impl<'a> Parser<'a> {
    /// Parser resolving imports from the local filesystem
    pub fn new(source: &'a str) -> Self {
        Self::with_loader(source, &FILE_LOADER)
    }

    pub fn with_loader(source: &'a str, loader: &'a dyn SourceLoader) -> Self {
        let mut lexer = Lexer::new(source);
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
            loader,
            base_dir: PathBuf::from("."),
            bare_blocks: false,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            import_stack: Vec::new(),
        }
    }

    /// Apply the parse-related settings of `config`
    pub fn configure(self, config: &Config) -> Self {
        self.base_dir(config.base_dir.clone())
            .bare_blocks(config.bare_blocks)
            .max_import_depth(config.max_import_depth)
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn bare_blocks(mut self, enable: bool) -> Self {
        self.bare_blocks = enable;
        self
    }

    pub fn max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    /// Identity of the text being parsed, so importing it again is a cycle
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.import_stack.push(origin.into());
        self
    }

    /// Diagnostics collected so far, in source order
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Parse until end of input
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement_recovering() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Program::new(statements)
    }

    // ---- token cursor ----

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    /// Advance if the next token is `kind`, otherwise report it
    fn expect_peek(&mut self, kind: TokenKind) -> PResult<()> {
        if self.peek_is(kind) {
            self.next_token();
            Ok(())
        } else {
            Err(self.peek_error(kind.describe()))
        }
    }

    fn error_at(token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(message, token.line, token.column, token.span)
    }

    fn peek_error(&self, expected: &str) -> ParseError {
        Self::error_at(&self.peek, format!("Expected: {expected} Found: {}", self.peek))
    }

    /// Span from `start` through the current token
    fn span_from(&self, start: Span) -> Span {
        start.merge(self.cur.span)
    }

    /// Skip trailing semicolons after a statement
    fn skip_semicolons(&mut self) {
        while self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    // ---- statements ----

    fn parse_statement_recovering(&mut self) -> Option<Statement> {
        match self.parse_statement() {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                trace!(error = %err, "statement dropped");
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    /// Skip to the end of the failed statement without consuming a closing
    /// brace or the start of the next statement
    fn synchronize(&mut self) {
        while !matches!(
            self.cur.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            if matches!(
                self.peek.kind,
                TokenKind::RBrace
                    | TokenKind::Eof
                    | TokenKind::Let
                    | TokenKind::Return
                    | TokenKind::Import
            ) {
                return;
            }
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> PResult<Statement> {
        match self.cur.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Import => self.parse_import_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> PResult<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = Spanned::new(self.cur.literal.clone(), self.cur.span);
        self.expect_peek(TokenKind::Assign)?;
        self.next_token();

        let value = infer_fn_name(self.parse_expression(Precedence::Lowest)?, &name.node);
        self.skip_semicolons();
        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> PResult<Statement> {
        let value = if matches!(
            self.peek.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            None
        } else {
            self.next_token();
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        self.skip_semicolons();
        Ok(Statement::Return { value })
    }

    fn parse_expression_statement(&mut self) -> PResult<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolons();
        Ok(Statement::Expression(expr))
    }

    /// `import "path"`: load, parse and embed the imported program
    fn parse_import_statement(&mut self) -> PResult<Statement> {
        self.expect_peek(TokenKind::String)?;
        let path_token = self.cur.clone();
        let path = path_token.literal.clone();

        if self.import_stack.len() >= self.max_import_depth {
            return Err(Self::error_at(
                &path_token,
                format!("Import depth exceeds {} at {path}", self.max_import_depth),
            ));
        }

        let loaded = match self.loader.load(&path, &self.base_dir) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(path = %path, error = %err, "import failed");
                return Err(Self::error_at(
                    &path_token,
                    format!("Unable to locate and read file at {path}"),
                ));
            }
        };

        if self.import_stack.contains(&loaded.origin) {
            return Err(Self::error_at(&path_token, format!("Import cycle detected at {path}")));
        }

        debug!(path = %path, origin = %loaded.origin, "parsing import");
        let mut sub = Parser::with_loader(&loaded.text, self.loader)
            .base_dir(loaded.base.clone())
            .bare_blocks(self.bare_blocks)
            .max_import_depth(self.max_import_depth);
        sub.import_stack = self.import_stack.clone();
        sub.import_stack.push(loaded.origin.clone());

        let program = sub.parse_program();
        self.errors
            .extend(sub.take_errors().into_iter().map(|e| e.in_import(path.as_str())));

        self.skip_semicolons();
        Ok(Statement::Import(ImportStatement {
            path: Spanned::new(path, path_token.span),
            program,
        }))
    }

    /// `{ ... }`, or a single statement when bare blocks are enabled.
    /// Expects the block to start at the next token.
    fn parse_block(&mut self) -> PResult<BlockStatement> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.parse_block_inner())
    }

    fn parse_block_inner(&mut self) -> PResult<BlockStatement> {
        if !self.peek_is(TokenKind::LBrace) {
            if !self.bare_blocks {
                return Err(self.peek_error("{"));
            }
            self.next_token();
            let start = self.cur.span;
            let stmt = self.parse_statement()?;
            return Ok(BlockStatement {
                statements: vec![stmt],
                span: self.span_from(start),
            });
        }

        self.next_token();
        let start = self.cur.span;
        self.next_token();

        let mut statements = Vec::new();
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            match self.parse_statement_recovering() {
                Some(stmt) => statements.push(stmt),
                // the failed statement ran into this block's closing brace
                None if self.cur_is(TokenKind::RBrace) => break,
                None => {}
            }
            self.next_token();
        }
        if self.cur_is(TokenKind::Eof) {
            return Err(Self::error_at(&self.cur, "Expected: } Found: EOF"));
        }

        Ok(BlockStatement {
            statements,
            span: self.span_from(start),
        })
    }

    // ---- expressions ----

    fn parse_expression(&mut self, min: Precedence) -> PResult<Spanned<Expr>> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.parse_expression_inner(min)
        })
    }

    fn parse_expression_inner(&mut self, min: Precedence) -> PResult<Spanned<Expr>> {
        let Some(prefix) = Self::prefix_rule(self.cur.kind) else {
            return Err(self.no_prefix_error());
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && min < Precedence::of(self.peek.kind) {
            let Some(infix) = Self::infix_rule(self.peek.kind) else {
                return Ok(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }
        Ok(left)
    }

    fn prefix_rule(kind: TokenKind) -> Option<PrefixRule<'a>> {
        let rule: PrefixRule<'a> = match kind {
            TokenKind::Ident => Self::parse_identifier,
            TokenKind::Int => Self::parse_integer,
            TokenKind::String => Self::parse_string,
            TokenKind::True | TokenKind::False => Self::parse_boolean,
            TokenKind::Bang | TokenKind::Minus => Self::parse_prefix,
            TokenKind::LParen => Self::parse_grouped,
            TokenKind::LBracket => Self::parse_array,
            TokenKind::If => Self::parse_if,
            TokenKind::Function => Self::parse_function,
            _ => return None,
        };
        Some(rule)
    }

    fn infix_rule(kind: TokenKind) -> Option<InfixRule<'a>> {
        let rule: InfixRule<'a> = match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq => Self::parse_infix,
            TokenKind::LParen => Self::parse_call,
            TokenKind::Dot => Self::parse_member_call,
            TokenKind::Assign => Self::parse_assignment,
            _ => return None,
        };
        Some(rule)
    }

    fn no_prefix_error(&self) -> ParseError {
        let message = match self.cur.kind {
            TokenKind::Illegal => format!("Illegal token {}", self.cur.literal),
            TokenKind::Eof => "Expected: expression Found: EOF".to_string(),
            kind => format!("no prefix parse function for {kind} found"),
        };
        Self::error_at(&self.cur, message)
    }

    fn leaf(&self, expr: Expr) -> Spanned<Expr> {
        Spanned::new(expr, self.cur.span)
    }

    fn parse_identifier(&mut self) -> PResult<Spanned<Expr>> {
        Ok(self.leaf(Expr::Ident(self.cur.literal.clone())))
    }

    fn parse_integer(&mut self) -> PResult<Spanned<Expr>> {
        match self.cur.literal.parse::<i64>() {
            Ok(n) => Ok(self.leaf(Expr::IntLit(n))),
            Err(_) => Err(Self::error_at(
                &self.cur,
                format!("could not parse {:?} as integer", self.cur.literal),
            )),
        }
    }

    fn parse_string(&mut self) -> PResult<Spanned<Expr>> {
        Ok(self.leaf(Expr::StringLit(self.cur.literal.clone())))
    }

    fn parse_boolean(&mut self) -> PResult<Spanned<Expr>> {
        Ok(self.leaf(Expr::BoolLit(self.cur_is(TokenKind::True))))
    }

    fn parse_prefix(&mut self) -> PResult<Spanned<Expr>> {
        let start = self.cur.span;
        let op = if self.cur_is(TokenKind::Bang) {
            PrefixOp::Not
        } else {
            PrefixOp::Neg
        };
        self.next_token();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Ok(Spanned::new(
            Expr::Prefix {
                op,
                operand: Box::new(operand),
            },
            self.span_from(start),
        ))
    }

    fn parse_grouped(&mut self) -> PResult<Spanned<Expr>> {
        let start = self.cur.span;
        self.next_token();
        let inner = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Ok(Spanned::new(inner.node, self.span_from(start)))
    }

    fn parse_array(&mut self) -> PResult<Spanned<Expr>> {
        let start = self.cur.span;
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Ok(Spanned::new(Expr::Array(elements), self.span_from(start)))
    }

    fn parse_if(&mut self) -> PResult<Spanned<Expr>> {
        let start = self.cur.span;
        self.expect_peek(TokenKind::LParen)?;
        self.next_token();
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;

        let consequence = self.parse_block()?;
        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Spanned::new(
            Expr::If {
                cond: Box::new(cond),
                consequence,
                alternative,
            },
            self.span_from(start),
        ))
    }

    fn parse_function(&mut self) -> PResult<Spanned<Expr>> {
        let start = self.cur.span;
        self.expect_peek(TokenKind::LParen)?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(Spanned::new(
            Expr::Fn(FnLiteral {
                params,
                body: Rc::new(body),
                name: None,
            }),
            self.span_from(start),
        ))
    }

    /// Parameter identifiers; the current token is `(`
    fn parse_params(&mut self) -> PResult<Vec<Spanned<String>>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Ok(params);
        }

        self.expect_peek(TokenKind::Ident)?;
        params.push(Spanned::new(self.cur.literal.clone(), self.cur.span));
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            params.push(Spanned::new(self.cur.literal.clone(), self.cur.span));
        }
        self.expect_peek(TokenKind::RParen)?;
        Ok(params)
    }

    /// Comma-separated expressions up to `end`; the current token is the
    /// opening delimiter
    fn parse_expression_list(&mut self, end: TokenKind) -> PResult<Vec<Spanned<Expr>>> {
        let mut items = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Ok(items);
        }

        self.next_token();
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            items.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Ok(items)
    }

    fn parse_infix(&mut self, left: Spanned<Expr>) -> PResult<Spanned<Expr>> {
        let op = match self.cur.kind {
            TokenKind::Plus => InfixOp::Add,
            TokenKind::Minus => InfixOp::Sub,
            TokenKind::Asterisk => InfixOp::Mul,
            TokenKind::Slash => InfixOp::Div,
            TokenKind::EqEq => InfixOp::Eq,
            TokenKind::NotEq => InfixOp::Ne,
            TokenKind::Lt => InfixOp::Lt,
            TokenKind::Gt => InfixOp::Gt,
            TokenKind::LtEq => InfixOp::Le,
            _ => InfixOp::Ge,
        };
        let precedence = Precedence::of(self.cur.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        let span = left.span.merge(right.span);
        Ok(Spanned::new(
            Expr::Infix {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        ))
    }

    fn parse_call(&mut self, callee: Spanned<Expr>) -> PResult<Spanned<Expr>> {
        let args = self.parse_expression_list(TokenKind::RParen)?;
        let span = self.span_from(callee.span);
        Ok(Spanned::new(
            Expr::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// `recv.name(args)` becomes `name(recv, args)`
    fn parse_member_call(&mut self, receiver: Spanned<Expr>) -> PResult<Spanned<Expr>> {
        self.expect_peek(TokenKind::Ident)?;
        let method = self.leaf(Expr::Ident(self.cur.literal.clone()));
        self.expect_peek(TokenKind::LParen)?;

        let mut call = self.parse_call(method)?;
        call.span = receiver.span.merge(call.span);
        if let Expr::Call { args, .. } = &mut call.node {
            args.insert(0, receiver);
        }
        Ok(call)
    }

    /// `name = value`; right-associative at the lowest level
    fn parse_assignment(&mut self, target: Spanned<Expr>) -> PResult<Spanned<Expr>> {
        let Expr::Ident(name) = &target.node else {
            return Err(Self::error_at(
                &self.cur,
                format!("Expected: Identifier as left hand side Found: {target}"),
            ));
        };
        let name = Spanned::new(name.clone(), target.span);
        self.next_token();
        let value = infer_fn_name(self.parse_expression(Precedence::Lowest)?, &name.node);
        let span = name.span.merge(value.span);
        Ok(Spanned::new(
            Expr::Assign {
                name,
                value: Box::new(value),
            },
            span,
        ))
    }
}

/// Give an anonymous function literal bound to `name` that name
fn infer_fn_name(mut value: Spanned<Expr>, name: &str) -> Spanned<Expr> {
    if let Expr::Fn(lit) = &mut value.node
        && lit.name.is_none()
    {
        lit.name = Some(name.to_string());
    }
    value
}

/// Parse a standalone source string with default settings
pub fn parse(source: &str) -> Result<Program> {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(CompileError::parse(parser.take_errors()))
    }
}

/// Parse with an explicit configuration and import loader
pub fn parse_with(source: &str, config: &Config, loader: &dyn SourceLoader) -> Result<Program> {
    let mut parser = Parser::with_loader(source, loader).configure(config);
    let program = parser.parse_program();
    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(CompileError::parse(parser.take_errors()))
    }
}
