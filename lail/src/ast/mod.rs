//! Abstract Syntax Tree definitions
//!
//! The tree is built bottom-up by the parser and never mutated afterwards.
//! Every node's `Display` impl produces canonical source text that reparses
//! to a tree with the same evaluation result.

mod expr;
mod span;

pub use expr::*;
pub use span::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A program is an ordered sequence of statements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// let name = value;
    Let {
        name: Spanned<String>,
        value: Spanned<Expr>,
    },
    /// return value; / return;
    Return { value: Option<Spanned<Expr>> },
    /// Bare expression, trailing `;` optional
    Expression(Spanned<Expr>),
    /// import "path"; resolved at parse time
    Import(ImportStatement),
}

/// Brace-delimited statement sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// An `import` whose source has already been loaded and parsed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStatement {
    /// Path literal as written
    pub path: Spanned<String>,
    pub program: Program,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

fn write_statements(f: &mut fmt::Formatter<'_>, statements: &[Statement]) -> fmt::Result {
    let mut first = true;
    for stmt in statements {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{stmt}")?;
        first = false;
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statements(f, &self.statements)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {name} = {value};"),
            Statement::Return { value: Some(value) } => write!(f, "return {value};"),
            Statement::Return { value: None } => write!(f, "return;"),
            Statement::Expression(expr) => write!(f, "{expr};"),
            // Reparsing loads the file again, so a `return` in it stays local
            Statement::Import(import) => write!(f, "import {};", quote(&import.path.node)),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{ ")?;
        write_statements(f, &self.statements)?;
        write!(f, " }}")
    }
}
