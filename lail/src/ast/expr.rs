//! Expression AST nodes

use super::{BlockStatement, Spanned};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Variable reference
    Ident(String),
    /// Integer literal
    IntLit(i64),
    /// String literal (decoded)
    StringLit(String),
    /// Boolean literal
    BoolLit(bool),
    /// Array literal: [a, b, c]
    Array(Vec<Spanned<Expr>>),

    /// Prefix operation: -x, !x
    Prefix {
        op: PrefixOp,
        operand: Box<Spanned<Expr>>,
    },

    /// Infix operation: left op right
    Infix {
        left: Box<Spanned<Expr>>,
        op: InfixOp,
        right: Box<Spanned<Expr>>,
    },

    /// Assignment: name = value
    Assign {
        name: Spanned<String>,
        value: Box<Spanned<Expr>>,
    },

    /// Conditional: if (cond) { ... } else { ... }
    If {
        cond: Box<Spanned<Expr>>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },

    /// Function literal
    Fn(FnLiteral),

    /// Call: callee(args). Member calls `a.f(b)` are desugared to `f(a, b)`.
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
}

/// Function literal: fn(a, b) { body }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnLiteral {
    pub params: Vec<Spanned<String>>,
    /// Shared with every function value created from this literal
    pub body: Rc<BlockStatement>,
    /// Name inferred from `let name = fn ...` or `name = fn ...`.
    /// Cosmetic only: used when rendering the function value.
    pub name: Option<String>,
}

impl FnLiteral {
    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.node.clone()).collect()
    }
}

/// Prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    /// Arithmetic negation (-)
    Neg,
    /// Logical not (!)
    Not,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Neg => write!(f, "-"),
            PrefixOp::Not => write!(f, "!"),
        }
    }
}

/// Infix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfixOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfixOp::Add => write!(f, "+"),
            InfixOp::Sub => write!(f, "-"),
            InfixOp::Mul => write!(f, "*"),
            InfixOp::Div => write!(f, "/"),
            InfixOp::Eq => write!(f, "=="),
            InfixOp::Ne => write!(f, "!="),
            InfixOp::Lt => write!(f, "<"),
            InfixOp::Gt => write!(f, ">"),
            InfixOp::Le => write!(f, "<="),
            InfixOp::Ge => write!(f, ">="),
        }
    }
}

/// Render a string literal with quotes and escapes restored
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Write `items` separated by ", "
pub(crate) fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Canonical source text: every operator application is parenthesised,
/// so the output reparses to the same tree regardless of precedence.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::IntLit(n) => write!(f, "{n}"),
            Expr::StringLit(s) => write!(f, "{}", quote(s)),
            Expr::BoolLit(b) => write!(f, "{b}"),
            Expr::Array(elements) => {
                write!(f, "[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            Expr::Prefix { op, operand } => write!(f, "({op}{operand})"),
            Expr::Infix { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::Assign { name, value } => write!(f, "({name} = {value})"),
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                write!(f, "if ({cond}) {consequence}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {alt}")?;
                }
                Ok(())
            }
            Expr::Fn(lit) => write!(f, "{lit}"),
            Expr::Call { callee, args } => {
                write!(f, "{callee}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for FnLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        write_list(f, &self.params)?;
        write!(f, ") {}", self.body)
    }
}
