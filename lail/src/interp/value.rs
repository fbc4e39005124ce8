//! Runtime values for the interpreter

use super::builtins::Builtin;
use super::env::EnvRef;
use crate::ast::{BlockStatement, write_list};
use std::fmt;
use std::rc::Rc;

/// Runtime value
///
/// Cloning is cheap: strings, arrays and functions are reference counted.
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit integer
    Int(i64),
    /// Immutable string
    Str(Rc<str>),
    /// Boolean
    Bool(bool),
    /// The absence of a value
    Null,
    /// Ordered, immutable sequence
    Array(Rc<Vec<Value>>),
    /// User function closed over its definition environment
    Function(Rc<Function>),
    /// Native function from the builtin registry
    Builtin(Builtin),
}

/// A closure: parameters, shared body, and the environment it was created in
pub struct Function {
    /// Inferred from `let name = fn ...`; display only
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<BlockStatement>,
    pub env: EnvRef,
}

// The captured environment may contain this very function
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    /// Type tag reported by `typeof` and in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Integer",
            Value::Str(_) => "String",
            Value::Bool(_) => "Boolean",
            Value::Null => "Null",
            Value::Array(_) => "Array",
            Value::Function(_) => "Function",
            Value::Builtin(_) => "Builtin",
        }
    }

    /// Integer coercion used by arithmetic: booleans are 1/0, everything
    /// that is not an integer is 0
    pub fn as_integer(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Bool(true) => 1,
            _ => 0,
        }
    }

    /// Condition semantics: nonzero integers and `true`; nothing else
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "{func}"),
            Value::Builtin(builtin) => write!(f, "builtin {}", builtin.name),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "fn {name}(")?,
            None => write!(f, "fn(")?,
        }
        write_list(f, &self.params)?;
        write!(f, ") {}", self.body)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}
