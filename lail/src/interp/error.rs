//! Runtime errors for the interpreter

use super::Value;
use std::fmt;

/// Runtime error during evaluation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Unbound identifier (strict mode only)
    UndefinedVariable,
    /// Operand or argument of the wrong type
    TypeError,
    /// Argument count mismatch
    ArityMismatch,
    /// Call depth exceeded
    StackOverflow,
    /// Writing builtin output failed
    IoError,
    /// Control flow: early return (with value)
    Return(Box<Value>),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        // Return is control flow; its payload is not part of the kind
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl RuntimeError {
    pub fn undefined_variable(name: &str, hint: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedVariable,
            message: format!("undefined variable: {name}{hint}"),
        }
    }

    /// Operator applied to operand types it does not support
    pub fn type_mismatch(op: &str, left: &Value, right: &Value) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!(
                "Operator {op} does not support operands of type \"{}\" and \"{}\".",
                left.type_name(),
                right.type_name()
            ),
        }
    }

    /// User function called with the wrong number of arguments
    pub fn arity_mismatch(expected: usize, got: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!(
                "Illegal State: function call expected {expected} parameter(s); got {got} argument(s)."
            ),
        }
    }

    pub fn builtin_arity(name: &str, expected: usize, got: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!("{name} expects {expected} argument(s), got {got}"),
        }
    }

    pub fn unsupported_argument(name: &str, arg: &Value) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!("argument to {name} not supported, got {}", arg.type_name()),
        }
    }

    pub fn stack_overflow(depth: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: format!("stack overflow: call depth exceeded {depth}"),
        }
    }

    pub fn io_error(msg: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::IoError,
            message: format!("IO error: {msg}"),
        }
    }

    /// Return signal carrying `value` up to the nearest call boundary
    pub fn return_value(value: Value) -> Self {
        RuntimeError {
            kind: ErrorKind::Return(Box::new(value)),
            message: String::new(),
        }
    }

    /// True for control-flow signals that are not failures
    pub fn is_control_flow(&self) -> bool {
        matches!(self.kind, ErrorKind::Return(_))
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
