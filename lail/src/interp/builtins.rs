//! Builtin function registry
//!
//! A fixed, process-wide table. The evaluator consults it only after an
//! identifier misses in every environment, so user bindings shadow builtins.

use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Builtin function type; `out` is where printing builtins write
pub type BuiltinFn = fn(out: &mut dyn Write, args: &[Value]) -> InterpResult<Value>;

/// A named native function
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, out: &mut dyn Write, args: &[Value]) -> InterpResult<Value> {
        (self.func)(out, args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

const BUILTINS: &[Builtin] = &[
    Builtin { name: "out", func: builtin_out },
    Builtin { name: "head", func: builtin_head },
    Builtin { name: "tail", func: builtin_tail },
    Builtin { name: "typeof", func: builtin_typeof },
];

/// Find a builtin by name
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

/// Names of all builtins
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

fn expect_one<'a>(name: &str, args: &'a [Value]) -> InterpResult<&'a Value> {
    match args {
        [arg] => Ok(arg),
        _ => Err(RuntimeError::builtin_arity(name, 1, args.len())),
    }
}

/// out(v...) - print display forms with no separator, return the text
fn builtin_out(out: &mut dyn Write, args: &[Value]) -> InterpResult<Value> {
    let text: String = args.iter().map(ToString::to_string).collect();
    writeln!(out, "{text}").map_err(|e| RuntimeError::io_error(&e.to_string()))?;
    Ok(Value::Str(Rc::from(text)))
}

/// head(v) - first element or first character
fn builtin_head(_out: &mut dyn Write, args: &[Value]) -> InterpResult<Value> {
    match expect_one("head", args)? {
        Value::Array(items) => Ok(items.first().cloned().unwrap_or(Value::Null)),
        Value::Str(s) => Ok(s
            .chars()
            .next()
            .map_or(Value::Null, |c| Value::str(&c.to_string()))),
        other => Err(RuntimeError::unsupported_argument("head", other)),
    }
}

/// tail(v) - everything after the first element or character
fn builtin_tail(_out: &mut dyn Write, args: &[Value]) -> InterpResult<Value> {
    match expect_one("tail", args)? {
        Value::Array(items) => Ok(Value::array(items.iter().skip(1).cloned().collect())),
        Value::Str(s) => {
            let mut chars = s.chars();
            chars.next();
            Ok(Value::str(chars.as_str()))
        }
        other => Err(RuntimeError::unsupported_argument("tail", other)),
    }
}

/// typeof(v) - type tag as a string
fn builtin_typeof(_out: &mut dyn Write, args: &[Value]) -> InterpResult<Value> {
    let arg = expect_one("typeof", args)?;
    Ok(Value::str(arg.type_name()))
}
