//! Tree-walking interpreter
//!
//! Values, environments, the builtin registry and the evaluator itself.
//! Runtime failures travel on the `Err` side of [`InterpResult`]; so does the
//! `return` signal, which is unwrapped at call boundaries and at the top of
//! a program.

pub mod builtins;
mod env;
mod error;
mod eval;
mod value;

pub use builtins::{Builtin, BuiltinFn};
pub use env::{EnvRef, Environment, child_env};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{CapturedOutput, Interpreter};
pub use value::{Function, Value};
