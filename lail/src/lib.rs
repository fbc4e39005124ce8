//! Lail Interpreter Library
//!
//! A small dynamically typed scripting language: a hand-driven lexer, a
//! Pratt parser with error recovery and a tree-walking evaluator.
//!
//! ```no_run
//! use lail::{Config, Session};
//!
//! let mut session = Session::new(Config::new());
//! let value = session.run("let add = fn(a, b) { a + b }; add(3, 5)").unwrap();
//! assert_eq!(value.to_string(), "8");
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod repl;
pub mod util;

pub use ast::{Program, Span};
pub use config::Config;
pub use error::{CompileError, ParseError, Result};
pub use interp::{CapturedOutput, Interpreter, Value};
pub use loader::SourceLoader;

use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Parser settings, an import loader and an interpreter whose global
/// environment outlives individual `run` calls
pub struct Session {
    config: Config,
    loader: Box<dyn SourceLoader>,
    interpreter: Interpreter,
    origin: Option<String>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let interpreter = Interpreter::with_config(&config);
        Session {
            config,
            loader: loader::default_loader(),
            interpreter,
            origin: None,
        }
    }

    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Redirect `out(...)`
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.interpreter.set_output(out);
        self
    }

    /// Name of the top-level source, used to detect a file importing itself
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Parse `source`, resolving imports through this session's loader
    pub fn parse(&self, source: &str) -> Result<Program> {
        let mut parser =
            parser::Parser::with_loader(source, self.loader.as_ref()).configure(&self.config);
        if let Some(origin) = &self.origin {
            parser = parser.origin(origin.clone());
        }
        let program = parser.parse_program();
        if parser.errors().is_empty() {
            debug!(statements = program.statements.len(), "parsed");
            Ok(program)
        } else {
            Err(CompileError::parse(parser.take_errors()))
        }
    }

    /// Evaluate an already parsed program
    ///
    /// A panic raised while evaluating is reported as [`CompileError::Fatal`]
    /// instead of unwinding into the caller.
    pub fn eval(&mut self, program: &Program) -> Result<Value> {
        let interpreter = &mut self.interpreter;
        match panic::catch_unwind(AssertUnwindSafe(|| interpreter.run(program))) {
            Ok(result) => Ok(result?),
            Err(payload) => Err(CompileError::fatal(panic_message(payload.as_ref()))),
        }
    }

    /// Parse and evaluate; nothing runs if any diagnostic was produced
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let program = self.parse(source)?;
        self.eval(&program)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run a source string in a fresh session writing to stdout
pub fn run_source(source: &str) -> Result<Value> {
    Session::default().run(source)
}
