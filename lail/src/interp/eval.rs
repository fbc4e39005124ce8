//! Tree-walking evaluator

use super::builtins;
use super::env::{EnvRef, Environment, child_env};
use super::error::{ErrorKind, InterpResult, RuntimeError};
use super::value::{Function, Value};
use crate::ast::{BlockStatement, Expr, InfixOp, PrefixOp, Program, Spanned, Statement};
use crate::config::{Config, DEFAULT_MAX_DEPTH};
use crate::util::{find_similar_name, format_suggestion_hint, suggestion_threshold};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::{debug, trace};

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// The interpreter
pub struct Interpreter {
    /// Global environment; persists across `run` calls
    global_env: EnvRef,
    /// Sink for `out(...)`
    out: Box<dyn Write>,
    /// Current call depth
    depth: usize,
    max_depth: usize,
    strict_identifiers: bool,
    /// String literals shared between evaluations of the same text
    string_intern: HashMap<String, Rc<str>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            global_env: Environment::new().into_ref(),
            out: Box::new(io::stdout()),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            strict_identifiers: false,
            string_intern: HashMap::new(),
        }
    }

    pub fn with_config(config: &Config) -> Self {
        Interpreter {
            max_depth: config.max_depth,
            strict_identifiers: config.strict_identifiers,
            ..Self::new()
        }
    }

    /// Redirect builtin output
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.set_output(out);
        self
    }

    pub fn set_output(&mut self, out: impl Write + 'static) {
        self.out = Box::new(out);
    }

    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    /// Evaluate a program in the global environment
    pub fn run(&mut self, program: &Program) -> InterpResult<Value> {
        // an aborted earlier run may have left the counter raised
        self.depth = 0;
        let env = Rc::clone(&self.global_env);
        self.eval_program(program, &env)
    }

    /// Evaluate statements in order; a `return` ends the program early
    pub fn eval_program(&mut self, program: &Program, env: &EnvRef) -> InterpResult<Value> {
        let mut result = Value::Null;
        for stmt in &program.statements {
            match self.eval_statement(stmt, env) {
                Ok(value) => result = value,
                Err(RuntimeError {
                    kind: ErrorKind::Return(value),
                    ..
                }) => return Ok(*value),
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// Evaluate a block; a `return` propagates to the enclosing call
    pub fn eval_block(&mut self, block: &BlockStatement, env: &EnvRef) -> InterpResult<Value> {
        let mut result = Value::Null;
        for stmt in &block.statements {
            result = self.eval_statement(stmt, env)?;
        }
        Ok(result)
    }

    pub fn eval_statement(&mut self, stmt: &Statement, env: &EnvRef) -> InterpResult<Value> {
        match stmt {
            Statement::Let { name, value } => {
                let value = self.eval(value, env)?;
                trace!(name = %name.node, "let");
                env.borrow_mut().define(name.node.as_str(), value.clone());
                Ok(value)
            }
            Statement::Return { value } => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Null,
                };
                Err(RuntimeError::return_value(value))
            }
            Statement::Expression(expr) => self.eval(expr, env),
            Statement::Import(import) => {
                debug!(path = %import.path.node, "evaluating import");
                // Shares the importing scope; a top-level return ends only the import
                self.eval_program(&import.program, env)
            }
        }
    }

    /// Evaluate an expression with automatic stack growth for deep recursion
    pub fn eval(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, env))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        match &expr.node {
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::StringLit(s) => Ok(Value::Str(self.intern_string(s))),
            Expr::Ident(name) => self.lookup(name, env),

            Expr::Array(elements) => {
                let items = self.eval_all(elements, env)?;
                Ok(Value::array(items))
            }

            Expr::Prefix { op, operand } => {
                let operand = self.eval(operand, env)?;
                Ok(eval_prefix(*op, &operand))
            }

            Expr::Infix { left, op, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                eval_infix(*op, left, right)
            }

            Expr::Assign { name, value } => {
                let value = self.eval(value, env)?;
                env.borrow_mut().assign(&name.node, value.clone());
                Ok(value)
            }

            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alt) = alternative {
                    self.eval_block(alt, env)
                } else {
                    Ok(Value::Null)
                }
            }

            Expr::Fn(lit) => Ok(Value::Function(Rc::new(Function {
                name: lit.name.clone(),
                params: lit.param_names(),
                body: Rc::clone(&lit.body),
                env: Rc::clone(env),
            }))),

            Expr::Call { callee, args } => {
                let callee = self.eval(callee, env)?;
                let args = self.eval_all(args, env)?;
                self.apply_function(&callee, &args)
            }
        }
    }

    /// Evaluate expressions left to right
    fn eval_all(&mut self, exprs: &[Spanned<Expr>], env: &EnvRef) -> InterpResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, env)).collect()
    }

    /// Environment first, then builtins, then null (or an error in strict mode)
    fn lookup(&self, name: &str, env: &EnvRef) -> InterpResult<Value> {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        if self.strict_identifiers {
            let names = env.borrow().names();
            let mut candidates: Vec<&str> = names.iter().map(String::as_str).collect();
            for builtin in builtins::names() {
                candidates.push(builtin);
            }
            let suggestion = find_similar_name(name, candidates, suggestion_threshold(name));
            return Err(RuntimeError::undefined_variable(
                name,
                &format_suggestion_hint(suggestion),
            ));
        }
        trace!(name, "unbound identifier");
        Ok(Value::Null)
    }

    /// Call a function value; anything that is not callable yields null
    pub fn apply_function(&mut self, callee: &Value, args: &[Value]) -> InterpResult<Value> {
        match callee {
            Value::Function(func) => self.call_function(func, args),
            Value::Builtin(builtin) => {
                trace!(builtin = builtin.name, args = args.len(), "builtin call");
                builtin.call(self.out.as_mut(), args)
            }
            other => {
                trace!(callee = other.type_name(), "call on non-function");
                Ok(Value::Null)
            }
        }
    }

    fn call_function(&mut self, func: &Function, args: &[Value]) -> InterpResult<Value> {
        if func.params.len() != args.len() {
            return Err(RuntimeError::arity_mismatch(func.params.len(), args.len()));
        }
        if self.depth >= self.max_depth {
            return Err(RuntimeError::stack_overflow(self.max_depth));
        }

        debug!(
            function = func.name.as_deref().unwrap_or("<anonymous>"),
            args = args.len(),
            depth = self.depth,
            "call"
        );

        // Outer link is the closure's environment, not the caller's
        let call_env = child_env(&func.env);
        for (param, arg) in func.params.iter().zip(args) {
            call_env.borrow_mut().define(param.as_str(), arg.clone());
        }

        self.depth += 1;
        let result = self.eval_block(&func.body, &call_env);
        self.depth -= 1;

        match result {
            Err(RuntimeError {
                kind: ErrorKind::Return(value),
                ..
            }) => Ok(*value),
            other => other,
        }
    }

    fn intern_string(&mut self, s: &str) -> Rc<str> {
        if let Some(rc) = self.string_intern.get(s) {
            Rc::clone(rc)
        } else {
            let rc: Rc<str> = Rc::from(s);
            self.string_intern.insert(s.to_string(), Rc::clone(&rc));
            rc
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn eval_prefix(op: PrefixOp, operand: &Value) -> Value {
    match op {
        PrefixOp::Not => Value::Bool(match operand {
            Value::Int(n) => *n == 0,
            Value::Bool(b) => !b,
            Value::Null => true,
            _ => false,
        }),
        PrefixOp::Neg => match operand {
            Value::Int(n) => Value::Int(n.wrapping_neg()),
            _ => Value::Null,
        },
    }
}

fn eval_infix(op: InfixOp, left: Value, right: Value) -> InterpResult<Value> {
    // Only `-` rejects a non-numeric left operand paired with an integer
    if op == InfixOp::Sub
        && !matches!(left, Value::Int(_) | Value::Bool(_))
        && matches!(right, Value::Int(_))
    {
        return Err(RuntimeError::type_mismatch("-", &left, &right));
    }

    let (l, r) = (left.as_integer(), right.as_integer());
    let value = match op {
        InfixOp::Add => eval_plus(left, right),
        InfixOp::Sub => eval_minus(left, right),
        InfixOp::Mul => Value::Int(l.wrapping_mul(r)),
        InfixOp::Div if r == 0 => Value::Null,
        InfixOp::Div => Value::Int(l.wrapping_div(r)),
        InfixOp::Lt => Value::Bool(l < r),
        InfixOp::Gt => Value::Bool(l > r),
        InfixOp::Le => Value::Bool(l <= r),
        InfixOp::Ge => Value::Bool(l >= r),
        // Compared by display form, so 1 == "1"
        InfixOp::Eq => Value::Bool(left.to_string() == right.to_string()),
        InfixOp::Ne => Value::Bool(left.to_string() != right.to_string()),
    };
    Ok(value)
}

fn eval_plus(left: Value, right: Value) -> Value {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
        (Value::Array(a), Value::Array(b)) => {
            Value::array(a.iter().chain(b.iter()).cloned().collect())
        }
        (Value::Str(_), _) | (_, Value::Str(_)) => Value::Str(Rc::from(format!("{left}{right}"))),
        _ => Value::Int(left.as_integer().wrapping_add(right.as_integer())),
    }
}

fn eval_minus(left: Value, right: Value) -> Value {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
        (Value::Str(a), Value::Str(b)) => Value::str(&a.replacen(&**b, "", 1)),
        _ => Value::Int(left.as_integer().wrapping_sub(right.as_integer())),
    }
}

/// `Write` sink that can be read back after the interpreter has consumed it
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
