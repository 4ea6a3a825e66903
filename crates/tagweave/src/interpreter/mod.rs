/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Executes a compiled [`Program`] against a [`RenderContext`].
//!
//! Every top-level binding of the context is a variable of the program, and
//! assignments made by fragments write back into it, so later statements and
//! nested includes observe them. Output is collected in an
//! [`OutputCapture`] and only handed back when the whole program succeeds.

mod builtins;
pub(crate) mod ops;

use std::fmt;

use tracing::trace;

use crate::fragment::ast::{Expr, ExprKind, Stmt, StmtKind, Target};
use crate::program::{Instruction, Program};
use crate::value::{RenderContext, Value};

/// A failure raised while evaluating fragment code.
///
/// `message` reads like an interpreter error (`NameError: name 'x' is not
/// defined`). `line` is relative to the fragment that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub message: String,
    pub line: Option<usize>,
}

impl EvalError {
    pub fn new(kind: &str, detail: impl fmt::Display) -> Self {
        EvalError {
            message: format!("{}: {}", kind, detail),
            line: None,
        }
    }

    pub fn type_error(detail: impl fmt::Display) -> Self {
        Self::new("TypeError", detail)
    }

    pub fn value_error(detail: impl fmt::Display) -> Self {
        Self::new("ValueError", detail)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new("NameError", format!("name '{}' is not defined", name))
    }

    pub fn zero_division(detail: &str) -> Self {
        Self::new("ZeroDivisionError", detail)
    }

    /// Attach a line unless a more specific one is already known.
    pub fn at(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

/// A failed run: the error and the generated line it was raised on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    pub error: EvalError,
    pub line: usize,
}

/// Output buffer of a run.
#[derive(Debug, Default)]
pub struct OutputCapture {
    buffer: String,
}

impl OutputCapture {
    pub fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

/// Tree-walking interpreter over one program run.
pub struct Interpreter<'c> {
    context: &'c mut RenderContext,
    output: OutputCapture,
}

fn fail(error: EvalError, base: usize) -> RunError {
    let line = base + error.line.unwrap_or(0);
    RunError { error, line }
}

impl<'c> Interpreter<'c> {
    /// Run `program` and return everything it printed.
    pub fn run(program: &Program, context: &'c mut RenderContext) -> Result<String, RunError> {
        let mut interpreter = Interpreter {
            context,
            output: OutputCapture::default(),
        };
        interpreter.exec_block(&program.instructions)?;
        trace!(bytes = interpreter.output.as_str().len(), "program finished");
        Ok(interpreter.output.into_string())
    }

    fn exec_block(&mut self, body: &[Instruction]) -> Result<Flow, RunError> {
        for instruction in body {
            let flow = self.exec_instruction(instruction)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_instruction(&mut self, instruction: &Instruction) -> Result<Flow, RunError> {
        match instruction {
            Instruction::Text { text, .. } => {
                self.output.write(text);
                Ok(Flow::Normal)
            }
            Instruction::Echo { expr, line } => {
                let value = self.eval(expr).map_err(|e| fail(e, *line))?;
                self.output.write(&value.to_str());
                Ok(Flow::Normal)
            }
            Instruction::Exec { body, line } => {
                for stmt in body {
                    let flow = self
                        .exec_stmt(stmt)
                        .map_err(|e| fail(e.at(stmt.line), *line))?;
                    if flow != Flow::Normal {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            Instruction::For {
                targets,
                iter,
                body,
                line,
            } => {
                let iterable = self.eval(iter).map_err(|e| fail(e, *line))?;
                let items = ops::iterate(&iterable).map_err(|e| fail(e.at(iter.line), *line))?;
                for item in items {
                    self.bind_loop_targets(targets, item)
                        .map_err(|e| fail(e.at(iter.line), *line))?;
                    if self.exec_block(body)? == Flow::Break {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Instruction::While { cond, body, line } => {
                loop {
                    let test = self.eval(cond).map_err(|e| fail(e, *line))?;
                    if !test.is_truthy() || self.exec_block(body)? == Flow::Break {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Instruction::If {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    let test = self.eval(&branch.cond).map_err(|e| fail(e, branch.line))?;
                    if test.is_truthy() {
                        return self.exec_block(&branch.body);
                    }
                }
                match otherwise {
                    Some(body) => self.exec_block(body),
                    None => Ok(Flow::Normal),
                }
            }
        }
    }

    fn bind_loop_targets(&mut self, targets: &[String], item: Value) -> Result<(), EvalError> {
        if let [name] = targets {
            self.context.insert(name.clone(), item);
            return Ok(());
        }
        let values = unpack(&item, targets.len())?;
        for (name, value) in targets.iter().zip(values) {
            self.context.insert(name.clone(), value);
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }
            StmtKind::AugAssign { target, op, value } => match target {
                Target::Name(name) => {
                    let current = self
                        .context
                        .get(name)
                        .cloned()
                        .ok_or_else(|| EvalError::name_error(name))?;
                    let rhs = self.eval(value)?;
                    let updated = ops::binary(*op, current, rhs).map_err(|e| e.at(value.line))?;
                    self.context.insert(name.clone(), updated);
                }
                Target::Subscript { name, indices } => {
                    let keys = self.eval_all(indices)?;
                    let current = self.place(name, &keys)?.clone();
                    let rhs = self.eval(value)?;
                    let updated = ops::binary(*op, current, rhs).map_err(|e| e.at(value.line))?;
                    self.store(name, &keys, updated)?;
                }
                Target::Unpack(_) => {
                    return Err(EvalError::new(
                        "SyntaxError",
                        "illegal expression for augmented assignment",
                    ));
                }
            },
            StmtKind::Pass => {}
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &Target, value: Value) -> Result<(), EvalError> {
        match target {
            Target::Name(name) => {
                self.context.insert(name.clone(), value);
                Ok(())
            }
            Target::Subscript { name, indices } => {
                let keys = self.eval_all(indices)?;
                self.store(name, &keys, value)
            }
            Target::Unpack(targets) => {
                let values = unpack(&value, targets.len())?;
                for (target, value) in targets.iter().zip(values) {
                    self.assign(target, value)?;
                }
                Ok(())
            }
        }
    }

    /// The value reached from variable `name` through `keys`.
    fn place(&mut self, name: &str, keys: &[Value]) -> Result<&mut Value, EvalError> {
        let mut current = self
            .context
            .get_mut(name)
            .ok_or_else(|| EvalError::name_error(name))?;
        for key in keys {
            current = ops::item_mut(current, key)?;
        }
        Ok(current)
    }

    fn store(&mut self, name: &str, keys: &[Value], value: Value) -> Result<(), EvalError> {
        let Some((last, path)) = keys.split_last() else {
            self.context.insert(name.to_string(), value);
            return Ok(());
        };
        let container = self.place(name, path)?;
        ops::set_item(container, last, value)
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval_kwargs(&mut self, kwargs: &[(String, Expr)]) -> Result<Vec<(String, Value)>, EvalError> {
        kwargs
            .iter()
            .map(|(name, e)| self.eval(e).map(|value| (name.clone(), value)))
            .collect()
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.eval_kind(&expr.kind).map_err(|e| e.at(expr.line))
    }

    fn eval_kind(&mut self, kind: &ExprKind) -> Result<Value, EvalError> {
        match kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Name(name) => self
                .context
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::name_error(name)),
            ExprKind::List(items) => Ok(Value::List(self.eval_all(items)?)),
            ExprKind::Dict(entries) => {
                let mut map = indexmap::IndexMap::new();
                for (key, value) in entries {
                    let key = match self.eval(key)? {
                        Value::Str(s) => s,
                        other => {
                            return Err(EvalError::type_error(format!(
                                "dict keys must be strings, not '{}'",
                                other.type_name()
                            )));
                        }
                    };
                    map.insert(key, self.eval(value)?);
                }
                Ok(Value::Dict(map))
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                ops::unary(*op, value)
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                ops::binary(*op, l, r)
            }
            ExprKind::Compare { left, rest } => {
                let mut current = self.eval(left)?;
                for (op, right) in rest {
                    let next = self.eval(right)?;
                    if !ops::compare_op(*op, &current, &next).map_err(|e| e.at(right.line))? {
                        return Ok(Value::Bool(false));
                    }
                    current = next;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::And(left, right) => {
                let l = self.eval(left)?;
                if !l.is_truthy() {
                    return Ok(l);
                }
                self.eval(right)
            }
            ExprKind::Or(left, right) => {
                let l = self.eval(left)?;
                if l.is_truthy() {
                    return Ok(l);
                }
                self.eval(right)
            }
            ExprKind::Not(operand) => Ok(Value::Bool(!self.eval(operand)?.is_truthy())),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            ExprKind::Call { func, args, kwargs } => {
                if let ExprKind::Name(name) = &func.kind
                    && !self.context.contains(name)
                {
                    if !builtins::is_builtin(name) {
                        return Err(EvalError::name_error(name));
                    }
                    let args = self.eval_all(args)?;
                    let kwargs = self.eval_kwargs(kwargs)?;
                    return builtins::call(name, args, kwargs, &mut self.output);
                }
                let callee = self.eval(func)?;
                Err(EvalError::type_error(format!(
                    "'{}' object is not callable",
                    callee.type_name()
                )))
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                kwargs,
            } => {
                if let Some((name, index_exprs)) = place_of(receiver) {
                    let keys = self.eval_all(&index_exprs)?;
                    let args = self.eval_all(args)?;
                    let kwargs = self.eval_kwargs(kwargs)?;
                    let target = self.place(name, &keys).map_err(|e| e.at(receiver.line))?;
                    return builtins::call_method(target, method, args, kwargs);
                }
                let mut target = self.eval(receiver)?;
                let args = self.eval_all(args)?;
                let kwargs = self.eval_kwargs(kwargs)?;
                builtins::call_method(&mut target, method, args, kwargs)
            }
            ExprKind::Index { value, index } => {
                let container = self.eval(value)?;
                let key = self.eval(index)?;
                ops::index(&container, &key)
            }
            ExprKind::Slice { value, start, stop } => {
                let container = self.eval(value)?;
                let start = start.as_deref().map(|e| self.eval(e)).transpose()?;
                let stop = stop.as_deref().map(|e| self.eval(e)).transpose()?;
                ops::slice(&container, start.as_ref(), stop.as_ref())
            }
        }
    }
}

/// A receiver that names a variable, possibly through subscripts:
/// `items`, `data["rows"][0]`. Methods called on it mutate it in place.
fn place_of(expr: &Expr) -> Option<(&str, Vec<Expr>)> {
    match &expr.kind {
        ExprKind::Name(name) => Some((name.as_str(), Vec::new())),
        ExprKind::Index { value, index } => {
            let (name, mut indices) = place_of(value)?;
            indices.push((**index).clone());
            Some((name, indices))
        }
        _ => None,
    }
}

fn unpack(value: &Value, expected: usize) -> Result<Vec<Value>, EvalError> {
    let values = ops::iterate(value).map_err(|_| {
        EvalError::type_error(format!(
            "cannot unpack non-iterable {} object",
            value.type_name()
        ))
    })?;
    match values.len() {
        n if n > expected => Err(EvalError::value_error(format!(
            "too many values to unpack (expected {})",
            expected
        ))),
        n if n < expected => Err(EvalError::value_error(format!(
            "not enough values to unpack (expected {}, got {})",
            expected, n
        ))),
        _ => Ok(values),
    }
}
