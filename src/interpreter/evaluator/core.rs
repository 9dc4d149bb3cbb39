use std::{collections::HashMap, io::Write, path::PathBuf, rc::Rc};

use crate::{
    ast::{Expr, Stmt, TupleElem},
    error::RuntimeError,
    interpreter::{
        builtins,
        env::{Env, EnvRef},
        value::core::{TypeValue, Value},
    },
};

/// Result type used by the evaluator.
///
/// Runtime errors travel in the `Err` channel and propagate with `?`; the
/// non-error control-flow signals travel in [`Flow`].
pub type EvalResult<T> = Result<T, RuntimeError>;

/// The control-flow signal channel of the evaluator.
///
/// Every evaluation produces either a plain value or one of the unwinding
/// signals. Each evaluator branch handles the signal uniformly: consume it
/// where the construct gives it meaning (calls for `Return`, loops and
/// switches for `Break`/`Yield`), propagate it everywhere else.
#[derive(Debug)]
pub enum Flow {
    /// A plain value; evaluation continues.
    Normal(Value),
    /// `return` unwinding to the nearest call. The payload is `None` for a
    /// bare `return`, which collects named return slots, while
    /// `return expr` — even `return null` — carries its value through
    /// unchanged.
    Return(Option<Value>),
    /// `break` unwinding to the nearest loop or switch case.
    Break,
    /// `yield` handing a value to the nearest loop or switch.
    Yield(Value),
}

/// Unwraps a `Flow` into its value, propagating any non-`Normal` signal to
/// the caller. Used wherever a subexpression's value is needed.
macro_rules! flow_value {
    ($flow:expr) => {
        match $flow {
            $crate::interpreter::evaluator::core::Flow::Normal(value) => value,
            other => return Ok(other),
        }
    };
}
pub(crate) use flow_value;

/// The tree-walking interpreter.
///
/// Holds the global environment (pre-populated with the built-in registry),
/// the module cache, the directory module paths resolve against, and the
/// writer that `print`-family built-ins use — tests capture output by
/// passing a `Vec<u8>`.
#[derive(Debug)]
pub struct Interp<'o, W: Write> {
    /// The global environment.
    pub globals:            EnvRef,
    pub(crate) modules:     HashMap<String, Value>,
    pub(crate) module_root: PathBuf,
    pub(crate) output:      &'o mut W,
}

impl<'o, W: Write> Interp<'o, W> {
    /// Creates an interpreter writing program output to `output`, with the
    /// built-ins registered in a fresh global environment.
    pub fn new(output: &'o mut W) -> Self {
        let globals = Env::root();
        builtins::register(&globals);
        Self { globals,
               modules: HashMap::new(),
               module_root: PathBuf::from("."),
               output }
    }

    /// Sets the directory module imports resolve against. Defaults to the
    /// working directory.
    pub fn set_module_root(&mut self, root: impl Into<PathBuf>) {
        self.module_root = root.into();
    }

    /// Runs a program in the global environment and returns its result
    /// value.
    ///
    /// # Errors
    /// Returns the first `RuntimeError` raised by the program.
    pub fn run(&mut self, program: &[Stmt]) -> EvalResult<Value> {
        let globals = Rc::clone(&self.globals);
        self.run_in(program, &globals)
    }

    /// Runs statements with top-level semantics in `env`: a `return` yields
    /// its value and execution continues with the next statement; `break`
    /// and `yield` stop the program with their value. Used for whole
    /// programs and module bodies.
    pub(crate) fn run_in(&mut self, program: &[Stmt], env: &EnvRef) -> EvalResult<Value> {
        let mut result = Value::Null;
        for stmt in program {
            match self.eval_stmt(stmt, env)? {
                Flow::Normal(value) => result = value,
                Flow::Return(value) => result = value.unwrap_or(Value::Null),
                Flow::Break => return Ok(Value::Null),
                Flow::Yield(value) => return Ok(value),
            }
        }
        Ok(result)
    }

    /// Evaluates a statement list, producing the last statement's value.
    /// Stops at the first non-`Normal` signal and hands it upward.
    pub(crate) fn eval_block(&mut self, stmts: &[Stmt], env: &EnvRef) -> EvalResult<Flow> {
        let mut result = Value::Null;
        for stmt in stmts {
            match self.eval_stmt(stmt, env)? {
                Flow::Normal(value) => result = value,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(result))
    }

    /// Evaluates a single statement.
    pub(crate) fn eval_stmt(&mut self, stmt: &Stmt, env: &EnvRef) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr, env),
            Stmt::Fn(decl) => self.eval_fn_decl(decl, env),
            Stmt::Var(decl) => self.eval_var_decl(decl, env),
            Stmt::Pat(decl) => self.eval_pat_decl(decl, env),
            Stmt::Import(decl) => self.resolve_import(decl, env),
            Stmt::Break { .. } => Ok(Flow::Break),
            Stmt::Yield { value, .. } => {
                let value = match value {
                    Some(expr) => flow_value!(self.eval_expr(expr, env)?),
                    None => Value::Null,
                };
                Ok(Flow::Yield(value))
            },
            Stmt::Return { value, .. } => {
                // A bare `return` stays `None` so the call can tell it apart
                // from an explicit `return null`.
                let value = match value {
                    Some(expr) => Some(flow_value!(self.eval_expr(expr, env)?)),
                    None => None,
                };
                Ok(Flow::Return(value))
            },
        }
    }

    /// Evaluates an expression. This is the central dispatcher; the heavier
    /// cases live in the sibling modules.
    pub(crate) fn eval_expr(&mut self, expr: &Expr, env: &EnvRef) -> EvalResult<Flow> {
        match expr {
            Expr::Null { .. } => Ok(Flow::Normal(Value::Null)),
            Expr::Int { value, .. } => Ok(Flow::Normal(Value::Int(*value))),
            Expr::Float { value, .. } => Ok(Flow::Normal(Value::Float(*value))),
            Expr::Str { value, .. } => Ok(Flow::Normal(Value::from(value.as_str()))),
            Expr::Ident { name, pos } => match env.get(name) {
                Some(value) => Ok(Flow::Normal(value)),
                None => Err(RuntimeError::UndefinedVariable { name: name.clone(), pos: *pos }),
            },
            Expr::Unary { op, expr, pos } => self.eval_unary(*op, expr, *pos, env),
            Expr::Binary { op, left, right, pos } => {
                self.eval_binary_expr(*op, left, right, *pos, env)
            },
            Expr::Optional { cond, then_branch, else_branch, .. } => {
                let cond = flow_value!(self.eval_expr(cond, env)?);
                if cond.is_truthy() {
                    self.eval_expr(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.eval_expr(else_branch, env)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            },
            Expr::Assign { target, value, pos } => self.eval_assign(target, value, *pos, env),
            Expr::Member { object, field, pos } => self.eval_member(object, field, *pos, env),
            Expr::Index { object, index, pos } => self.eval_index(object, index, *pos, env),
            Expr::Call { callee, arguments, pos } => self.eval_call(callee, arguments, *pos, env),
            Expr::Tuple { elements, .. } => self.eval_tuple(elements, env),
            Expr::Scope { body, .. } => {
                let child = Env::with_parent(env);
                self.eval_block(body, &child)
            },
            Expr::TemplateInst { args, .. } => {
                // Templates are not monomorphized: the instantiation
                // evaluates to the type named by its first argument, which a
                // following call applies as a conversion.
                let value = match args.first() {
                    Some(arg) => Value::Type(Rc::new(TypeValue { name:   arg.name.clone(),
                                                                 patdef: None, })),
                    None => Value::Null,
                };
                Ok(Flow::Normal(value))
            },
            Expr::Copy { expr, .. } => {
                // The evaluated value is already a fresh handle: primitives
                // copy inline, composites bump their reference count.
                let value = flow_value!(self.eval_expr(expr, env)?);
                Ok(Flow::Normal(value))
            },
            Expr::Move { expr, .. } => self.eval_move(expr, env),
            Expr::For { var, range, body, .. } => self.eval_for(var, range, body, env),
            Expr::While { cond, body, trailing, .. } => {
                self.eval_while(cond.as_deref(), body, trailing.as_deref(), env)
            },
            Expr::Switch { tag, cases, .. } => self.eval_switch(tag, cases, env),
        }
    }

    /// `move ident` takes the binding's value and leaves a null hole; on any
    /// other operand `move` evaluates the operand unchanged.
    fn eval_move(&mut self, expr: &Expr, env: &EnvRef) -> EvalResult<Flow> {
        if let Expr::Ident { name, pos } = expr {
            return match env.take(name) {
                Some(value) => Ok(Flow::Normal(value)),
                None => Err(RuntimeError::UndefinedVariable { name: name.clone(), pos: *pos }),
            };
        }
        self.eval_expr(expr, env)
    }

    /// Evaluates a tuple literal. An element is named when written
    /// `name: expr`, or when it is an assignment to a plain identifier
    /// (`(a = 1, b = 2)`) — the assignment shape only names the element, the
    /// environment is untouched.
    fn eval_tuple(&mut self, elements: &[TupleElem], env: &EnvRef) -> EvalResult<Flow> {
        let mut elems = Vec::with_capacity(elements.len());
        let mut names: Option<Vec<String>> = None;

        for (i, elem) in elements.iter().enumerate() {
            let (name, value) = match (&elem.name, &elem.value) {
                (Some(name), expr) => {
                    (Some(name.clone()), flow_value!(self.eval_expr(expr, env)?))
                },
                (None, Expr::Assign { target, value, .. })
                    if matches!(target.as_ref(), Expr::Ident { .. }) =>
                {
                    let Expr::Ident { name, .. } = target.as_ref() else { unreachable!() };
                    (Some(name.clone()), flow_value!(self.eval_expr(value, env)?))
                },
                (None, expr) => (None, flow_value!(self.eval_expr(expr, env)?)),
            };

            if let Some(name) = name {
                names.get_or_insert_with(|| vec![String::new(); i]).push(name);
            } else if let Some(names) = &mut names {
                names.push(String::new());
            }
            elems.push(value);
        }

        let tuple = match names {
            Some(names) => Value::named_tuple(elems, names),
            None => Value::tuple(elems),
        };
        Ok(Flow::Normal(tuple))
    }
}
