use std::{cell::RefCell, io::Write, rc::Rc};

use crate::{
    ast::{Expr, RetAnn},
    error::RuntimeError,
    interpreter::{
        env::{Env, EnvRef},
        evaluator::core::{EvalResult, Flow, Interp, flow_value},
        lexer::Pos,
        value::core::{FunctionValue, PatInstance, TypeValue, Value},
    },
    util::num::{parse_f64_prefix, parse_i64_prefix, truncate_to_i64},
};

impl<W: Write> Interp<'_, W> {
    /// Evaluates a call expression: the callee first, then the arguments in
    /// declaration order, then the dispatch on the callee's kind.
    pub(crate) fn eval_call(&mut self,
                            callee: &Expr,
                            arguments: &[Expr],
                            pos: Pos,
                            env: &EnvRef)
                            -> EvalResult<Flow> {
        let callee = flow_value!(self.eval_expr(callee, env)?);
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(flow_value!(self.eval_expr(argument, env)?));
        }
        self.call_value(&callee, &args, pos)
    }

    /// Dispatches a call on an evaluated callee.
    ///
    /// - A built-in invokes its native function.
    /// - A function runs its body in a child of the closure environment.
    /// - A module carrying a `PatDef` instantiates the pattern.
    /// - A type value applies a conversion.
    ///
    /// Anything else is not callable.
    pub(crate) fn call_value(&mut self,
                             callee: &Value,
                             args: &[Value],
                             pos: Pos)
                             -> EvalResult<Flow> {
        match callee {
            Value::Builtin(builtin) => {
                let result = (builtin.func)(&mut *self.output, args, pos)?;
                Ok(Flow::Normal(result))
            },
            Value::Function(func) => self.call_function(func, args, pos),
            Value::Module(module) => match &module.patdef {
                Some(def) => {
                    let count = def.field_count();
                    let mut fields = vec![Value::Null; count];
                    for (slot, arg) in fields.iter_mut().zip(args.iter()) {
                        *slot = arg.clone();
                    }
                    let instance = PatInstance { def:    Rc::clone(def),
                                                 fields: RefCell::new(fields), };
                    Ok(Flow::Normal(Value::PatInstance(Rc::new(instance))))
                },
                None => Err(RuntimeError::NotCallable { pos }),
            },
            Value::Type(ty) => Ok(Flow::Normal(apply_type(ty, args))),
            _ => Err(RuntimeError::NotCallable { pos }),
        }
    }

    /// Calls a user function.
    ///
    /// A fresh child environment of the closure binds the parameters
    /// positionally (missing arguments become null). When the return
    /// annotation is a tuple of named slots, the slots are pre-bound to null
    /// and collected into a named tuple on fall-through or a bare `return`;
    /// an explicit `return expr` passes its value through unchanged.
    fn call_function(&mut self,
                     func: &FunctionValue,
                     args: &[Value],
                     pos: Pos)
                     -> EvalResult<Flow> {
        let closure =
            func.closure.upgrade().ok_or(RuntimeError::MethodScopeDropped { pos })?;
        let call_env = Env::with_parent(&closure);

        for (i, param) in func.decl.params.iter().enumerate() {
            call_env.define(&param.name, args.get(i).cloned().unwrap_or(Value::Null));
        }

        let named_slots = named_return_slots(&func.decl.ret);
        if let Some(names) = &named_slots {
            for name in names {
                call_env.define(name, Value::Null);
            }
        }

        let flow = match &func.decl.body {
            Some(body) => self.eval_block(body, &call_env)?,
            None => Flow::Normal(Value::Null),
        };

        match flow {
            // Fall-through: with named slots the body's last value is
            // irrelevant, the slots are the result.
            Flow::Normal(value) => Ok(Flow::Normal(match &named_slots {
                Some(names) => collect_returns(names, &call_env),
                None => value,
            })),
            // `return expr` passes its value through unchanged, even when it
            // is `return null`; only a bare `return` collects.
            Flow::Return(Some(value)) => Ok(Flow::Normal(value)),
            Flow::Return(None) => Ok(Flow::Normal(match &named_slots {
                Some(names) => collect_returns(names, &call_env),
                None => Value::Null,
            })),
            other => Ok(other),
        }
    }
}

/// The named return slots of a function, when its annotation is a tuple
/// whose slots are all named.
fn named_return_slots(ret: &Option<RetAnn>) -> Option<Vec<String>> {
    match ret {
        Some(RetAnn::Tuple(slots)) if !slots.is_empty() => {
            slots.iter().map(|slot| slot.slot.clone()).collect()
        },
        _ => None,
    }
}

/// Collects the current values of the named return slots into a named
/// tuple.
fn collect_returns(names: &[String], call_env: &EnvRef) -> Value {
    let elems = names.iter().map(|name| call_env.get(name).unwrap_or(Value::Null)).collect();
    Value::named_tuple(elems, names.to_vec())
}

/// Applies a type value as a conversion, C-style.
///
/// Integer type names (`i…`/`u…`) convert integers, floats (truncating) and
/// strings (longest prefix); float names (`f…`) likewise; `string` converts
/// through the value's display form. Everything else, and any call without
/// exactly one argument, produces null.
fn apply_type(ty: &TypeValue, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::Null;
    }
    let arg = &args[0];

    if ty.name.starts_with('i') || ty.name.starts_with('u') {
        return match arg {
            Value::Int(n) => Value::Int(*n),
            Value::Float(x) => Value::Int(truncate_to_i64(*x)),
            Value::Str(s) => Value::Int(parse_i64_prefix(s)),
            _ => Value::Null,
        };
    }
    if ty.name.starts_with('f') {
        return match arg {
            Value::Float(x) => Value::Float(*x),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(n) => Value::Float(*n as f64),
            Value::Str(s) => Value::Float(parse_f64_prefix(s)),
            _ => Value::Null,
        };
    }
    if ty.name == "string" {
        return Value::from(arg.to_string());
    }
    Value::Null
}
