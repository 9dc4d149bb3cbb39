use std::io::Write;

use crate::{
    ast::{Expr, Stmt, SwitchCase},
    interpreter::{
        env::{Env, EnvRef},
        evaluator::core::{EvalResult, Flow, Interp, flow_value},
        value::core::Value,
    },
};

impl<W: Write> Interp<'_, W> {
    /// Evaluates a `for` loop.
    ///
    /// The range evaluates once. A tuple iterates its elements, an integer
    /// `N` iterates `0..N`; any other range runs zero iterations. Each
    /// iteration binds the loop variable in a fresh child environment.
    /// `break` exits with the accumulated result, `yield` replaces the
    /// accumulated result and continues, `return` and errors propagate. A
    /// loop that never yields produces null.
    pub(crate) fn eval_for(&mut self,
                           var: &str,
                           range: &Expr,
                           body: &[Stmt],
                           env: &EnvRef)
                           -> EvalResult<Flow> {
        let range = flow_value!(self.eval_expr(range, env)?);

        let items: Box<dyn Iterator<Item = Value>> = match &range {
            Value::Tuple(tuple) => Box::new(tuple.elems.clone().into_iter()),
            Value::Int(n) => Box::new((0..*n).map(Value::Int)),
            _ => Box::new(std::iter::empty()),
        };

        let mut result = Value::Null;
        for item in items {
            let loop_env = Env::with_parent(env);
            loop_env.define(var, item);
            match self.eval_block(body, &loop_env)? {
                Flow::Normal(_) => {},
                Flow::Break => break,
                Flow::Yield(value) => result = value,
                Flow::Return(value) => return Ok(Flow::Return(value)),
            }
        }
        Ok(Flow::Normal(result))
    }

    /// Evaluates a `while` loop with optional leading and trailing
    /// conditions.
    ///
    /// The body runs while the leading condition (when present) is truthy;
    /// after a normally completed iteration the trailing condition (when
    /// present) must be truthy for the loop to continue. `yield` stores the
    /// loop's result and jumps straight back to the leading condition.
    pub(crate) fn eval_while(&mut self,
                             cond: Option<&Expr>,
                             body: &[Stmt],
                             trailing: Option<&Expr>,
                             env: &EnvRef)
                             -> EvalResult<Flow> {
        let mut result = Value::Null;
        loop {
            if let Some(cond) = cond {
                let cond = flow_value!(self.eval_expr(cond, env)?);
                if !cond.is_truthy() {
                    break;
                }
            }

            let loop_env = Env::with_parent(env);
            match self.eval_block(body, &loop_env)? {
                Flow::Normal(_) => {},
                Flow::Break => break,
                Flow::Yield(value) => {
                    result = value;
                    continue;
                },
                Flow::Return(value) => return Ok(Flow::Return(value)),
            }

            if let Some(trailing) = trailing {
                let trailing = flow_value!(self.eval_expr(trailing, env)?);
                if !trailing.is_truthy() {
                    break;
                }
            }
        }
        Ok(Flow::Normal(result))
    }

    /// Evaluates a `switch` expression.
    ///
    /// Cases are tried in order; a `default` case (no condition) always
    /// matches, and at most one case runs — there is no fall-through. Inside
    /// the matching case `break` ends the case normally and `yield` becomes
    /// the switch's value; `return` and errors propagate. Without a match
    /// the switch is null.
    pub(crate) fn eval_switch(&mut self,
                              tag: &Expr,
                              cases: &[SwitchCase],
                              env: &EnvRef)
                              -> EvalResult<Flow> {
        let tag = flow_value!(self.eval_expr(tag, env)?);

        for case in cases {
            let matched = match &case.cond {
                None => true,
                Some(cond) => {
                    let cond = flow_value!(self.eval_expr(cond, env)?);
                    tag.equals(&cond)
                },
            };
            if !matched {
                continue;
            }

            let case_env = Env::with_parent(env);
            return match self.eval_block(&case.body, &case_env)? {
                Flow::Normal(value) | Flow::Yield(value) => Ok(Flow::Normal(value)),
                Flow::Break => Ok(Flow::Normal(Value::Null)),
                Flow::Return(value) => Ok(Flow::Return(value)),
            };
        }
        Ok(Flow::Normal(Value::Null))
    }
}
