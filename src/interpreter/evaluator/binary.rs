use std::io::Write;

use crate::{
    ast::{BinaryOp, Expr, UnaryOp},
    error::RuntimeError,
    interpreter::{
        env::EnvRef,
        evaluator::core::{EvalResult, Flow, Interp, flow_value},
        lexer::Pos,
        value::core::Value,
    },
};

impl<W: Write> Interp<'_, W> {
    /// Evaluates a unary operation.
    ///
    /// `-` negates integers and floats, `!` inverts the operand's
    /// truthiness, `~` is bitwise not on integers. Anything else is an
    /// unsupported-unary error.
    pub(crate) fn eval_unary(&mut self,
                             op: UnaryOp,
                             expr: &Expr,
                             pos: Pos,
                             env: &EnvRef)
                             -> EvalResult<Flow> {
        let value = flow_value!(self.eval_expr(expr, env)?);
        let result = match (op, &value) {
            (UnaryOp::Neg, Value::Int(n)) => Value::Int(n.wrapping_neg()),
            (UnaryOp::Neg, Value::Float(x)) => Value::Float(-x),
            (UnaryOp::Not, _) => Value::Bool(!value.is_truthy()),
            (UnaryOp::BitNot, Value::Int(n)) => Value::Int(!n),
            _ => return Err(RuntimeError::UnsupportedUnary { op: op.text(), pos }),
        };
        Ok(Flow::Normal(result))
    }

    /// Evaluates both operands left-to-right, then applies the operator.
    pub(crate) fn eval_binary_expr(&mut self,
                                   op: BinaryOp,
                                   left: &Expr,
                                   right: &Expr,
                                   pos: Pos,
                                   env: &EnvRef)
                                   -> EvalResult<Flow> {
        let left = flow_value!(self.eval_expr(left, env)?);
        let right = flow_value!(self.eval_expr(right, env)?);
        Ok(Flow::Normal(eval_binary(op, &left, &right, pos)?))
    }
}

/// Applies a binary operator to two evaluated operands.
///
/// This is the one place that knows the type-dispatch rules:
///
/// - Arithmetic stays in integers when both operands are integers (wrapping
///   on overflow, truncating division, errors on division/modulo by zero)
///   and promotes to float when either side is a float.
/// - `+` concatenates two strings.
/// - Comparisons follow the same numeric promotion and produce booleans.
/// - `==`/`!=` use language equality (`Value::equals`).
/// - `&&`/`||` combine the operands' truthiness (both sides are already
///   evaluated at this point).
/// - The bitwise family requires two integers; shift counts must lie in
///   `0..64`.
///
/// Every combination not listed is an "unsupported binary operation" error.
///
/// # Errors
/// `DivisionByZero`, `ModuloByZero`, `ShiftOutOfRange` or
/// `UnsupportedBinary`.
pub(crate) fn eval_binary(op: BinaryOp, l: &Value, r: &Value, pos: Pos) -> EvalResult<Value> {
    match op {
        BinaryOp::Add => {
            if let (Value::Str(a), Value::Str(b)) = (l, r) {
                return Ok(Value::from(format!("{a}{b}")));
            }
            arithmetic(op, l, r, pos, i64::wrapping_add, |a, b| a + b)
        },
        BinaryOp::Sub => arithmetic(op, l, r, pos, i64::wrapping_sub, |a, b| a - b),
        BinaryOp::Mul => arithmetic(op, l, r, pos, i64::wrapping_mul, |a, b| a * b),
        BinaryOp::Div => {
            if let (Value::Int(a), Value::Int(b)) = (l, r) {
                if *b == 0 {
                    return Err(RuntimeError::DivisionByZero { pos });
                }
                return Ok(Value::Int(a.wrapping_div(*b)));
            }
            // With a float operand the division follows IEEE, so a zero
            // divisor produces an infinity or NaN rather than an error.
            numeric_operands(op, l, r, pos).map(|(a, b)| Value::Float(a / b))
        },
        BinaryOp::Mod => {
            if let (Value::Int(a), Value::Int(b)) = (l, r) {
                if *b == 0 {
                    return Err(RuntimeError::ModuloByZero { pos });
                }
                return Ok(Value::Int(a.wrapping_rem(*b)));
            }
            Err(RuntimeError::UnsupportedBinary { op: op.text(), pos })
        },
        BinaryOp::Less
        | BinaryOp::Greater
        | BinaryOp::LessEqual
        | BinaryOp::GreaterEqual => compare(op, l, r, pos),
        BinaryOp::Equal => Ok(Value::Bool(l.equals(r))),
        BinaryOp::NotEqual => Ok(Value::Bool(!l.equals(r))),
        BinaryOp::And => Ok(Value::Bool(l.is_truthy() && r.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(l.is_truthy() || r.is_truthy())),
        BinaryOp::BitAnd => bitwise(op, l, r, pos, |a, b| a & b),
        BinaryOp::BitOr => bitwise(op, l, r, pos, |a, b| a | b),
        BinaryOp::BitXor => bitwise(op, l, r, pos, |a, b| a ^ b),
        BinaryOp::Shl => shift(op, l, r, pos, |a, b| a << b),
        BinaryOp::Shr => shift(op, l, r, pos, |a, b| a >> b),
    }
}

/// Integer arithmetic when both sides are integers, float arithmetic with
/// promotion otherwise.
fn arithmetic(op: BinaryOp,
              l: &Value,
              r: &Value,
              pos: Pos,
              int_op: fn(i64, i64) -> i64,
              float_op: fn(f64, f64) -> f64)
              -> EvalResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        return Ok(Value::Int(int_op(*a, *b)));
    }
    numeric_operands(op, l, r, pos).map(|(a, b)| Value::Float(float_op(a, b)))
}

/// Ordering comparison under the arithmetic promotion rule.
fn compare(op: BinaryOp, l: &Value, r: &Value, pos: Pos) -> EvalResult<Value> {
    let result = if let (Value::Int(a), Value::Int(b)) = (l, r) {
        match op {
            BinaryOp::Less => a < b,
            BinaryOp::Greater => a > b,
            BinaryOp::LessEqual => a <= b,
            BinaryOp::GreaterEqual => a >= b,
            _ => unreachable!("compare is only called for ordering operators"),
        }
    } else {
        let (a, b) = numeric_operands(op, l, r, pos)?;
        match op {
            BinaryOp::Less => a < b,
            BinaryOp::Greater => a > b,
            BinaryOp::LessEqual => a <= b,
            BinaryOp::GreaterEqual => a >= b,
            _ => unreachable!("compare is only called for ordering operators"),
        }
    };
    Ok(Value::Bool(result))
}

/// Both operands as floats, or the unsupported-operation error.
fn numeric_operands(op: BinaryOp, l: &Value, r: &Value, pos: Pos) -> EvalResult<(f64, f64)> {
    match (l.as_number(), r.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::UnsupportedBinary { op: op.text(), pos }),
    }
}

/// Bitwise operation on two integers.
fn bitwise(op: BinaryOp,
           l: &Value,
           r: &Value,
           pos: Pos,
           int_op: fn(i64, i64) -> i64)
           -> EvalResult<Value> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => Err(RuntimeError::UnsupportedBinary { op: op.text(), pos }),
    }
}

/// Shift on two integers with a range-checked count.
fn shift(op: BinaryOp,
         l: &Value,
         r: &Value,
         pos: Pos,
         int_op: fn(i64, i64) -> i64)
         -> EvalResult<Value> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => {
            if !(0..64).contains(b) {
                return Err(RuntimeError::ShiftOutOfRange { pos });
            }
            Ok(Value::Int(int_op(*a, *b)))
        },
        _ => Err(RuntimeError::UnsupportedBinary { op: op.text(), pos }),
    }
}
