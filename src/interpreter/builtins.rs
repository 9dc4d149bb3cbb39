use std::io::{self, Write};

use crate::{
    error::RuntimeError,
    interpreter::{
        env::EnvRef,
        evaluator::core::EvalResult,
        lexer::Pos,
        value::core::{BuiltinFn, BuiltinValue, Value},
    },
    util::num::{parse_f64_prefix, parse_i64_prefix, truncate_to_i64},
};

/// The built-in registry: every entry is bound into the global environment
/// at interpreter startup.
const BUILTINS: &[(&str, BuiltinFn)] = &[("print", builtin_print),
                                         ("println", builtin_println),
                                         ("input", builtin_input),
                                         ("int", builtin_int),
                                         ("float", builtin_float),
                                         ("string", builtin_string),
                                         ("bool", builtin_bool),
                                         ("is_null", builtin_is_null),
                                         ("is_int", builtin_is_int),
                                         ("is_float", builtin_is_float),
                                         ("is_string", builtin_is_string),
                                         ("type_of", builtin_type_of),
                                         ("type", builtin_type),
                                         ("abs", builtin_abs),
                                         ("sqrt", builtin_sqrt),
                                         ("pow", builtin_pow),
                                         ("floor", builtin_floor),
                                         ("ceil", builtin_ceil),
                                         ("min", builtin_min),
                                         ("max", builtin_max),
                                         ("len", builtin_len),
                                         ("substr", builtin_substr),
                                         ("concat", builtin_concat),
                                         ("assert", builtin_assert)];

/// Registers every built-in function in `env`.
pub fn register(env: &EnvRef) {
    for &(name, func) in BUILTINS {
        env.define(name, Value::Builtin(BuiltinValue { name, func }));
    }
}

/// Requires at least `expected` arguments; extra arguments are tolerated.
fn require(name: &'static str, args: &[Value], expected: usize, pos: Pos) -> EvalResult<()> {
    if args.len() < expected {
        return Err(RuntimeError::ArgumentCount { name, expected, got: args.len(), pos });
    }
    Ok(())
}

/// `print(…)`: arguments separated by spaces, followed by a newline.
fn builtin_print(out: &mut dyn Write, args: &[Value], _pos: Pos) -> EvalResult<Value> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(out, " ")?;
        }
        write!(out, "{arg}")?;
    }
    writeln!(out)?;
    Ok(Value::Null)
}

/// `println(…)`: same as `print`.
fn builtin_println(out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    builtin_print(out, args, pos)
}

/// `input([prompt])`: prints the prompt and reads one line from stdin,
/// without its trailing newline.
fn builtin_input(out: &mut dyn Write, args: &[Value], _pos: Pos) -> EvalResult<Value> {
    if let Some(prompt) = args.first() {
        write!(out, "{prompt}")?;
        out.flush()?;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(Value::from(""));
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Value::from(line))
}

/// `int(v)`: integer conversion — truncating for floats, longest-prefix for
/// strings, 0/1 for booleans; null for anything else.
fn builtin_int(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("int", args, 1, pos)?;
    Ok(match &args[0] {
        Value::Int(n) => Value::Int(*n),
        Value::Float(x) => Value::Int(truncate_to_i64(*x)),
        Value::Bool(b) => Value::Int(i64::from(*b)),
        Value::Str(s) => Value::Int(parse_i64_prefix(s)),
        _ => Value::Null,
    })
}

/// `float(v)`: float conversion; null for non-convertible values.
#[allow(clippy::cast_precision_loss)]
fn builtin_float(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("float", args, 1, pos)?;
    Ok(match &args[0] {
        Value::Float(x) => Value::Float(*x),
        Value::Int(n) => Value::Float(*n as f64),
        Value::Bool(b) => Value::Float(if *b { 1.0 } else { 0.0 }),
        Value::Str(s) => Value::Float(parse_f64_prefix(s)),
        _ => Value::Null,
    })
}

/// `string(v)`: the value's display form.
fn builtin_string(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("string", args, 1, pos)?;
    Ok(Value::from(args[0].to_string()))
}

/// `bool(v)`: the value's truthiness.
fn builtin_bool(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("bool", args, 1, pos)?;
    Ok(Value::Bool(args[0].is_truthy()))
}

fn builtin_is_null(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("is_null", args, 1, pos)?;
    Ok(Value::Bool(matches!(args[0], Value::Null)))
}

fn builtin_is_int(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("is_int", args, 1, pos)?;
    Ok(Value::Bool(matches!(args[0], Value::Int(_))))
}

fn builtin_is_float(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("is_float", args, 1, pos)?;
    Ok(Value::Bool(matches!(args[0], Value::Float(_))))
}

fn builtin_is_string(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("is_string", args, 1, pos)?;
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

/// `type_of(v)`: the value-kind name as a string.
fn builtin_type_of(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("type_of", args, 1, pos)?;
    Ok(Value::from(args[0].type_name()))
}

/// `type(v)`: a type value describing `v`'s runtime type, answering `name`,
/// `is_pat` and `fields` member access.
fn builtin_type(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("type", args, 1, pos)?;
    Ok(args[0].type_value())
}

fn builtin_abs(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("abs", args, 1, pos)?;
    Ok(match &args[0] {
        Value::Int(n) => Value::Int(n.wrapping_abs()),
        Value::Float(x) => Value::Float(x.abs()),
        _ => Value::Null,
    })
}

fn builtin_sqrt(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("sqrt", args, 1, pos)?;
    Ok(args[0].as_number().map_or(Value::Null, |x| Value::Float(x.sqrt())))
}

fn builtin_pow(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("pow", args, 2, pos)?;
    match (args[0].as_number(), args[1].as_number()) {
        (Some(base), Some(exp)) => Ok(Value::Float(base.powf(exp))),
        _ => Ok(Value::Null),
    }
}

fn builtin_floor(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("floor", args, 1, pos)?;
    Ok(args[0].as_number().map_or(Value::Null, |x| Value::Int(truncate_to_i64(x.floor()))))
}

fn builtin_ceil(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("ceil", args, 1, pos)?;
    Ok(args[0].as_number().map_or(Value::Null, |x| Value::Int(truncate_to_i64(x.ceil()))))
}

fn builtin_min(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("min", args, 2, pos)?;
    if let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) {
        return Ok(Value::Int(*a.min(b)));
    }
    match (args[0].as_number(), args[1].as_number()) {
        (Some(a), Some(b)) => Ok(Value::Float(a.min(b))),
        _ => Ok(Value::Null),
    }
}

fn builtin_max(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("max", args, 2, pos)?;
    if let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) {
        return Ok(Value::Int(*a.max(b)));
    }
    match (args[0].as_number(), args[1].as_number()) {
        (Some(a), Some(b)) => Ok(Value::Float(a.max(b))),
        _ => Ok(Value::Null),
    }
}

/// `len(v)`: characters of a string or elements of a tuple; null otherwise.
fn builtin_len(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("len", args, 1, pos)?;
    Ok(match &args[0] {
        Value::Str(s) => Value::Int(s.chars().count() as i64),
        Value::Tuple(t) => Value::Int(t.elems.len() as i64),
        _ => Value::Null,
    })
}

/// `substr(s, start, len)`: a clamped character slice — a negative start or
/// length clamps to 0, a start past the end yields the empty string, and an
/// overlong length truncates at the end.
fn builtin_substr(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("substr", args, 3, pos)?;
    let Value::Str(s) = &args[0] else {
        return Ok(Value::Null);
    };
    let start = int_arg(&args[1]);
    let length = int_arg(&args[2]);

    let chars: Vec<char> = s.chars().collect();
    let total = chars.len() as i64;
    let start = start.clamp(0, total);
    let length = length.max(0).min(total - start);

    let result: String = chars[start as usize..(start + length) as usize].iter().collect();
    Ok(Value::from(result))
}

/// `concat(…)`: concatenates all string arguments, skipping the rest.
fn builtin_concat(_out: &mut dyn Write, args: &[Value], _pos: Pos) -> EvalResult<Value> {
    let mut result = String::new();
    for arg in args {
        if let Value::Str(s) = arg {
            result.push_str(s);
        }
    }
    Ok(Value::from(result))
}

/// `assert(cond[, message])`: raises a runtime error when the condition is
/// falsy; the error unwinds to the top level and makes the run fail.
fn builtin_assert(_out: &mut dyn Write, args: &[Value], pos: Pos) -> EvalResult<Value> {
    require("assert", args, 1, pos)?;
    if args[0].is_truthy() {
        return Ok(Value::Null);
    }
    let message = match args.get(1) {
        Some(Value::Str(s)) => Some(s.to_string()),
        _ => None,
    };
    Err(RuntimeError::AssertionFailed { message, pos })
}

/// An integer argument, defaulting to 0 for anything else.
const fn int_arg(value: &Value) -> i64 {
    match value {
        Value::Int(n) => *n,
        _ => 0,
    }
}
