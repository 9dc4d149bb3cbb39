//! # patlang
//!
//! patlang is a small, expression-oriented scripting language with inferred
//! statement terminators, struct-like patterns, functions with named return
//! tuples, loops and switches that yield values, and file-based modules.
//! This crate contains the complete runtime: context-sensitive tokenizer,
//! recursive-descent parser and tree-walking evaluator over
//! reference-counted values.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::large_enum_variant,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
)]
#![allow(clippy::multiple_crate_versions)]

use std::io::Write;

use crate::interpreter::{
    evaluator::core::Interp, lexer::tokenize, parser::core::parse_program, value::core::Value,
};

/// Defines the structure of parsed code.
///
/// This module declares the `Expr` and `Stmt` enums and the declaration
/// types that represent source code as a tree. Every node carries its source
/// position for error reporting. The AST is built by the parser, is
/// immutable afterwards, and is traversed by the evaluator; function
/// declarations are reference-counted so closures keep them alive.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// Defines all errors that can be raised while lexing, parsing or running
/// code. Every variant carries the source position of the offending token
/// and renders a user-facing message with line and column.
pub mod error;
/// The language runtime.
///
/// Ties together the tokenizer, parser, environments, values, built-ins and
/// the module loader into the tree-walking interpreter, and exposes the
/// types embedders need to run programs and inspect results.
pub mod interpreter;
/// General utilities for numeric conversion.
///
/// C-library-style helpers shared by the lexer, the conversion built-ins and
/// type application: longest-prefix parsing and truncating casts.
pub mod util;

/// Tokenizes, parses and runs a source text in the given interpreter,
/// returning the program's result value.
///
/// The interpreter keeps its global environment and module cache across
/// calls, which is what the REPL builds on.
///
/// # Errors
/// Returns the first parse or runtime error.
///
/// # Examples
/// ```
/// use patlang::interpreter::evaluator::core::Interp;
///
/// let mut out = Vec::new();
/// let mut interp = Interp::new(&mut out);
/// patlang::run_source("print(1 + 2 * 3)", &mut interp).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "7\n");
/// ```
pub fn run_source<W: Write>(source: &str,
                            interp: &mut Interp<'_, W>)
                            -> Result<Value, Box<dyn std::error::Error>> {
    let tokens = tokenize(source)?;
    let program = parse_program(&mut tokens.iter().peekable())?;
    Ok(interp.run(&program)?)
}
