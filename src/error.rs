/// Lexing and parsing errors.
///
/// Everything that can go wrong before a program runs: unknown characters,
/// unterminated literals, unexpected tokens and malformed declarations. Each
/// variant records where in the source it happened.
pub mod parse_error;
/// Runtime errors.
///
/// Everything the evaluator can reject while a program runs: undefined
/// variables, missing members, division by zero, unsupported operations and
/// failed assertions.
pub mod runtime_error;

pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;
