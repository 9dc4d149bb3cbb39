/// The interpreter driver.
///
/// Declares the `Interp` struct, the control-flow `Flow` type, statement and
/// block evaluation, and the expression dispatcher.
pub mod core;

/// Unary and binary operator evaluation: the promotion, comparison and
/// equality tables, centralized so every "unsupported operation" diagnostic
/// comes from one place.
pub mod binary;
/// Calls: user functions (with named-return collection), built-ins, pattern
/// instantiation and type-conversion application.
pub mod call;
/// Declarations: `fn`, `var` and `pat` statements.
pub mod decl;
/// Loops and switch: `for`, `while` and `switch` expressions and their
/// handling of the `break`/`yield` signals.
pub mod loops;
/// Member access, indexing and assignment targets.
pub mod member;
