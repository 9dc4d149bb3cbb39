use crate::interpreter::lexer::Pos;

#[derive(Debug)]
/// An error raised by the evaluator while a program runs. These travel up
/// the signal channel until the top-level run reports them.
pub enum RuntimeError {
    /// Tried to read a name that is bound nowhere in the environment chain.
    UndefinedVariable {
        /// The name of the variable.
        name: String,
        /// Where the lookup happened.
        pos:  Pos,
    },
    /// Member access on a value that has no member of that name.
    NoSuchMember {
        /// The requested member name.
        name: String,
        /// Where the access happened.
        pos:  Pos,
    },
    /// Assignment to a member of a value that does not support it.
    CannotAssignMember {
        /// Where the assignment happened.
        pos: Pos,
    },
    /// The left-hand side of `=` is not an identifier, member or index.
    InvalidAssignTarget {
        /// Where the assignment happened.
        pos: Pos,
    },
    /// Assignment through an index expression.
    IndexAssignUnsupported {
        /// Where the assignment happened.
        pos: Pos,
    },
    /// Integer division by zero.
    DivisionByZero {
        /// Where the division happened.
        pos: Pos,
    },
    /// Integer modulo by zero.
    ModuloByZero {
        /// Where the operation happened.
        pos: Pos,
    },
    /// Tuple index outside the valid range (after negative wrap-around).
    IndexOutOfRange {
        /// Where the indexing happened.
        pos: Pos,
    },
    /// Indexing a value that is not indexable.
    IndexUnsupported {
        /// Where the indexing happened.
        pos: Pos,
    },
    /// A binary operator was applied to operands it does not support.
    UnsupportedBinary {
        /// The operator text.
        op:  &'static str,
        /// Where the operation happened.
        pos: Pos,
    },
    /// A unary operator was applied to an operand it does not support.
    UnsupportedUnary {
        /// The operator text.
        op:  &'static str,
        /// Where the operation happened.
        pos: Pos,
    },
    /// A shift amount was negative or at least the integer width.
    ShiftOutOfRange {
        /// Where the shift happened.
        pos: Pos,
    },
    /// Call syntax on a value that is not callable.
    NotCallable {
        /// Where the call happened.
        pos: Pos,
    },
    /// A pattern method was called after its pattern scope was dropped.
    MethodScopeDropped {
        /// Where the call happened.
        pos: Pos,
    },
    /// A built-in function received the wrong number of arguments.
    ArgumentCount {
        /// The built-in's name.
        name:     &'static str,
        /// How many arguments it requires.
        expected: usize,
        /// How many arguments it received.
        got:      usize,
        /// Where the call happened.
        pos:      Pos,
    },
    /// An `assert` call failed.
    AssertionFailed {
        /// Optional message passed as the second argument.
        message: Option<String>,
        /// Where the assertion happened.
        pos:     Pos,
    },
    /// Writing program output failed.
    Io(std::io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndefinedVariable { name, pos } => {
                write!(f, "Runtime error at {pos}: undefined variable '{name}'.")
            },
            Self::NoSuchMember { name, pos } => {
                write!(f, "Runtime error at {pos}: no member '{name}'.")
            },
            Self::CannotAssignMember { pos } => {
                write!(f, "Runtime error at {pos}: cannot assign to member.")
            },
            Self::InvalidAssignTarget { pos } => {
                write!(f, "Runtime error at {pos}: invalid assignment target.")
            },
            Self::IndexAssignUnsupported { pos } => {
                write!(f, "Runtime error at {pos}: index assignment is not supported.")
            },
            Self::DivisionByZero { pos } => {
                write!(f, "Runtime error at {pos}: division by zero.")
            },
            Self::ModuloByZero { pos } => {
                write!(f, "Runtime error at {pos}: modulo by zero.")
            },
            Self::IndexOutOfRange { pos } => {
                write!(f, "Runtime error at {pos}: tuple index out of range.")
            },
            Self::IndexUnsupported { pos } => {
                write!(f, "Runtime error at {pos}: index not supported for this type.")
            },
            Self::UnsupportedBinary { op, pos } => {
                write!(f, "Runtime error at {pos}: unsupported binary operation '{op}'.")
            },
            Self::UnsupportedUnary { op, pos } => {
                write!(f, "Runtime error at {pos}: unsupported unary operation '{op}'.")
            },
            Self::ShiftOutOfRange { pos } => {
                write!(f, "Runtime error at {pos}: shift amount out of range.")
            },
            Self::NotCallable { pos } => {
                write!(f, "Runtime error at {pos}: not a callable value.")
            },
            Self::MethodScopeDropped { pos } => {
                write!(f, "Runtime error at {pos}: pattern scope of this method no longer exists.")
            },
            Self::ArgumentCount { name, expected, got, pos } => {
                write!(f,
                       "Runtime error at {pos}: '{name}' expects {expected} argument(s), got {got}.")
            },
            Self::AssertionFailed { message, pos } => match message {
                Some(message) => write!(f, "Runtime error at {pos}: Assertion failed: {message}"),
                None => write!(f, "Runtime error at {pos}: Assertion failed."),
            },
            Self::Io(e) => write!(f, "Runtime error: I/O error: {e}"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
