use std::rc::Rc;

use crate::interpreter::lexer::Pos;

/// An abstract syntax tree (AST) node representing an expression.
///
/// The language is expression-oriented: control flow (`for`, `while`,
/// `switch`, `{…}` scopes) appears here alongside literals, operators and
/// calls, so any of these forms can be assigned to a variable or passed as an
/// argument. Each variant records the source position of its introducing
/// token for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The `null` literal.
    Null {
        /// Source position.
        pos: Pos,
    },
    /// A 64-bit signed integer literal.
    Int {
        /// The literal value.
        value: i64,
        /// Source position.
        pos:   Pos,
    },
    /// A 64-bit floating-point literal.
    Float {
        /// The literal value.
        value: f64,
        /// Source position.
        pos:   Pos,
    },
    /// A string literal with escapes already resolved.
    Str {
        /// The literal text.
        value: String,
        /// Source position.
        pos:   Pos,
    },
    /// Reference to a variable by name.
    Ident {
        /// Name of the variable.
        name: String,
        /// Source position.
        pos:  Pos,
    },
    /// A unary operation (`-`, `!`, `~`).
    Unary {
        /// The operator to apply.
        op:   UnaryOp,
        /// The operand expression.
        expr: Box<Self>,
        /// Source position.
        pos:  Pos,
    },
    /// A binary operation (arithmetic, comparison, logic, bitwise).
    Binary {
        /// The operator.
        op:    BinaryOp,
        /// Left operand.
        left:  Box<Self>,
        /// Right operand.
        right: Box<Self>,
        /// Source position.
        pos:   Pos,
    },
    /// The optional expression `cond ? then : else`, with `: else` omissible.
    Optional {
        /// The condition.
        cond:        Box<Self>,
        /// Evaluated when the condition is truthy.
        then_branch: Box<Self>,
        /// Evaluated otherwise; a missing branch produces null.
        else_branch: Option<Box<Self>>,
        /// Source position.
        pos:         Pos,
    },
    /// Assignment. Expression-valued; the target is validated at evaluation
    /// time (identifier, member access, or index).
    Assign {
        /// The assignment target.
        target: Box<Self>,
        /// The assigned value.
        value:  Box<Self>,
        /// Source position.
        pos:    Pos,
    },
    /// Member access `object.field`.
    Member {
        /// The accessed value.
        object: Box<Self>,
        /// The member name.
        field:  String,
        /// Source position.
        pos:    Pos,
    },
    /// Index access `object[index]`.
    Index {
        /// The indexed value.
        object: Box<Self>,
        /// The index expression.
        index:  Box<Self>,
        /// Source position.
        pos:    Pos,
    },
    /// A call `callee(arguments…)`.
    Call {
        /// The called expression.
        callee:    Box<Self>,
        /// Argument expressions in declaration order.
        arguments: Vec<Self>,
        /// Source position.
        pos:       Pos,
    },
    /// A tuple literal; elements may individually be named.
    Tuple {
        /// The tuple elements.
        elements: Vec<TupleElem>,
        /// Source position.
        pos:      Pos,
    },
    /// A `{…}` scope: statements evaluated in a child environment, producing
    /// the last statement's value.
    Scope {
        /// The statements of the scope.
        body: Vec<Stmt>,
        /// Source position.
        pos:  Pos,
    },
    /// A template instantiation: `<T,…>(…)` as a primary form, or
    /// `base<T,…>` as a postfix form.
    TemplateInst {
        /// The postfix base, when present.
        base: Option<Box<Self>>,
        /// The type arguments.
        args: Vec<TypeAnn>,
        /// Source position.
        pos:  Pos,
    },
    /// `copy expr` — an explicit copy of the operand.
    Copy {
        /// The operand.
        expr: Box<Self>,
        /// Source position.
        pos:  Pos,
    },
    /// `move expr` — takes ownership of an identifier's binding.
    Move {
        /// The operand.
        expr: Box<Self>,
        /// Source position.
        pos:  Pos,
    },
    /// A `for (var : range)` loop over a tuple or integer range.
    For {
        /// The loop variable name.
        var:   String,
        /// The range expression, evaluated once.
        range: Box<Self>,
        /// The loop body.
        body:  Vec<Stmt>,
        /// Source position.
        pos:   Pos,
    },
    /// A `while` loop with optional leading and/or trailing condition.
    While {
        /// Condition checked before each iteration.
        cond:     Option<Box<Self>>,
        /// The loop body.
        body:     Vec<Stmt>,
        /// Condition checked after each iteration.
        trailing: Option<Box<Self>>,
        /// Source position.
        pos:      Pos,
    },
    /// A `switch` expression; the first matching case runs, `default`
    /// always matches.
    Switch {
        /// The switched-on value.
        tag:   Box<Self>,
        /// The cases in source order.
        cases: Vec<SwitchCase>,
        /// Source position.
        pos:   Pos,
    },
}

impl Expr {
    /// Gets the source position of the expression's introducing token.
    #[must_use]
    pub const fn pos(&self) -> Pos {
        match self {
            Self::Null { pos }
            | Self::Int { pos, .. }
            | Self::Float { pos, .. }
            | Self::Str { pos, .. }
            | Self::Ident { pos, .. }
            | Self::Unary { pos, .. }
            | Self::Binary { pos, .. }
            | Self::Optional { pos, .. }
            | Self::Assign { pos, .. }
            | Self::Member { pos, .. }
            | Self::Index { pos, .. }
            | Self::Call { pos, .. }
            | Self::Tuple { pos, .. }
            | Self::Scope { pos, .. }
            | Self::TemplateInst { pos, .. }
            | Self::Copy { pos, .. }
            | Self::Move { pos, .. }
            | Self::For { pos, .. }
            | Self::While { pos, .. }
            | Self::Switch { pos, .. } => *pos,
        }
    }
}

/// Represents a top-level or block-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A standalone expression evaluated for its value.
    Expr(Expr),
    /// A function declaration. Shared so function values can keep the
    /// declaration alive after the enclosing program is dropped.
    Fn(Rc<FnDecl>),
    /// A variable declaration.
    Var(VarDecl),
    /// A pattern declaration.
    Pat(PatDecl),
    /// An import declaration.
    Import(ImportDecl),
    /// `break` out of the nearest loop or switch case.
    Break {
        /// Source position.
        pos: Pos,
    },
    /// `yield [expr]` — hands a value to the nearest loop or switch.
    Yield {
        /// The yielded expression, defaulting to null.
        value: Option<Expr>,
        /// Source position.
        pos:   Pos,
    },
    /// `return [expr]` — exits the nearest function.
    Return {
        /// The returned expression.
        value: Option<Expr>,
        /// Source position.
        pos:   Pos,
    },
}

/// A function declaration: named function, method, or quoted custom
/// operator.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    /// The function name (or the quoted operator text).
    pub name:   String,
    /// Optional template parameter list.
    pub tmpl:   Option<TemplateDecl>,
    /// The parameters in declaration order.
    pub params: Vec<Param>,
    /// Optional return annotation.
    pub ret:    Option<RetAnn>,
    /// Declaration attributes (`static`, `const`, `constexpr`).
    pub attrs:  Attrs,
    /// Whether the declaration is `pub`.
    pub is_pub: bool,
    /// The body; a forward declaration has none and evaluates to null.
    pub body:   Option<Vec<Stmt>>,
    /// Source position.
    pub pos:    Pos,
}

/// A function's return annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum RetAnn {
    /// A single type: `fn f() : i32`.
    Single(TypeAnn),
    /// A return tuple: `fn f() : (r:i32, s:string)`. When every slot is
    /// named, the slots are collected into a named tuple on fall-through.
    Tuple(Vec<TypeAnn>),
}

/// A single function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// The parameter name.
    pub name:      String,
    /// Optional leading `copy`/`move` qualifier.
    pub qualifier: Option<ParamQualifier>,
    /// Optional type annotation.
    pub type_ann:  Option<TypeAnn>,
    /// Parameter attributes.
    pub attrs:     Attrs,
    /// Optional default value.
    pub default:   Option<Expr>,
    /// Source position.
    pub pos:       Pos,
}

/// A parameter passing qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamQualifier {
    /// `copy` — the argument is copied.
    Copy,
    /// `move` — the argument is moved.
    Move,
}

/// A variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    /// The variable name.
    pub name:     String,
    /// Optional template parameter list.
    pub tmpl:     Option<TemplateDecl>,
    /// Optional type annotation.
    pub type_ann: Option<TypeAnn>,
    /// Declaration attributes.
    pub attrs:    Attrs,
    /// Whether the declaration is `pub`.
    pub is_pub:   bool,
    /// Optional initializer; a missing one binds null.
    pub init:     Option<Expr>,
    /// Source position.
    pub pos:      Pos,
}

/// A pattern declaration: a named record type with fields and methods.
#[derive(Debug, Clone, PartialEq)]
pub struct PatDecl {
    /// The pattern name.
    pub name:   String,
    /// Optional template parameter list.
    pub tmpl:   Option<TemplateDecl>,
    /// Base pattern names (`pat Name : Base | Base2`). Stored, not yet
    /// composed at runtime.
    pub bases:  Vec<String>,
    /// Declaration attributes.
    pub attrs:  Attrs,
    /// Whether the declaration is `pub`.
    pub is_pub: bool,
    /// The pattern body.
    pub body:   Option<Vec<Stmt>>,
    /// Source position.
    pub pos:    Pos,
}

/// An import declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// The dotted module path (`a.b.c`).
    pub path:  String,
    /// Optional `as` alias for the module itself.
    pub alias: Option<String>,
    /// Items selected with `of`; empty means the whole module is bound.
    pub items: Vec<ImportItem>,
    /// Source position.
    pub pos:   Pos,
}

/// One item of an `import … of …` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    /// The exported name to look up.
    pub name:  String,
    /// Optional `as` alias to bind instead.
    pub alias: Option<String>,
    /// Source position.
    pub pos:   Pos,
}

/// A type annotation: an optional slot name plus a type name with optional
/// template arguments, as in `r:i32` or `Vec<i32>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnn {
    /// The slot name in `name:type` positions (return tuples, named
    /// elements).
    pub slot: Option<String>,
    /// The type name.
    pub name: String,
    /// Template arguments on the type, if any.
    pub args: Vec<TypeAnn>,
    /// Source position.
    pub pos:  Pos,
}

/// A template parameter list, as in `fn <T, N:i32> f(…)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    /// The template parameters.
    pub params: Vec<TemplateParam>,
    /// Source position.
    pub pos:    Pos,
}

/// One template parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParam {
    /// The parameter name.
    pub name:        String,
    /// Optional type constraint.
    pub constraint:  Option<String>,
    /// Whether the parameter is variadic (`T::` or `T:type:`).
    pub is_variadic: bool,
    /// Optional default value.
    pub default:     Option<Expr>,
    /// Source position.
    pub pos:         Pos,
}

/// Declaration attributes recognized after `::`. Retained for future use;
/// they do not affect evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attrs {
    /// `static`
    pub is_static:    bool,
    /// `const`
    pub is_const:     bool,
    /// `constexpr`
    pub is_constexpr: bool,
}

/// One element of a tuple literal.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleElem {
    /// The element name, for `(name: expr)` elements.
    pub name:  Option<String>,
    /// The element value.
    pub value: Expr,
}

/// One case of a `switch` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// The case value; `None` is the `default` case and always matches.
    pub cond: Option<Expr>,
    /// The case body.
    pub body: Vec<Stmt>,
    /// Source position.
    pub pos:  Pos,
}

/// Represents a binary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition (`+`); concatenation on two strings.
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Modulo (`%`)
    Mod,
    /// Less than (`<`)
    Less,
    /// Greater than (`>`)
    Greater,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Equal to (`==`)
    Equal,
    /// Not equal to (`!=`)
    NotEqual,
    /// Logical and (`&&`)
    And,
    /// Logical or (`||`)
    Or,
    /// Bitwise and (`&`)
    BitAnd,
    /// Bitwise or (`|`)
    BitOr,
    /// Bitwise xor (`^`)
    BitXor,
    /// Left shift (`<<`)
    Shl,
    /// Right shift (`>>`)
    Shr,
}

impl BinaryOp {
    /// The operator's source text, used in diagnostics.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Represents a unary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation (`-x`).
    Neg,
    /// Logical not on the operand's truthiness (`!x`).
    Not,
    /// Bitwise not on integers (`~x`).
    BitNot,
}

impl UnaryOp {
    /// The operator's source text, used in diagnostics.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
            Self::BitNot => "~",
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}
