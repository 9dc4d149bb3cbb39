use std::iter::Peekable;

use crate::{
    ast::Stmt,
    error::ParseError,
    interpreter::{
        lexer::{Pos, Token},
        parser::statement::parse_statement,
    },
};

/// Result type used by all parsing functions.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a whole program: statements separated by semicolons or recognized
/// newlines, until the token stream is exhausted.
///
/// # Parameters
/// - `tokens`: Token iterator providing `(Token, Pos)` pairs.
///
/// # Returns
/// The program's statements in source order.
///
/// # Errors
/// Returns the first [`ParseError`] encountered; parsing stops there.
pub fn parse_program<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<Stmt>>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let mut statements = Vec::new();
    skip_terminators(tokens);
    while tokens.peek().is_some() {
        statements.push(parse_statement(tokens)?);
        skip_terminators(tokens);
    }
    Ok(statements)
}

/// Parses a braced statement block: `{ stmt* }`.
///
/// The opening brace must be the next token. Statements run until the
/// matching `}`; terminators between them are skipped.
///
/// # Returns
/// The statements of the block.
///
/// # Errors
/// Returns a `ParseError` if either brace is missing or a statement fails to
/// parse.
pub fn parse_scope_block<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<Stmt>>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    expect(tokens, &Token::LBrace)?;
    let mut statements = Vec::new();
    skip_terminators(tokens);
    while !check(tokens, &Token::RBrace) && tokens.peek().is_some() {
        statements.push(parse_statement(tokens)?);
        skip_terminators(tokens);
    }
    expect(tokens, &Token::RBrace)?;
    Ok(statements)
}

/// Consumes any run of newline and semicolon tokens.
pub fn skip_terminators<'a, I>(tokens: &mut Peekable<I>)
    where I: Iterator<Item = &'a (Token, Pos)>
{
    while let Some((Token::Newline | Token::Semi, _)) = tokens.peek() {
        tokens.next();
    }
}

/// Whether the next token equals `token`, without consuming it.
pub fn check<'a, I>(tokens: &mut Peekable<I>, token: &Token) -> bool
    where I: Iterator<Item = &'a (Token, Pos)>
{
    matches!(tokens.peek(), Some((t, _)) if t == token)
}

/// Consumes the next token when it equals `token`.
///
/// # Returns
/// `true` when the token was consumed.
pub fn eat<'a, I>(tokens: &mut Peekable<I>, token: &Token) -> bool
    where I: Iterator<Item = &'a (Token, Pos)>
{
    if check(tokens, token) {
        tokens.next();
        return true;
    }
    false
}

/// Requires the next token to equal `token` and consumes it.
///
/// # Returns
/// The position of the consumed token.
///
/// # Errors
/// `Expected` with the token's description, or `UnexpectedEndOfInput`.
pub fn expect<'a, I>(tokens: &mut Peekable<I>, token: &Token) -> ParseResult<Pos>
    where I: Iterator<Item = &'a (Token, Pos)>
{
    match tokens.next() {
        Some((t, pos)) if t == token => Ok(*pos),
        Some((t, pos)) => Err(ParseError::Expected { what:  token.describe(),
                                                     found: t.describe().to_string(),
                                                     pos:   *pos, }),
        None => Err(ParseError::UnexpectedEndOfInput { pos: Pos::default() }),
    }
}

/// Parses a plain identifier and returns its name.
///
/// # Errors
/// `Expected` when the next token is not an identifier.
pub fn parse_identifier<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<String>
    where I: Iterator<Item = &'a (Token, Pos)>
{
    match tokens.next() {
        Some((Token::Ident(name), _)) => Ok(name.clone()),
        Some((t, pos)) => Err(ParseError::Expected { what:  "<identifier>",
                                                     found: t.describe().to_string(),
                                                     pos:   *pos, }),
        None => Err(ParseError::UnexpectedEndOfInput { pos: Pos::default() }),
    }
}

/// The position of the next token, or a default when the input is exhausted.
pub fn peek_pos<'a, I>(tokens: &mut Peekable<I>) -> Pos
    where I: Iterator<Item = &'a (Token, Pos)>
{
    tokens.peek().map_or_else(Pos::default, |(_, pos)| *pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BinaryOp, Expr, ParamQualifier, RetAnn},
        interpreter::lexer::tokenize,
    };

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = tokenize(source).unwrap();
        parse_program(&mut tokens.iter().peekable()).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        let tokens = tokenize(source).unwrap();
        parse_program(&mut tokens.iter().peekable()).unwrap_err()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let stmts = parse("1 + 2 * 3");
        let Stmt::Expr(Expr::Binary { op: BinaryOp::Add, right, .. }) = &stmts[0] else {
            panic!("expected addition at the root: {stmts:?}");
        };
        assert!(matches!(right.as_ref(), Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn ternary_groups_after_comparisons() {
        let stmts = parse("x < y ? x : y");
        let Stmt::Expr(Expr::Optional { cond, else_branch, .. }) = &stmts[0] else {
            panic!("expected an optional expression: {stmts:?}");
        };
        assert!(matches!(cond.as_ref(), Expr::Binary { op: BinaryOp::Less, .. }));
        assert!(else_branch.is_some());
    }

    #[test]
    fn parenthesized_expression_is_not_a_tuple() {
        let stmts = parse("(1)");
        assert!(matches!(&stmts[0], Stmt::Expr(Expr::Int { value: 1, .. })));
    }

    fn tuple_elements(source: &str) -> Vec<crate::ast::TupleElem> {
        let stmt = parse(source).remove(0);
        let Stmt::Expr(Expr::Tuple { elements, .. }) = stmt else {
            panic!("expected a tuple statement for {source:?}");
        };
        elements
    }

    #[test]
    fn tuple_forms() {
        // Top-level comma.
        assert_eq!(tuple_elements("(1, 2)").len(), 2);

        // Named first element.
        assert_eq!(tuple_elements("(x: 1)")[0].name.as_deref(), Some("x"));

        // Mixed named and unnamed elements.
        let elements = tuple_elements("(x: 1, 2, 3)");
        assert_eq!(elements.len(), 3);
        assert!(elements[1].name.is_none());

        // An assignment-shaped first element makes it a tuple too.
        assert!(matches!(&parse("(a = 1)")[0], Stmt::Expr(Expr::Tuple { .. })));
    }

    #[test]
    fn template_instantiation_commits_only_on_type_arguments() {
        let stmts = parse("f<i32>(1)");
        let Stmt::Expr(Expr::Call { callee, .. }) = &stmts[0] else {
            panic!("expected a call: {stmts:?}");
        };
        assert!(matches!(callee.as_ref(), Expr::TemplateInst { base: Some(_), .. }));

        // `a < b` keeps being a comparison.
        let stmts = parse("a < b");
        assert!(matches!(&stmts[0], Stmt::Expr(Expr::Binary { op: BinaryOp::Less, .. })));
    }

    #[test]
    fn scope_statement_with_trailing_while() {
        let stmts = parse("{ 1 } while (x)");
        let Stmt::Expr(Expr::While { cond, trailing, .. }) = &stmts[0] else {
            panic!("expected a trailing-condition loop: {stmts:?}");
        };
        assert!(cond.is_none());
        assert!(trailing.is_some());
    }

    #[test]
    fn function_declaration_shapes() {
        let stmts = parse("fn f(copy a:i32, b = 2):(r:i32) {}");
        let Stmt::Fn(decl) = &stmts[0] else {
            panic!("expected a function declaration: {stmts:?}");
        };
        assert_eq!(decl.params.len(), 2);
        assert_eq!(decl.params[0].qualifier, Some(ParamQualifier::Copy));
        assert!(decl.params[1].default.is_some());
        let Some(RetAnn::Tuple(slots)) = &decl.ret else {
            panic!("expected a return tuple");
        };
        assert_eq!(slots[0].slot.as_deref(), Some("r"));
        assert_eq!(slots[0].name, "i32");
    }

    #[test]
    fn annotation_rule_attributes() {
        let stmt = parse("var x:i32::const = 1").remove(0);
        let Stmt::Var(decl) = stmt else {
            panic!("expected a variable declaration");
        };
        assert!(decl.attrs.is_const);
        assert_eq!(decl.type_ann.as_ref().unwrap().name, "i32");

        // `::` without a type demands an initializer.
        assert!(matches!(parse_err("var x :: static"), ParseError::MissingInitializer { .. }));
    }

    #[test]
    fn pub_rules() {
        assert!(matches!(parse_err("pub import m"), ParseError::PubImport { .. }));
        assert!(matches!(parse_err("pub 1"), ParseError::ExpectedDeclaration { .. }));
        assert!(matches!(&parse("pub fn f() {}")[0], Stmt::Fn(decl) if decl.is_pub));
    }

    #[test]
    fn import_forms() {
        let stmt = parse("import a.b.c as m of x, y as z").remove(0);
        let Stmt::Import(decl) = stmt else {
            panic!("expected an import");
        };
        assert_eq!(decl.path, "a.b.c");
        assert_eq!(decl.alias.as_deref(), Some("m"));
        assert_eq!(decl.items.len(), 2);
        assert_eq!(decl.items[1].alias.as_deref(), Some("z"));
    }

    #[test]
    fn custom_operator_name_declares() {
        let stmt = parse("fn \"+>\"(a, b) {}").remove(0);
        let Stmt::Fn(decl) = stmt else {
            panic!("expected a function declaration");
        };
        assert_eq!(decl.name, "+>");
    }
}
