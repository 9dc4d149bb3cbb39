use std::{iter::Peekable, rc::Rc};

use crate::{
    ast::{Expr, Stmt},
    error::ParseError,
    interpreter::{
        lexer::{Pos, Token},
        parser::{
            core::{ParseResult, check, eat, expect, parse_scope_block, peek_pos},
            decl::{parse_fn_decl, parse_import_decl, parse_pat_decl, parse_var_decl},
            expr::parse_expression,
        },
    },
};

/// Parses a single statement.
///
/// A statement is one of:
/// - a `fn`, `var` or `pat` declaration, optionally preceded by `pub`,
/// - an `import` declaration (never `pub`),
/// - a lone `break`, or `yield`/`return` with an optional expression,
/// - a `{…}` scope, optionally followed by a trailing `while (cond)`,
/// - an expression statement (which covers `for`, `while`, `switch` and all
///   other expressions).
///
/// # Errors
/// Returns a `ParseError` when the statement is malformed.
pub fn parse_statement<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Stmt>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = peek_pos(tokens);
    let is_pub = eat(tokens, &Token::Pub);

    match tokens.peek() {
        Some((Token::Fn, _)) => Ok(Stmt::Fn(Rc::new(parse_fn_decl(tokens, is_pub)?))),
        Some((Token::Var, _)) => Ok(Stmt::Var(parse_var_decl(tokens, is_pub)?)),
        Some((Token::Pat, _)) => Ok(Stmt::Pat(parse_pat_decl(tokens, is_pub)?)),
        Some((Token::Import, _)) => {
            if is_pub {
                return Err(ParseError::PubImport { pos });
            }
            Ok(Stmt::Import(parse_import_decl(tokens)?))
        },
        Some((Token::Break, pos)) => {
            let pos = *pos;
            tokens.next();
            Ok(Stmt::Break { pos })
        },
        Some((Token::Yield, pos)) => {
            let pos = *pos;
            tokens.next();
            let value = parse_trailing_expression(tokens)?;
            Ok(Stmt::Yield { value, pos })
        },
        Some((Token::Return, pos)) => {
            let pos = *pos;
            tokens.next();
            let value = parse_trailing_expression(tokens)?;
            Ok(Stmt::Return { value, pos })
        },
        Some((Token::LBrace, pos)) => {
            let pos = *pos;
            if is_pub {
                return Err(ParseError::ExpectedDeclaration { pos });
            }
            parse_scope_statement(tokens, pos)
        },
        Some((_, pos)) => {
            if is_pub {
                return Err(ParseError::ExpectedDeclaration { pos: *pos });
            }
            Ok(Stmt::Expr(parse_expression(tokens)?))
        },
        None => Err(ParseError::UnexpectedEndOfInput { pos }),
    }
}

/// Parses the optional expression after `yield` or `return`: absent when a
/// terminator, `}` or the end of input follows directly.
fn parse_trailing_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Expr>>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    match tokens.peek() {
        None | Some((Token::Newline | Token::Semi | Token::RBrace, _)) => Ok(None),
        Some(_) => Ok(Some(parse_expression(tokens)?)),
    }
}

/// Parses a scope statement. `{…} while (cond)` is the trailing-condition
/// loop form: the body runs once before the condition is first checked.
fn parse_scope_statement<'a, I>(tokens: &mut Peekable<I>, pos: Pos) -> ParseResult<Stmt>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let body = parse_scope_block(tokens)?;

    if check(tokens, &Token::While) {
        tokens.next();
        expect(tokens, &Token::LParen)?;
        let trailing = parse_expression(tokens)?;
        expect(tokens, &Token::RParen)?;
        return Ok(Stmt::Expr(Expr::While { cond: None,
                                           body,
                                           trailing: Some(Box::new(trailing)),
                                           pos }));
    }

    Ok(Stmt::Expr(Expr::Scope { body, pos }))
}
