use std::iter::Peekable;

use crate::{
    ast::{BinaryOp, Expr, Stmt, SwitchCase, TupleElem, TypeAnn, UnaryOp},
    error::ParseError,
    interpreter::{
        lexer::{Pos, Token},
        parser::{
            core::{ParseResult, check, eat, expect, parse_identifier, parse_scope_block, peek_pos,
                   skip_terminators},
            decl::parse_type_ann,
            statement::parse_statement,
        },
    },
};

/// Parses a full expression.
///
/// Assignment sits at the lowest precedence and is right-associative:
/// `assign := optional ('=' assign)?`. Whether the left-hand side is a valid
/// assignment target (identifier, member, index) is checked at evaluation
/// time.
///
/// # Parameters
/// - `tokens`: Token iterator providing `(Token, Pos)` pairs.
///
/// # Returns
/// The parsed expression node.
///
/// # Errors
/// Propagates any `ParseError` from sub-expression parsing.
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let target = parse_optional(tokens)?;
    if check(tokens, &Token::Equals) {
        let pos = peek_pos(tokens);
        tokens.next();
        let value = parse_expression(tokens)?;
        return Ok(Expr::Assign { target: Box::new(target),
                                 value: Box::new(value),
                                 pos });
    }
    Ok(target)
}

/// Parses the optional expression `cond ? then [: else]`.
///
/// The `?` is handled after every binary level, so `a < b ? c : d` groups as
/// `(a < b) ? c : d`. A missing `:` branch evaluates to null.
fn parse_optional<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let cond = parse_logical_or(tokens)?;
    if check(tokens, &Token::Question) {
        let pos = peek_pos(tokens);
        tokens.next();
        let then_branch = parse_expression(tokens)?;
        let else_branch = if eat(tokens, &Token::Colon) {
            Some(Box::new(parse_expression(tokens)?))
        } else {
            None
        };
        return Ok(Expr::Optional { cond: Box::new(cond),
                                   then_branch: Box::new(then_branch),
                                   else_branch,
                                   pos });
    }
    Ok(cond)
}

/// Parses one left-associative binary level: `next (op next)*` for any
/// operator in `ops`. All binary levels below assignment share this shape.
fn parse_left_assoc<'a, I, F>(tokens: &mut Peekable<I>,
                              ops: &[(Token, BinaryOp)],
                              mut next: F)
                              -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone,
          F: FnMut(&mut Peekable<I>) -> ParseResult<Expr>
{
    let mut left = next(tokens)?;
    loop {
        let found = match tokens.peek() {
            Some((token, pos)) => {
                ops.iter().find(|(t, _)| t == token).map(|(_, op)| (*op, *pos))
            },
            None => None,
        };
        let Some((op, pos)) = found else { break };
        tokens.next();
        let right = next(tokens)?;
        left = Expr::Binary { op,
                              left: Box::new(left),
                              right: Box::new(right),
                              pos };
    }
    Ok(left)
}

/// `or := and ("||" and)*`
fn parse_logical_or<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens, &[(Token::OrOr, BinaryOp::Or)], parse_logical_and)
}

/// `and := bitor ("&&" bitor)*`
fn parse_logical_and<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens, &[(Token::AndAnd, BinaryOp::And)], parse_bit_or)
}

/// `bitor := bitxor ("|" bitxor)*`
fn parse_bit_or<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens, &[(Token::Pipe, BinaryOp::BitOr)], parse_bit_xor)
}

/// `bitxor := bitand ("^" bitand)*`
fn parse_bit_xor<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens, &[(Token::Caret, BinaryOp::BitXor)], parse_bit_and)
}

/// `bitand := equality ("&" equality)*`
fn parse_bit_and<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens, &[(Token::Amp, BinaryOp::BitAnd)], parse_equality)
}

/// `equality := relational (("==" | "!=") relational)*`
fn parse_equality<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens,
                     &[(Token::EqualEqual, BinaryOp::Equal),
                       (Token::BangEqual, BinaryOp::NotEqual)],
                     parse_relational)
}

/// `relational := shift (("<" | ">" | "<=" | ">=") shift)*`
fn parse_relational<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens,
                     &[(Token::Less, BinaryOp::Less),
                       (Token::Greater, BinaryOp::Greater),
                       (Token::LessEqual, BinaryOp::LessEqual),
                       (Token::GreaterEqual, BinaryOp::GreaterEqual)],
                     parse_shift)
}

/// `shift := additive (("<<" | ">>") additive)*`
fn parse_shift<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens,
                     &[(Token::Shl, BinaryOp::Shl), (Token::Shr, BinaryOp::Shr)],
                     parse_additive)
}

/// `additive := multiplicative (("+" | "-") multiplicative)*`
fn parse_additive<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens,
                     &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
                     parse_multiplicative)
}

/// `multiplicative := unary (("*" | "/" | "%") unary)*`
fn parse_multiplicative<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    parse_left_assoc(tokens,
                     &[(Token::Star, BinaryOp::Mul),
                       (Token::Slash, BinaryOp::Div),
                       (Token::Percent, BinaryOp::Mod)],
                     parse_unary)
}

/// Parses prefix operators (`-`, `!`, `~`, `copy`, `move`), then hands off
/// to the postfix chain.
fn parse_unary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = peek_pos(tokens);
    let op = match tokens.peek() {
        Some((Token::Minus, _)) => Some(UnaryOp::Neg),
        Some((Token::Bang, _)) => Some(UnaryOp::Not),
        Some((Token::Tilde, _)) => Some(UnaryOp::BitNot),
        _ => None,
    };
    if let Some(op) = op {
        tokens.next();
        let expr = parse_unary(tokens)?;
        return Ok(Expr::Unary { op, expr: Box::new(expr), pos });
    }
    if eat(tokens, &Token::Copy) {
        let expr = parse_unary(tokens)?;
        return Ok(Expr::Copy { expr: Box::new(expr), pos });
    }
    if eat(tokens, &Token::Move) {
        let expr = parse_unary(tokens)?;
        return Ok(Expr::Move { expr: Box::new(expr), pos });
    }

    let base = parse_primary(tokens)?;
    parse_postfix(tokens, base)
}

/// Parses the postfix chain on a base expression: member access, calls,
/// indexing and template instantiation.
///
/// A `<` here is ambiguous between comparison and `base<T,…>`. The token
/// iterator is cloned as a checkpoint; when the angle-bracket list parses as
/// type annotations the clone is committed, otherwise it is dropped and the
/// `<` is left for the relational level.
fn parse_postfix<'a, I>(tokens: &mut Peekable<I>, mut base: Expr) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    loop {
        match tokens.peek() {
            Some((Token::Dot, pos)) => {
                let pos = *pos;
                tokens.next();
                skip_terminators(tokens);
                let field = parse_identifier(tokens)?;
                base = Expr::Member { object: Box::new(base), field, pos };
            },
            Some((Token::LParen, pos)) => {
                let pos = *pos;
                tokens.next();
                skip_terminators(tokens);
                let arguments = parse_call_args(tokens)?;
                base = Expr::Call { callee: Box::new(base), arguments, pos };
            },
            Some((Token::LBracket, pos)) => {
                let pos = *pos;
                tokens.next();
                let index = parse_expression(tokens)?;
                expect(tokens, &Token::RBracket)?;
                base = Expr::Index { object: Box::new(base),
                                     index: Box::new(index),
                                     pos };
            },
            Some((Token::Less, pos)) => {
                let pos = *pos;
                let mut lookahead = tokens.clone();
                lookahead.next();
                match parse_template_args(&mut lookahead) {
                    Ok(args) => {
                        *tokens = lookahead;
                        base = Expr::TemplateInst { base: Some(Box::new(base)), args, pos };
                    },
                    Err(_) => break,
                }
            },
            _ => break,
        }
    }
    Ok(base)
}

/// Parses call arguments up to and including the closing `)`. A trailing
/// comma is allowed.
fn parse_call_args<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<Expr>>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let mut arguments = Vec::new();
    while !check(tokens, &Token::RParen) && tokens.peek().is_some() {
        arguments.push(parse_expression(tokens)?);
        if !eat(tokens, &Token::Comma) {
            break;
        }
    }
    expect(tokens, &Token::RParen)?;
    Ok(arguments)
}

/// Parses a template argument list after its `<`, up to and including the
/// `>`. Arguments must be type annotations; anything else is an error, which
/// is what makes the postfix speculation roll back on `a < b`.
fn parse_template_args<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<TypeAnn>>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let mut args = Vec::new();
    while !check(tokens, &Token::Greater) && tokens.peek().is_some() {
        args.push(parse_type_ann(tokens)?);
        if !eat(tokens, &Token::Comma) {
            break;
        }
    }
    expect(tokens, &Token::Greater)?;
    Ok(args)
}

/// Parses a primary form: literal, identifier, parenthesized expression or
/// tuple, scope, template application, `for`, `while` or `switch`.
fn parse_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    match tokens.peek() {
        Some((Token::Int(value), pos)) => {
            let (value, pos) = (*value, *pos);
            tokens.next();
            Ok(Expr::Int { value, pos })
        },
        Some((Token::Float(value), pos)) => {
            let (value, pos) = (*value, *pos);
            tokens.next();
            Ok(Expr::Float { value, pos })
        },
        Some((Token::Str(value), pos)) => {
            let (value, pos) = (value.clone(), *pos);
            tokens.next();
            Ok(Expr::Str { value, pos })
        },
        Some((Token::Null, pos)) => {
            let pos = *pos;
            tokens.next();
            Ok(Expr::Null { pos })
        },
        Some((Token::Ident(name), pos)) => {
            let (name, pos) = (name.clone(), *pos);
            tokens.next();
            Ok(Expr::Ident { name, pos })
        },
        Some((Token::LParen, pos)) => {
            let pos = *pos;
            tokens.next();
            parse_paren(tokens, pos)
        },
        Some((Token::LBrace, pos)) => {
            let pos = *pos;
            let body = parse_scope_block(tokens)?;
            Ok(Expr::Scope { body, pos })
        },
        Some((Token::Less, pos)) => {
            // Template application in primary position: `<i32>(x)`.
            let pos = *pos;
            tokens.next();
            let args = parse_template_args(tokens)?;
            Ok(Expr::TemplateInst { base: None, args, pos })
        },
        Some((Token::For, _)) => parse_for(tokens),
        Some((Token::While, _)) => parse_while(tokens),
        Some((Token::Switch, _)) => parse_switch(tokens),
        Some((t, pos)) => Err(ParseError::UnexpectedToken { found: t.describe().to_string(),
                                                            pos:   *pos, }),
        None => Err(ParseError::UnexpectedEndOfInput { pos: Pos::default() }),
    }
}

/// Parses the inside of a parenthesized form, deciding between a grouped
/// expression and a tuple literal.
///
/// It is a tuple when there is a top-level comma, when the first element is
/// named (`ident : expr`), or when the first element is an assignment
/// (`(a = 1, b = 2)` — the evaluator turns assign-shaped children into named
/// elements). A single `(expr)` is a grouped expression, and `()` is the
/// empty tuple.
fn parse_paren<'a, I>(tokens: &mut Peekable<I>, pos: Pos) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    if eat(tokens, &Token::RParen) {
        return Ok(Expr::Tuple { elements: Vec::new(), pos });
    }

    let first = parse_expression(tokens)?;

    if matches!(first, Expr::Ident { .. }) && check(tokens, &Token::Colon) {
        return parse_named_tuple(tokens, first, pos);
    }

    if check(tokens, &Token::Comma) || matches!(first, Expr::Assign { .. }) {
        let mut elements = vec![TupleElem { name: None, value: first }];
        while eat(tokens, &Token::Comma) {
            if check(tokens, &Token::RParen) {
                break;
            }
            elements.push(TupleElem { name: None, value: parse_expression(tokens)? });
        }
        expect(tokens, &Token::RParen)?;
        return Ok(Expr::Tuple { elements, pos });
    }

    expect(tokens, &Token::RParen)?;
    Ok(first)
}

/// Parses the remainder of a named tuple, starting from its first
/// `ident : expr` element. Later elements may be unnamed; once an unnamed
/// element appears, the rest are parsed unnamed.
fn parse_named_tuple<'a, I>(tokens: &mut Peekable<I>, first: Expr, pos: Pos) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let mut elements = Vec::new();
    let mut current = first;
    loop {
        let Expr::Ident { name, .. } = current else { unreachable!() };
        expect(tokens, &Token::Colon)?;
        let value = parse_expression(tokens)?;
        elements.push(TupleElem { name: Some(name), value });

        if !eat(tokens, &Token::Comma) {
            break;
        }
        if check(tokens, &Token::RParen) {
            break;
        }

        let next = parse_expression(tokens)?;
        if matches!(next, Expr::Ident { .. }) && check(tokens, &Token::Colon) {
            current = next;
            continue;
        }
        elements.push(TupleElem { name: None, value: next });
        while eat(tokens, &Token::Comma) {
            if check(tokens, &Token::RParen) {
                break;
            }
            elements.push(TupleElem { name: None, value: parse_expression(tokens)? });
        }
        break;
    }
    expect(tokens, &Token::RParen)?;
    Ok(Expr::Tuple { elements, pos })
}

/// Parses a `for (var : range) { body }` loop expression. An optional
/// `: type` annotation after the header is consumed and ignored.
fn parse_for<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = expect(tokens, &Token::For)?;
    expect(tokens, &Token::LParen)?;
    let var = parse_identifier(tokens)?;
    expect(tokens, &Token::Colon)?;
    let range = parse_expression(tokens)?;
    expect(tokens, &Token::RParen)?;
    if eat(tokens, &Token::Colon) {
        while matches!(tokens.peek(), Some((Token::Colon | Token::Ident(_), _))) {
            tokens.next();
        }
    }
    skip_terminators(tokens);
    let body = parse_scope_block(tokens)?;
    Ok(Expr::For { var, range: Box::new(range), body, pos })
}

/// Parses a `while (cond) { body } [while (cond)]` loop expression with a
/// leading condition and an optional trailing one.
fn parse_while<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = expect(tokens, &Token::While)?;
    expect(tokens, &Token::LParen)?;
    let cond = parse_expression(tokens)?;
    expect(tokens, &Token::RParen)?;
    skip_terminators(tokens);
    let body = parse_scope_block(tokens)?;

    let trailing = if check(tokens, &Token::While) {
        tokens.next();
        expect(tokens, &Token::LParen)?;
        let trailing = parse_expression(tokens)?;
        expect(tokens, &Token::RParen)?;
        Some(Box::new(trailing))
    } else {
        None
    };

    Ok(Expr::While { cond: Some(Box::new(cond)), body, trailing, pos })
}

/// Parses a `switch (tag) { case …: … break; default: … }` expression. An
/// optional `:`-annotation between the header and the body is skipped.
fn parse_switch<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = expect(tokens, &Token::Switch)?;
    expect(tokens, &Token::LParen)?;
    let tag = parse_expression(tokens)?;
    expect(tokens, &Token::RParen)?;
    if eat(tokens, &Token::Colon) {
        while !check(tokens, &Token::LBrace) && tokens.peek().is_some() {
            tokens.next();
        }
    }
    expect(tokens, &Token::LBrace)?;
    skip_terminators(tokens);

    let mut cases = Vec::new();
    loop {
        match tokens.peek() {
            Some((Token::Case, case_pos)) => {
                let case_pos = *case_pos;
                tokens.next();
                let cond = parse_expression(tokens)?;
                expect(tokens, &Token::Colon)?;
                let body = parse_case_body(tokens)?;
                cases.push(SwitchCase { cond: Some(cond), body, pos: case_pos });
            },
            Some((Token::Default, case_pos)) => {
                let case_pos = *case_pos;
                tokens.next();
                expect(tokens, &Token::Colon)?;
                let body = parse_case_body(tokens)?;
                cases.push(SwitchCase { cond: None, body, pos: case_pos });
            },
            _ => break,
        }
        skip_terminators(tokens);
    }
    expect(tokens, &Token::RBrace)?;

    Ok(Expr::Switch { tag: Box::new(tag), cases, pos })
}

/// Parses one case body: optionally braced statements running until
/// `break`, the next case, or the end of the switch. A trailing `break`
/// belongs to the case and is consumed.
fn parse_case_body<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<Stmt>>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let has_brace = eat(tokens, &Token::LBrace);
    skip_terminators(tokens);
    let mut body = Vec::new();
    while !matches!(tokens.peek(),
                    None
                    | Some((Token::Break | Token::Case | Token::Default | Token::RBrace, _)))
    {
        body.push(parse_statement(tokens)?);
        skip_terminators(tokens);
    }
    if has_brace && check(tokens, &Token::RBrace) {
        tokens.next();
    }
    if check(tokens, &Token::Break) {
        tokens.next();
    }
    Ok(body)
}
