use std::iter::Peekable;

use crate::{
    ast::{
        Attrs, FnDecl, ImportDecl, ImportItem, Param, ParamQualifier, PatDecl, RetAnn,
        TemplateDecl, TemplateParam, TypeAnn, VarDecl,
    },
    error::ParseError,
    interpreter::{
        lexer::{Pos, Token},
        parser::{
            core::{ParseResult, check, eat, expect, parse_identifier, parse_scope_block, peek_pos,
                   skip_terminators},
            expr::parse_expression,
        },
    },
};

/// Parses a function declaration.
///
/// Syntax:
/// ```text
/// fn [<template>] name|"op" (params) [: type | :(name:type, …)] [:: attrs] [body]
/// ```
/// The name is an identifier or a quoted custom operator name. Parameters
/// follow the universal annotation rule and may carry a leading `copy` or
/// `move` qualifier and a `= default` value. The body is optional; a
/// forward declaration evaluates to null when called.
///
/// # Errors
/// Returns a `ParseError` for a missing name, unbalanced parameter list or
/// malformed annotations.
pub fn parse_fn_decl<'a, I>(tokens: &mut Peekable<I>, is_pub: bool) -> ParseResult<FnDecl>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = expect(tokens, &Token::Fn)?;
    let tmpl = parse_template_decl(tokens)?;

    let name = match tokens.peek() {
        Some((Token::Ident(name) | Token::OpName(name), _)) => {
            let name = name.clone();
            tokens.next();
            name
        },
        _ => return Err(ParseError::ExpectedFunctionName { pos: peek_pos(tokens) }),
    };

    expect(tokens, &Token::LParen)?;
    let mut params = Vec::new();
    while !check(tokens, &Token::RParen) && tokens.peek().is_some() {
        params.push(parse_param(tokens)?);
        if !eat(tokens, &Token::Comma) {
            break;
        }
    }
    expect(tokens, &Token::RParen)?;

    let mut ret = None;
    if eat(tokens, &Token::Colon) {
        if check(tokens, &Token::LParen) {
            tokens.next();
            let mut slots = Vec::new();
            while !check(tokens, &Token::RParen) && tokens.peek().is_some() {
                slots.push(parse_type_ann(tokens)?);
                if !eat(tokens, &Token::Comma) {
                    break;
                }
            }
            expect(tokens, &Token::RParen)?;
            ret = Some(RetAnn::Tuple(slots));
        } else if !matches!(tokens.peek(),
                            None | Some((Token::LBrace | Token::Newline | Token::Semi, _)))
        {
            ret = Some(RetAnn::Single(parse_type_ann(tokens)?));
        }
    }

    // Function-level attributes may follow with or without a return type:
    //   fn f() : (r:i32) :: constexpr { … }
    //   fn f() :: static { … }
    let mut attrs = Attrs::default();
    if eat(tokens, &Token::ColonColon) {
        parse_attrs(tokens, &mut attrs);
    }

    skip_terminators(tokens);
    let body = if check(tokens, &Token::LBrace) {
        Some(parse_scope_block(tokens)?)
    } else {
        None
    };

    Ok(FnDecl { name, tmpl, params, ret, attrs, is_pub, body, pos })
}

/// Parses one function parameter: qualifier, name, annotation, default.
fn parse_param<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Param>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = peek_pos(tokens);

    let qualifier = if eat(tokens, &Token::Copy) {
        Some(ParamQualifier::Copy)
    } else if eat(tokens, &Token::Move) {
        Some(ParamQualifier::Move)
    } else {
        None
    };

    let name = parse_identifier(tokens)?;

    let mut type_ann = None;
    let mut attrs = Attrs::default();
    if eat(tokens, &Token::ColonColon) {
        // param :: attrs — type omitted.
        parse_attrs(tokens, &mut attrs);
    } else if eat(tokens, &Token::Colon) {
        type_ann = Some(parse_type_ann(tokens)?);
        if eat(tokens, &Token::ColonColon) {
            parse_attrs(tokens, &mut attrs);
        }
    }

    let default = if eat(tokens, &Token::Equals) {
        Some(parse_expression(tokens)?)
    } else {
        None
    };

    Ok(Param { name, qualifier, type_ann, attrs, default, pos })
}

/// Parses a variable declaration.
///
/// Syntax (the universal annotation rule):
/// ```text
/// var name                    — binds null
/// var name = init
/// var name : type [= init]
/// var name : type :: attrs [= init]
/// var name :: attrs = init    — the initializer is mandatory here
/// ```
///
/// # Errors
/// `MissingInitializer` when `::` is used without a type and no `=` follows;
/// other `ParseError`s for malformed input.
pub fn parse_var_decl<'a, I>(tokens: &mut Peekable<I>, is_pub: bool) -> ParseResult<VarDecl>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = expect(tokens, &Token::Var)?;
    let tmpl = parse_template_decl(tokens)?;

    if !matches!(tokens.peek(), Some((Token::Ident(_), _))) {
        return Err(ParseError::ExpectedVariableName { pos: peek_pos(tokens) });
    }
    let name = parse_identifier(tokens)?;

    let mut type_ann = None;
    let mut attrs = Attrs::default();
    if eat(tokens, &Token::ColonColon) {
        // var name :: attrs — the type must be inferable from the
        // initializer, so `=` is required.
        parse_attrs(tokens, &mut attrs);
        if !check(tokens, &Token::Equals) {
            return Err(ParseError::MissingInitializer { pos });
        }
    } else if eat(tokens, &Token::Colon) {
        if !matches!(tokens.peek(),
                     None
                     | Some((Token::Equals | Token::Newline | Token::Semi | Token::ColonColon, _)))
        {
            type_ann = Some(parse_type_ann(tokens)?);
        }
        if eat(tokens, &Token::ColonColon) {
            parse_attrs(tokens, &mut attrs);
        }
    }

    let init = if eat(tokens, &Token::Equals) {
        Some(parse_expression(tokens)?)
    } else {
        None
    };

    Ok(VarDecl { name, tmpl, type_ann, attrs, is_pub, init, pos })
}

/// Parses a pattern declaration.
///
/// Syntax:
/// ```text
/// pat [<template>] Name [: Base [| Base2 …]] [:: attrs] { body }
/// ```
/// Base names are recorded on the declaration; the body is a scope in which
/// `var` children become fields and `fn` children become methods.
///
/// # Errors
/// Returns a `ParseError` for a missing pattern or base name, or a malformed
/// body.
pub fn parse_pat_decl<'a, I>(tokens: &mut Peekable<I>, is_pub: bool) -> ParseResult<PatDecl>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = expect(tokens, &Token::Pat)?;
    let tmpl = parse_template_decl(tokens)?;

    if !matches!(tokens.peek(), Some((Token::Ident(_), _))) {
        return Err(ParseError::ExpectedPatternName { pos: peek_pos(tokens) });
    }
    let name = parse_identifier(tokens)?;

    let mut bases = Vec::new();
    let mut attrs = Attrs::default();
    if eat(tokens, &Token::ColonColon) {
        parse_attrs(tokens, &mut attrs);
    } else if eat(tokens, &Token::Colon) {
        loop {
            bases.push(parse_identifier(tokens)?);
            if !eat(tokens, &Token::Pipe) {
                break;
            }
        }
        if eat(tokens, &Token::ColonColon) {
            parse_attrs(tokens, &mut attrs);
        }
    }

    skip_terminators(tokens);
    let body = if check(tokens, &Token::LBrace) {
        Some(parse_scope_block(tokens)?)
    } else {
        None
    };

    Ok(PatDecl { name, tmpl, bases, attrs, is_pub, body, pos })
}

/// Parses an import declaration.
///
/// Syntax:
/// ```text
/// import a.b.c [as alias] [of item [, item …]]
/// import a of { x as y, z }
/// ```
///
/// # Errors
/// Returns a `ParseError` for a missing module path or malformed item list.
pub fn parse_import_decl<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<ImportDecl>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = expect(tokens, &Token::Import)?;

    if !matches!(tokens.peek(), Some((Token::Ident(_), _))) {
        return Err(ParseError::ExpectedModuleName { pos: peek_pos(tokens) });
    }
    let mut path = parse_identifier(tokens)?;
    while eat(tokens, &Token::Dot) {
        path.push('.');
        path.push_str(&parse_identifier(tokens)?);
    }

    let alias = if eat(tokens, &Token::As) {
        Some(parse_identifier(tokens)?)
    } else {
        None
    };

    let mut items = Vec::new();
    if eat(tokens, &Token::Of) {
        let has_brace = eat(tokens, &Token::LBrace);
        loop {
            let item_pos = peek_pos(tokens);
            let name = parse_identifier(tokens)?;
            let item_alias = if eat(tokens, &Token::As) {
                Some(parse_identifier(tokens)?)
            } else {
                None
            };
            items.push(ImportItem { name, alias: item_alias, pos: item_pos });
            if !eat(tokens, &Token::Comma) {
                break;
            }
            if check(tokens, &Token::RBrace) {
                break;
            }
        }
        if has_brace {
            expect(tokens, &Token::RBrace)?;
        }
    }

    Ok(ImportDecl { path, alias, items, pos })
}

/// Parses a type annotation: `[slot:]name[<args…>]`.
///
/// The slot-name form (`r:i32`) is recognized by one token of lookahead: an
/// identifier followed by a single `:`. Template arguments on the type are
/// stored but carry no runtime meaning.
///
/// # Errors
/// `Expected` when no type name is present.
pub fn parse_type_ann<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<TypeAnn>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    let pos = peek_pos(tokens);

    let mut slot = None;
    let leading_ident = match tokens.peek() {
        Some((Token::Ident(name), _)) => Some(name.clone()),
        _ => None,
    };
    if let Some(name) = leading_ident {
        let mut lookahead = tokens.clone();
        lookahead.next();
        if check(&mut lookahead, &Token::Colon) {
            slot = Some(name);
            tokens.next();
            tokens.next();
        }
    }

    let name = match tokens.peek() {
        Some((Token::Ident(name), _)) => {
            let name = name.clone();
            tokens.next();
            name
        },
        Some((Token::Null, _)) => {
            tokens.next();
            "null".to_string()
        },
        Some((t, pos)) => {
            return Err(ParseError::Expected { what:  "type name",
                                              found: t.describe().to_string(),
                                              pos:   *pos, });
        },
        None => return Err(ParseError::UnexpectedEndOfInput { pos }),
    };

    let mut args = Vec::new();
    if eat(tokens, &Token::Less) {
        while !check(tokens, &Token::Greater) && tokens.peek().is_some() {
            args.push(parse_type_arg(tokens)?);
            if !eat(tokens, &Token::Comma) {
                break;
            }
        }
        expect(tokens, &Token::Greater)?;
    }

    Ok(TypeAnn { slot, name, args, pos })
}

/// Parses one template argument inside a type annotation. Integer literals
/// are allowed here (`Arr<3>`) and stored by their digits.
fn parse_type_arg<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<TypeAnn>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    if let Some((Token::Int(n), pos)) = tokens.peek() {
        let arg = TypeAnn { slot: None, name: n.to_string(), args: Vec::new(), pos: *pos };
        tokens.next();
        return Ok(arg);
    }
    parse_type_ann(tokens)
}

/// Parses an optional template parameter list.
///
/// Syntax:
/// ```text
/// <Param[:type][:count][=default], …>
/// <Param::[count][=default], …>        — type omitted, variadic
/// ```
/// Returns `None` without consuming anything when the next token is not `<`.
///
/// # Errors
/// Returns a `ParseError` when the list is not closed.
pub fn parse_template_decl<'a, I>(tokens: &mut Peekable<I>)
                                  -> ParseResult<Option<TemplateDecl>>
    where I: Iterator<Item = &'a (Token, Pos)> + Clone
{
    if !check(tokens, &Token::Less) {
        return Ok(None);
    }
    let pos = expect(tokens, &Token::Less)?;

    let mut params = Vec::new();
    while !check(tokens, &Token::Greater) && tokens.peek().is_some() {
        if let Some((Token::Ident(name), param_pos)) = tokens.peek() {
            let name = name.clone();
            let param_pos = *param_pos;
            tokens.next();

            let mut constraint = None;
            let mut is_variadic = false;
            if eat(tokens, &Token::ColonColon) {
                // T:: or T::count — variadic with the type omitted.
                is_variadic = true;
                eat_variadic_count(tokens);
            } else if eat(tokens, &Token::Colon) {
                match tokens.peek() {
                    Some((Token::Ident(ty), _)) => {
                        constraint = Some(ty.clone());
                        tokens.next();
                    },
                    Some((Token::Var, _)) => {
                        constraint = Some("var".to_string());
                        tokens.next();
                    },
                    _ => {},
                }
                if eat(tokens, &Token::Colon) {
                    is_variadic = true;
                    eat_variadic_count(tokens);
                }
            }

            let default = if eat(tokens, &Token::Equals) {
                Some(parse_expression(tokens)?)
            } else {
                None
            };

            params.push(TemplateParam { name, constraint, is_variadic, default, pos: param_pos });
        }
        if !eat(tokens, &Token::Comma) {
            break;
        }
    }
    expect(tokens, &Token::Greater)?;

    Ok(Some(TemplateDecl { params, pos }))
}

/// Consumes the optional count after a variadic marker.
fn eat_variadic_count<'a, I>(tokens: &mut Peekable<I>)
    where I: Iterator<Item = &'a (Token, Pos)>
{
    if matches!(tokens.peek(), Some((Token::Ident(_) | Token::Int(_), _))) {
        tokens.next();
    }
}

/// Consumes any run of attribute keywords, setting the matching flags.
pub fn parse_attrs<'a, I>(tokens: &mut Peekable<I>, attrs: &mut Attrs)
    where I: Iterator<Item = &'a (Token, Pos)>
{
    loop {
        match tokens.peek() {
            Some((Token::Static, _)) => attrs.is_static = true,
            Some((Token::Const, _)) => attrs.is_const = true,
            Some((Token::Constexpr, _)) => attrs.is_constexpr = true,
            _ => return,
        }
        tokens.next();
    }
}
