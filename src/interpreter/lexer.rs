use logos::Logos;

use crate::{error::ParseError, util::num::parse_i64_prefix};

/// A position in the source text, 1-based in both coordinates.
///
/// Columns count bytes from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    /// The line number.
    pub line: usize,
    /// The column number.
    pub col:  usize,
}

impl Pos {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// Raw token layer produced by logos, before the context-sensitive rules are
/// applied. Newlines are emitted raw and filtered by [`tokenize`]; string
/// bodies keep their quotes and escapes until conversion.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
enum RawToken {
    #[token("\n")]
    Newline,

    // Keywords.
    #[token("fn")]
    Fn,
    #[token("var")]
    Var,
    #[token("pat")]
    Pat,
    #[token("import")]
    Import,
    #[token("pub")]
    Pub,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("yield")]
    Yield,
    #[token("return")]
    Return,
    #[token("copy")]
    Copy,
    #[token("move")]
    Move,
    #[token("null")]
    Null,
    #[token("as")]
    As,
    #[token("of")]
    Of,
    #[token("static")]
    Static,
    #[token("const")]
    Const,
    #[token("constexpr")]
    Constexpr,

    // Literals. A float needs either a fraction with digits on both sides of
    // the dot, or an exponent; `1.` and `.5` are not float literals.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,
    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // Unterminated literals reach end of input without their closer; the
    // terminated forms match longer and win whenever the closer exists.
    #[regex(r#""([^"\\]|\\.)*"#, priority = 0)]
    #[regex(r"'([^'\\]|\\.)*", priority = 0)]
    UnterminatedString,
    #[regex(r"/\*([^*]|\*+[^*/])*\**", priority = 0)]
    UnterminatedComment,

    // Two-character operators.
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("::")]
    ColonColon,
    #[token("->")]
    Arrow,

    // Single-character tokens.
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("=")]
    Equals,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
}

/// Represents a lexical token as seen by the parser.
///
/// This is the cooked form: escapes are resolved, literals are parsed,
/// newlines only appear where they act as statement terminators, and a
/// double-quoted string following `fn` has become an [`Token::OpName`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// String literal with escapes resolved.
    Str(String),
    /// Custom operator name: a double-quoted string right after `fn`,
    /// taken verbatim.
    OpName(String),
    /// Identifier.
    Ident(String),
    /// `fn`
    Fn,
    /// `var`
    Var,
    /// `pat`
    Pat,
    /// `import`
    Import,
    /// `pub`
    Pub,
    /// `for`
    For,
    /// `while`
    While,
    /// `switch`
    Switch,
    /// `case`
    Case,
    /// `default`
    Default,
    /// `break`
    Break,
    /// `yield`
    Yield,
    /// `return`
    Return,
    /// `copy`
    Copy,
    /// `move`
    Move,
    /// `null`
    Null,
    /// `as`
    As,
    /// `of`
    Of,
    /// `static`
    Static,
    /// `const`
    Const,
    /// `constexpr`
    Constexpr,
    /// A newline acting as a statement terminator.
    Newline,
    /// `;`
    Semi,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `::`
    ColonColon,
    /// `->`
    Arrow,
    /// `=`
    Equals,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `?`
    Question,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
}

impl Token {
    /// A short description of the token kind, used in diagnostics.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Int(_) => "<int>",
            Self::Float(_) => "<float>",
            Self::Str(_) => "<string>",
            Self::OpName(_) => "<operator name>",
            Self::Ident(_) => "<identifier>",
            Self::Fn => "'fn'",
            Self::Var => "'var'",
            Self::Pat => "'pat'",
            Self::Import => "'import'",
            Self::Pub => "'pub'",
            Self::For => "'for'",
            Self::While => "'while'",
            Self::Switch => "'switch'",
            Self::Case => "'case'",
            Self::Default => "'default'",
            Self::Break => "'break'",
            Self::Yield => "'yield'",
            Self::Return => "'return'",
            Self::Copy => "'copy'",
            Self::Move => "'move'",
            Self::Null => "'null'",
            Self::As => "'as'",
            Self::Of => "'of'",
            Self::Static => "'static'",
            Self::Const => "'const'",
            Self::Constexpr => "'constexpr'",
            Self::Newline => "<newline>",
            Self::Semi => "';'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::Colon => "':'",
            Self::ColonColon => "'::'",
            Self::Arrow => "'->'",
            Self::Equals => "'='",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::LessEqual => "'<='",
            Self::GreaterEqual => "'>='",
            Self::EqualEqual => "'=='",
            Self::BangEqual => "'!='",
            Self::Amp => "'&'",
            Self::Pipe => "'|'",
            Self::Caret => "'^'",
            Self::Tilde => "'~'",
            Self::Bang => "'!'",
            Self::Question => "'?'",
            Self::Shl => "'<<'",
            Self::Shr => "'>>'",
            Self::AndAnd => "'&&'",
            Self::OrOr => "'||'",
        }
    }

    /// Whether a statement could be complete after this token. A newline is a
    /// terminator only in that case.
    const fn ends_statement(&self) -> bool {
        matches!(self,
                 Self::Int(_)
                 | Self::Float(_)
                 | Self::Str(_)
                 | Self::Ident(_)
                 | Self::Null
                 | Self::RBrace
                 | Self::RParen
                 | Self::RBracket
                 | Self::Greater
                 | Self::Break
                 | Self::Yield
                 | Self::Return)
    }
}

/// Tracks line/column positions while walking token spans in order.
struct PosTracker {
    line:       usize,
    line_start: usize,
    scanned:    usize,
}

impl PosTracker {
    const fn new() -> Self {
        Self { line: 1, line_start: 0, scanned: 0 }
    }

    /// Advances to `offset`, counting newlines in between (this covers
    /// skipped trivia and multi-line tokens alike), and returns the position
    /// of that offset.
    fn pos_at(&mut self, source: &str, offset: usize) -> Pos {
        for (i, b) in source.as_bytes()[self.scanned..offset].iter().enumerate() {
            if *b == b'\n' {
                self.line += 1;
                self.line_start = self.scanned + i + 1;
            }
        }
        self.scanned = offset;
        Pos::new(self.line, offset - self.line_start + 1)
    }
}

/// Tokenizes a complete source text.
///
/// Applies the context-sensitive rules on top of the raw token layer:
///
/// - A newline becomes a [`Token::Newline`] only when all three bracket
///   depths (paren, square, brace) are zero *and* the last real token (not a
///   newline or `;`) could end a statement. All other newlines are dropped,
///   which is what lets expressions span lines inside brackets or after an
///   operator.
/// - A double-quoted string directly after `fn` becomes a custom operator
///   name instead of a string literal.
///
/// # Errors
/// Returns a [`ParseError`] for unknown characters and unterminated string
/// literals or block comments.
///
/// ## Example
/// ```
/// use patlang::interpreter::lexer::{Token, tokenize};
///
/// let tokens = tokenize("var x = (\n 1 +\n 2\n)\n").unwrap();
/// // No newline tokens inside the parentheses; one after the closing one.
/// let newlines = tokens.iter().filter(|(t, _)| *t == Token::Newline).count();
/// assert_eq!(newlines, 1);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<(Token, Pos)>, ParseError> {
    let mut lexer = RawToken::lexer(source);
    let mut tracker = PosTracker::new();
    let mut tokens = Vec::new();

    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut brace_depth = 0usize;
    let mut last_was_fn = false;
    let mut last_ends_statement = false;

    while let Some(raw) = lexer.next() {
        let span = lexer.span();
        let pos = tracker.pos_at(source, span.start);

        let raw = match raw {
            Ok(raw) => raw,
            Err(()) => {
                let ch = source[span.start..].chars().next().unwrap_or('\0');
                return Err(ParseError::UnknownCharacter { ch, pos });
            },
        };

        if raw == RawToken::Newline {
            let depth = paren_depth + bracket_depth + brace_depth;
            if depth == 0 && last_ends_statement {
                tokens.push((Token::Newline, pos));
                last_ends_statement = false;
            }
            continue;
        }

        let token = cook(raw, lexer.slice(), last_was_fn, pos)?;

        match token {
            Token::LParen => paren_depth += 1,
            Token::RParen => paren_depth = paren_depth.saturating_sub(1),
            Token::LBracket => bracket_depth += 1,
            Token::RBracket => bracket_depth = bracket_depth.saturating_sub(1),
            Token::LBrace => brace_depth += 1,
            Token::RBrace => brace_depth = brace_depth.saturating_sub(1),
            _ => {},
        }
        if token != Token::Semi {
            last_was_fn = token == Token::Fn;
            last_ends_statement = token.ends_statement();
        }

        tokens.push((token, pos));
    }

    Ok(tokens)
}

/// Converts a raw token into its parser-facing form.
fn cook(raw: RawToken, slice: &str, after_fn: bool, pos: Pos) -> Result<Token, ParseError> {
    let token = match raw {
        RawToken::Int => Token::Int(parse_i64_prefix(slice)),
        RawToken::Float => Token::Float(slice.parse().unwrap_or(0.0)),
        RawToken::SingleQuoted => Token::Str(unescape(&slice[1..slice.len() - 1])),
        RawToken::DoubleQuoted => {
            let body = &slice[1..slice.len() - 1];
            if after_fn {
                // Operator names are taken verbatim; `fn "+>"` declares `+>`.
                Token::OpName(body.to_string())
            } else {
                Token::Str(unescape(body))
            }
        },
        RawToken::Ident => Token::Ident(slice.to_string()),
        RawToken::UnterminatedString => return Err(ParseError::UnterminatedString { pos }),
        RawToken::UnterminatedComment => return Err(ParseError::UnterminatedComment { pos }),
        RawToken::Newline => unreachable!("newlines are filtered before cooking"),
        RawToken::Fn => Token::Fn,
        RawToken::Var => Token::Var,
        RawToken::Pat => Token::Pat,
        RawToken::Import => Token::Import,
        RawToken::Pub => Token::Pub,
        RawToken::For => Token::For,
        RawToken::While => Token::While,
        RawToken::Switch => Token::Switch,
        RawToken::Case => Token::Case,
        RawToken::Default => Token::Default,
        RawToken::Break => Token::Break,
        RawToken::Yield => Token::Yield,
        RawToken::Return => Token::Return,
        RawToken::Copy => Token::Copy,
        RawToken::Move => Token::Move,
        RawToken::Null => Token::Null,
        RawToken::As => Token::As,
        RawToken::Of => Token::Of,
        RawToken::Static => Token::Static,
        RawToken::Const => Token::Const,
        RawToken::Constexpr => Token::Constexpr,
        RawToken::Semi => Token::Semi,
        RawToken::LBrace => Token::LBrace,
        RawToken::RBrace => Token::RBrace,
        RawToken::LParen => Token::LParen,
        RawToken::RParen => Token::RParen,
        RawToken::LBracket => Token::LBracket,
        RawToken::RBracket => Token::RBracket,
        RawToken::Less => Token::Less,
        RawToken::Greater => Token::Greater,
        RawToken::Comma => Token::Comma,
        RawToken::Dot => Token::Dot,
        RawToken::Colon => Token::Colon,
        RawToken::ColonColon => Token::ColonColon,
        RawToken::Arrow => Token::Arrow,
        RawToken::Equals => Token::Equals,
        RawToken::Plus => Token::Plus,
        RawToken::Minus => Token::Minus,
        RawToken::Star => Token::Star,
        RawToken::Slash => Token::Slash,
        RawToken::Percent => Token::Percent,
        RawToken::LessEqual => Token::LessEqual,
        RawToken::GreaterEqual => Token::GreaterEqual,
        RawToken::EqualEqual => Token::EqualEqual,
        RawToken::BangEqual => Token::BangEqual,
        RawToken::Amp => Token::Amp,
        RawToken::Pipe => Token::Pipe,
        RawToken::Caret => Token::Caret,
        RawToken::Tilde => Token::Tilde,
        RawToken::Bang => Token::Bang,
        RawToken::Question => Token::Question,
        RawToken::Shl => Token::Shl,
        RawToken::Shr => Token::Shr,
        RawToken::AndAnd => Token::AndAnd,
        RawToken::OrOr => Token::OrOr,
    };
    Ok(token)
}

/// Resolves `\n`, `\t`, `\r` and `\\`; an unknown escape passes the escaped
/// character through unchanged.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn literals_and_keywords() {
        assert_eq!(kinds("var x = 42"),
                   vec![Token::Var,
                        Token::Ident("x".to_string()),
                        Token::Equals,
                        Token::Int(42)]);
        assert_eq!(kinds("1.5 2 3e2"),
                   vec![Token::Float(1.5), Token::Int(2), Token::Float(300.0)]);
        // `1.` is an int followed by a dot, not a float literal.
        assert_eq!(kinds("1.x"),
                   vec![Token::Int(1), Token::Dot, Token::Ident("x".to_string())]);
    }

    #[test]
    fn newline_terminates_complete_statement() {
        let tokens = kinds("x = 1\ny = 2");
        assert!(tokens.contains(&Token::Newline));
    }

    #[test]
    fn newline_suppressed_mid_expression() {
        assert!(!kinds("1 +\n2").contains(&Token::Newline));
        assert!(!kinds("var x =\n1").contains(&Token::Newline));
    }

    #[test]
    fn newline_suppressed_inside_brackets() {
        assert!(!kinds("(1\n, 2\n)").contains(&Token::Newline));
        assert!(!kinds("[1\n]").contains(&Token::Newline));
        assert!(!kinds("{ a\nb }").contains(&Token::Newline));
    }

    #[test]
    fn newline_after_closing_bracket_terminates() {
        let tokens = kinds("f(1)\ng(2)");
        assert_eq!(tokens.iter().filter(|t| **t == Token::Newline).count(), 1);
    }

    #[test]
    fn custom_operator_after_fn() {
        let tokens = kinds("fn \"+>\"(a, b)");
        assert_eq!(tokens[1], Token::OpName("+>".to_string()));
        // Anywhere else a double-quoted string stays a string.
        assert_eq!(kinds("var s = \"+>\"")[3], Token::Str("+>".to_string()));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds("'a\\nb'"), vec![Token::Str("a\nb".to_string())]);
        assert_eq!(kinds("'\\q'"), vec![Token::Str("q".to_string())]);
        assert_eq!(kinds("\"tab\\t\""), vec![Token::Str("tab\t".to_string())]);
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("a = 1\n  b = 2").unwrap();
        let (_, pos) = tokens.iter().find(|(t, _)| *t == Token::Ident("b".to_string())).unwrap();
        assert_eq!(*pos, Pos::new(2, 3));
    }

    #[test]
    fn comments_are_skipped_and_lines_still_counted() {
        let tokens = tokenize("// line\n/* multi\nline */ x").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].1.line, 3);
    }

    #[test]
    fn unbalanced_closers_clamp_at_zero() {
        // A stray `)` must not wedge the depth counter below zero.
        let tokens = kinds(")\nx = 1\ny");
        assert!(tokens.contains(&Token::Newline));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(tokenize("'abc"), Err(ParseError::UnterminatedString { .. })));
        assert!(matches!(tokenize("\"abc"), Err(ParseError::UnterminatedString { .. })));
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        assert!(matches!(tokenize("/* abc"), Err(ParseError::UnterminatedComment { .. })));
    }

    #[test]
    fn unknown_character_is_an_error() {
        assert!(matches!(tokenize("a @ b"), Err(ParseError::UnknownCharacter { ch: '@', .. })));
    }
}
