//! Lexer for template code (`%` lines, `<% %>` blocks and `{{ }}` bodies) using logos

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Directive keywords
    #[token("rebase")]
    Rebase,
    #[token("include")]
    Include,
    #[token("setdefault")]
    SetDefault,

    // Control keywords
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("end")]
    End,

    // Logical operators
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    #[token("true")]
    #[token("True")]
    True,
    #[token("false")]
    #[token("False")]
    False,

    // Comparison operators (longer first)
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LessOrEqual,
    #[token(">=")]
    GreaterOrEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("=")]
    Equals,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,

    // Delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, unquote)]
    #[regex(r"'([^'\\]|\\.)*'", unquote)]
    String(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"#[^\n]*", logos::skip)]
    Comment,
}

/// Strip the quotes of a string literal and resolve backslash escapes
fn unquote(lex: &mut Lexer<Token>) -> String {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Lex code into tokens with spans shifted by `offset`
///
/// Characters that start no token are reported as `Err` with their span.
pub fn lex(input: &str, offset: usize) -> impl Iterator<Item = Result<(Token, Span), Span>> + '_ {
    Token::lexer(input).spanned().map(move |(tok, span)| {
        let span = (span.start + offset)..(span.end + offset);
        tok.map(|t| (t, span.clone())).map_err(|_| span)
    })
}
