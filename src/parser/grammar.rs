//! Expression and statement grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::SyntaxError;
use crate::params::Value;
use crate::parser::ast::*;
use crate::parser::lexer::{lex, Token};

/// Parse one code statement located at `span` in `source`
///
/// Code holding nothing but a comment yields `Ok(None)`.
pub fn parse_statement(source: &str, span: Span) -> Result<Option<Statement>, Vec<SyntaxError>> {
    let tokens = tokenize(source, span.clone())?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let len = span.end;

    // Turn the token list into a stream that chumsky can use
    let token_stream = Stream::from_iter(tokens)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    statement_parser()
        .parse(token_stream)
        .into_result()
        .map(Some)
        .map_err(|errs| errs.into_iter().map(SyntaxError::from).collect())
}

/// Parse the body of a `{{ }}` substitution located at `span` in `source`
pub fn parse_expression(source: &str, span: Span) -> Result<Spanned<Expr>, Vec<SyntaxError>> {
    let tokens = tokenize(source, span.clone())?;
    if tokens.is_empty() {
        return Err(vec![SyntaxError::new(span, "empty substitution")]);
    }
    let len = span.end;

    let token_stream = Stream::from_iter(tokens)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(SyntaxError::from).collect())
}

/// Lex the code at `span`, keeping absolute spans
fn tokenize(source: &str, span: Span) -> Result<Vec<(Token, SimpleSpan)>, Vec<SyntaxError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for item in lex(&source[span.clone()], span.start) {
        match item {
            Ok((tok, s)) => tokens.push((tok, SimpleSpan::from(s))),
            Err(s) => errors.push(SyntaxError::new(s, "unexpected character")),
        }
    }
    check_calls(&tokens, &mut errors);
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Report every identifier applied like a function that is not a builtin
fn check_calls(tokens: &[(Token, SimpleSpan)], errors: &mut Vec<SyntaxError>) {
    for pair in tokens.windows(2) {
        if let [(Token::Ident(name), span), (Token::ParenOpen, _)] = pair {
            if Builtin::from_name(name).is_none() {
                errors.push(SyntaxError::new(
                    span_range(span),
                    format!("unknown function '{}'", name),
                ));
            }
        }
    }
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn binary(op: BinaryOp, left: Spanned<Expr>, right: Spanned<Expr>) -> Spanned<Expr> {
    let span = left.span.start..right.span.end;
    Spanned::new(
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::String(s) => Expr::Literal(Value::Str(s)),
            Token::Number(n) => Expr::Literal(Value::Number(n)),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
        };

        let name = select! { Token::Ident(s) => s };

        // Helper call: defined('x'), get('x', default)
        let call = name
            .clone()
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .allow_trailing()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            )
            .try_map(|(function, args), span| match Builtin::from_name(&function) {
                Some(function) => Ok(Expr::Call { function, args }),
                None => Err(Rich::custom(span, format!("unknown function '{}'", function))),
            });

        let atom = choice((
            literal,
            call,
            name.map(Expr::Var),
            expr.clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
                .map(|e: Spanned<Expr>| e.node),
        ))
        .map_with(|node, e| Spanned::new(node, span_range(&e.span())));

        let unary = recursive(|unary| {
            let not = just(Token::Not)
                .ignore_then(unary.clone())
                .map_with(|inner: Spanned<Expr>, e| {
                    Spanned::new(Expr::Not(Box::new(inner)), span_range(&e.span()))
                });
            let neg = just(Token::Minus)
                .ignore_then(unary)
                .map_with(|inner: Spanned<Expr>, e| {
                    Spanned::new(Expr::Neg(Box::new(inner)), span_range(&e.span()))
                });
            choice((not, neg, atom))
        });

        let sum = unary
            .clone()
            .then(
                just(Token::Plus)
                    .ignore_then(unary)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |lhs, rhs| binary(BinaryOp::Add, lhs, rhs))
            });

        let comparison_op = select! {
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Less => BinaryOp::Lt,
            Token::LessOrEqual => BinaryOp::LtEq,
            Token::Greater => BinaryOp::Gt,
            Token::GreaterOrEqual => BinaryOp::GtEq,
            Token::In => BinaryOp::In,
        };

        let comparison = sum
            .clone()
            .then(comparison_op.then(sum).repeated().collect::<Vec<_>>())
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |lhs, (op, rhs)| binary(op, lhs, rhs))
            });

        let conjunction = comparison
            .clone()
            .then(
                just(Token::And)
                    .ignore_then(comparison)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |lhs, rhs| binary(BinaryOp::And, lhs, rhs))
            });

        conjunction
            .clone()
            .then(
                just(Token::Or)
                    .ignore_then(conjunction)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |lhs, rhs| binary(BinaryOp::Or, lhs, rhs))
            })
            .boxed()
    })
}

fn statement_parser<'a, I>() -> impl Parser<'a, I, Statement, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let expr = expression_parser();

    let identifier = select! { Token::Ident(s) => s }
        .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    let string_literal = select! { Token::String(s) => s }
        .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    // Named argument: key=expr
    let argument = identifier
        .clone()
        .then_ignore(just(Token::Equals))
        .then(expr.clone())
        .map(|(name, value)| Argument { name, value });

    // ('target', key=expr, ...)
    let directive = string_literal
        .clone()
        .then(
            just(Token::Comma)
                .ignore_then(argument)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(Token::Comma).or_not())
        .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
        .map(|(target, args)| Directive { target, args });

    let rebase = just(Token::Rebase)
        .ignore_then(directive.clone())
        .map(Statement::Rebase);

    let include = just(Token::Include)
        .ignore_then(directive)
        .map(Statement::Include);

    let set_default = just(Token::SetDefault)
        .ignore_then(
            string_literal
                .then_ignore(just(Token::Comma))
                .then(expr.clone())
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        )
        .map(|(name, value)| Statement::SetDefault { name, value });

    let colon = just(Token::Colon).or_not();

    let if_stmt = just(Token::If)
        .ignore_then(expr.clone())
        .then_ignore(colon.clone())
        .map(Statement::If);

    let elif_stmt = just(Token::Elif)
        .ignore_then(expr.clone())
        .then_ignore(colon.clone())
        .map(Statement::Elif);

    let else_stmt = just(Token::Else).then_ignore(colon.clone()).to(Statement::Else);

    let for_stmt = just(Token::For)
        .ignore_then(identifier)
        .then_ignore(just(Token::In))
        .then(expr)
        .then_ignore(colon)
        .map(|(var, iterable)| Statement::For { var, iterable });

    let end_stmt = just(Token::End).to(Statement::End);

    choice((
        rebase,
        include,
        set_default,
        if_stmt,
        elif_stmt,
        else_stmt,
        for_stmt,
        end_stmt,
    ))
    .then_ignore(end())
}
