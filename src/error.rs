//! Error types for compiling and rendering templates

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A structural or syntax problem in one template source
#[derive(Error, Debug, Clone, PartialEq)]
#[error("syntax error at {span:?}: {message}")]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
    pub expected: Vec<String>,
}

impl SyntaxError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let expected_str = if self.expected.is_empty() {
            String::new()
        } else {
            format!("\nExpected: {}", self.expected.join(", "))
        };

        let written = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.clone()))
                    .with_message(format!("{}{}", self.message, expected_str))
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Errors surfaced by the store, compiler and composition engine
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template registered under the identifier
    #[error("template not found: {id}")]
    NotFound { id: String },

    /// Invalid directive usage or syntax
    #[error("malformed template {template}: {}", format_syntax_errors(.errors))]
    Malformed {
        template: String,
        errors: Vec<SyntaxError>,
    },

    /// A substitution names a parameter that is not bound
    #[error("unresolved reference '{name}' in template {template}")]
    UnresolvedReference { name: String, template: String },

    /// Rebase or include nesting beyond the configured limit
    #[error("template nesting exceeds depth {limit}: {chain}")]
    TemplateCycle { chain: String, limit: usize },

    /// An operation applied to values of the wrong kind
    #[error("invalid operation in template {template}: {message}")]
    InvalidOperation { template: String, message: String },

    /// Error reading a template file
    #[error("error reading template file {path}: {message}")]
    Load { path: PathBuf, message: String },
}

fn format_syntax_errors(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for SyntaxError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use chumsky::error::{RichPattern, RichReason};

        #[allow(unreachable_patterns)]
        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("Unexpected {}", format_token(tok)),
                None => "Unexpected end of directive".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
            _ => "Invalid syntax".to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of directive".to_string()),
                _ => None,
            })
            .collect();

        SyntaxError {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string '{}'", s),
        Token::Number(n) => format!("number {}", n),
        Token::Rebase => "keyword 'rebase'".to_string(),
        Token::Include => "keyword 'include'".to_string(),
        Token::SetDefault => "keyword 'setdefault'".to_string(),
        Token::If => "keyword 'if'".to_string(),
        Token::Elif => "keyword 'elif'".to_string(),
        Token::Else => "keyword 'else'".to_string(),
        Token::For => "keyword 'for'".to_string(),
        Token::In => "keyword 'in'".to_string(),
        Token::End => "keyword 'end'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Equals => "'='".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::And => "keyword 'and'".to_string(),
        Token::Or => "keyword 'or'".to_string(),
        Token::Not => "keyword 'not'".to_string(),
        _ => format!("{:?}", tok),
    }
}
