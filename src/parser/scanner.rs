//! Splits template source into literal text, substitutions and code
//!
//! Directive markers:
//! - `{{ expr }}` and `{{! expr }}` anywhere in a line
//! - a line starting with `%` (leading blanks allowed) is one code statement;
//!   `%%` at that position is an escaped literal `%`
//! - `<%` at line start opens a block of code statements closed by `%>`
//!
//! Code lines consume their line terminator so directives leave no blank
//! lines behind in the output.

use crate::error::SyntaxError;
use crate::parser::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Substitution { expr: Span, raw: bool },
    Code(Span),
}

/// Scan a whole template source into segments
pub fn scan(source: &str) -> Result<Vec<Segment>, Vec<SyntaxError>> {
    let mut segments = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let line_end = source[pos..]
            .find('\n')
            .map(|i| pos + i + 1)
            .unwrap_or(source.len());
        let line = &source[pos..line_end];
        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        let rest = &line[indent..];

        if rest.starts_with("%%") {
            // Escaped percent: drop one of the two
            let mut text = String::with_capacity(line.len());
            text.push_str(&line[..indent]);
            scan_inline(&rest[1..], pos + indent + 1, &mut text, &mut segments, &mut errors);
            push_text(&mut segments, text);
            pos = line_end;
        } else if rest.starts_with('%') {
            let start = pos + indent + 1;
            let end = trim_newline(source, start, line_end);
            segments.push(Segment::Code(start..end));
            pos = line_end;
        } else if rest.starts_with("<%") {
            let body_start = pos + indent + 2;
            match source[body_start..].find("%>") {
                Some(i) => {
                    let body_end = body_start + i;
                    push_block_statements(source, body_start, body_end, &mut segments);
                    pos = body_end + 2;
                    // A block ending its line swallows the line break
                    let after = &source[pos..];
                    let blank = after.len() - after.trim_start_matches([' ', '\t']).len();
                    if after[blank..].starts_with("\r\n") {
                        pos += blank + 2;
                    } else if after[blank..].starts_with('\n') {
                        pos += blank + 1;
                    }
                }
                None => {
                    errors.push(SyntaxError::new(
                        (pos + indent)..(pos + indent + 2),
                        "unclosed code block, expected '%>'",
                    ));
                    pos = source.len();
                }
            }
        } else {
            let mut text = String::with_capacity(line.len());
            scan_inline(line, pos, &mut text, &mut segments, &mut errors);
            push_text(&mut segments, text);
            pos = line_end;
        }
    }

    if errors.is_empty() {
        Ok(segments)
    } else {
        Err(errors)
    }
}

/// End of a code line, excluding its line terminator
fn trim_newline(source: &str, start: usize, line_end: usize) -> usize {
    let line = &source[start..line_end];
    start + line.trim_end_matches(['\n', '\r']).len()
}

/// Push every non-blank line of a `<% %>` body as a code segment
fn push_block_statements(source: &str, start: usize, end: usize, segments: &mut Vec<Segment>) {
    let mut line_start = start;
    for line in source[start..end].split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if !content.trim().is_empty() {
            segments.push(Segment::Code(line_start..line_start + content.len()));
        }
        line_start += line.len();
    }
}

/// Scan one line of literal text for `{{ }}` substitutions
///
/// Text is accumulated into `text`, which is flushed before each
/// substitution. `offset` is the position of `line` in the source.
fn scan_inline(
    line: &str,
    offset: usize,
    text: &mut String,
    segments: &mut Vec<Segment>,
    errors: &mut Vec<SyntaxError>,
) {
    let mut cursor = 0;
    while let Some(open) = line[cursor..].find("{{") {
        let open = cursor + open;
        text.push_str(&line[cursor..open]);

        let body_start = open + 2;
        let Some(close) = line[body_start..].find("}}") else {
            errors.push(SyntaxError::new(
                (offset + open)..(offset + open + 2),
                "unclosed substitution, expected '}}'",
            ));
            return;
        };
        let close = body_start + close;

        let (raw, expr_start) = if line[body_start..close].starts_with('!') {
            (true, body_start + 1)
        } else {
            (false, body_start)
        };

        push_text(segments, std::mem::take(text));
        segments.push(Segment::Substitution {
            expr: (offset + expr_start)..(offset + close),
            raw,
        });
        cursor = close + 2;
    }
    text.push_str(&line[cursor..]);
}

fn push_text(segments: &mut Vec<Segment>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(prev)) = segments.last_mut() {
        prev.push_str(&text);
    } else {
        segments.push(Segment::Text(text));
    }
}
