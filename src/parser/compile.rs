//! Block assembly: turns scanned segments into a nested node sequence

use crate::error::SyntaxError;
use crate::parser::ast::*;
use crate::parser::grammar::{parse_expression, parse_statement};
use crate::parser::scanner::{scan, Segment};

/// An open block while assembling
enum Frame {
    Root,
    If {
        opened: Span,
        done: Vec<Branch>,
        condition: Spanned<Expr>,
        in_else: bool,
    },
    For {
        opened: Span,
        var: String,
        iterable: Spanned<Expr>,
    },
}

struct Builder {
    /// Open frames with the nodes collected so far, innermost last
    stack: Vec<(Frame, Vec<Node>)>,
    rebase: Option<Span>,
    errors: Vec<SyntaxError>,
}

impl Builder {
    fn new() -> Self {
        Self {
            stack: vec![(Frame::Root, Vec::new())],
            rebase: None,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, node: Node) {
        if let Some((_, nodes)) = self.stack.last_mut() {
            nodes.push(node);
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.errors.push(SyntaxError::new(span, message));
    }

    fn statement(&mut self, stmt: Statement, span: Span) {
        match stmt {
            Statement::Rebase(directive) => {
                if let Some(first) = &self.rebase {
                    let message = format!(
                        "duplicate rebase directive, first declared at {}..{}",
                        first.start, first.end
                    );
                    self.error(span, message);
                    return;
                }
                if self.stack.len() > 1 {
                    self.error(span, "rebase must appear at top level, not inside a block");
                    return;
                }
                self.rebase = Some(span);
                self.push(Node::Rebase(directive));
            }
            Statement::Include(directive) => self.push(Node::Include(directive)),
            Statement::SetDefault { name, value } => self.push(Node::SetDefault {
                name: name.node,
                value,
            }),
            Statement::If(condition) => self.stack.push((
                Frame::If {
                    opened: span,
                    done: Vec::new(),
                    condition,
                    in_else: false,
                },
                Vec::new(),
            )),
            Statement::For { var, iterable } => self.stack.push((
                Frame::For {
                    opened: span,
                    var: var.node,
                    iterable,
                },
                Vec::new(),
            )),
            Statement::Elif(next) => match self.stack.last_mut() {
                Some((
                    Frame::If {
                        done,
                        condition,
                        in_else: false,
                        ..
                    },
                    nodes,
                )) => {
                    let finished = std::mem::replace(condition, next);
                    done.push(Branch {
                        condition: finished,
                        body: std::mem::take(nodes),
                    });
                }
                Some((Frame::If { in_else: true, .. }, _)) => {
                    self.error(span, "'elif' after 'else'")
                }
                _ => self.error(span, "'elif' without an open 'if' block"),
            },
            Statement::Else => match self.stack.last_mut() {
                Some((
                    Frame::If {
                        done,
                        condition,
                        in_else,
                        ..
                    },
                    nodes,
                )) if !*in_else => {
                    done.push(Branch {
                        condition: condition.clone(),
                        body: std::mem::take(nodes),
                    });
                    *in_else = true;
                }
                Some((Frame::If { .. }, _)) => self.error(span, "duplicate 'else'"),
                _ => self.error(span, "'else' without an open 'if' block"),
            },
            Statement::End => {
                if self.stack.len() == 1 {
                    self.error(span, "'end' without an open block");
                    return;
                }
                if let Some((frame, nodes)) = self.stack.pop() {
                    let node = close_frame(frame, nodes);
                    self.push(node);
                }
            }
        }
    }

    fn finish(mut self) -> Result<CompiledTemplate, Vec<SyntaxError>> {
        while self.stack.len() > 1 {
            if let Some((frame, _)) = self.stack.pop() {
                match frame {
                    Frame::If { opened, .. } => {
                        self.errors.push(SyntaxError::new(opened, "unclosed 'if' block"))
                    }
                    Frame::For { opened, .. } => {
                        self.errors.push(SyntaxError::new(opened, "unclosed 'for' block"))
                    }
                    Frame::Root => {}
                }
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let nodes = self.stack.pop().map(|(_, nodes)| nodes).unwrap_or_default();
        Ok(CompiledTemplate { nodes })
    }
}

fn close_frame(frame: Frame, nodes: Vec<Node>) -> Node {
    match frame {
        Frame::If {
            mut done,
            condition,
            in_else,
            ..
        } => {
            let otherwise = if in_else {
                Some(nodes)
            } else {
                done.push(Branch {
                    condition,
                    body: nodes,
                });
                None
            };
            Node::If {
                branches: done,
                otherwise,
            }
        }
        Frame::For { var, iterable, .. } => Node::For {
            var,
            iterable,
            body: nodes,
        },
        // The root frame is never popped by 'end'
        Frame::Root => Node::Literal(String::new()),
    }
}

/// Compile template source into its node sequence
///
/// All syntax and structure errors in the source are collected. Names used in
/// substitutions are not checked here; they resolve at render time.
pub fn compile(source: &str) -> Result<CompiledTemplate, Vec<SyntaxError>> {
    let segments = scan(source)?;
    let mut builder = Builder::new();

    for segment in segments {
        match segment {
            Segment::Text(text) => {
                if let Some((_, nodes)) = builder.stack.last_mut() {
                    if let Some(Node::Literal(prev)) = nodes.last_mut() {
                        prev.push_str(&text);
                        continue;
                    }
                }
                builder.push(Node::Literal(text));
            }
            Segment::Substitution { expr, raw } => match parse_expression(source, expr) {
                Ok(expr) => builder.push(Node::Substitution { expr, raw }),
                Err(errs) => builder.errors.extend(errs),
            },
            Segment::Code(span) => match parse_statement(source, span.clone()) {
                Ok(Some(stmt)) => builder.statement(stmt, span),
                Ok(None) => {}
                Err(errs) => builder.errors.extend(errs),
            },
        }
    }

    builder.finish()
}
