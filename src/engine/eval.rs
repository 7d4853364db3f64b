//! Expression evaluation and argument binding

use crate::error::TemplateError;
use crate::params::{ParamTable, Value};
use crate::parser::ast::{Argument, BinaryOp, Builtin, Expr, Spanned};

use super::context::RenderContext;

/// Evaluate an expression against the active parameters
pub fn evaluate(expr: &Spanned<Expr>, ctx: &RenderContext) -> Result<Value, TemplateError> {
    match &expr.node {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => ctx
            .lookup(name)
            .ok_or_else(|| TemplateError::UnresolvedReference {
                name: name.clone(),
                template: ctx.template.clone(),
            }),
        Expr::Not(inner) => Ok(Value::Bool(!evaluate(inner, ctx)?.is_truthy())),
        Expr::Neg(inner) => match evaluate(inner, ctx)? {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(TemplateError::InvalidOperation {
                template: ctx.template.clone(),
                message: format!("cannot negate {}", other.kind()),
            }),
        },
        Expr::Binary { op, left, right } => {
            // Short-circuit operators return the deciding operand
            match op {
                BinaryOp::And => {
                    let lhs = evaluate(left, ctx)?;
                    if !lhs.is_truthy() {
                        return Ok(lhs);
                    }
                    evaluate(right, ctx)
                }
                BinaryOp::Or => {
                    let lhs = evaluate(left, ctx)?;
                    if lhs.is_truthy() {
                        return Ok(lhs);
                    }
                    evaluate(right, ctx)
                }
                _ => {
                    let lhs = evaluate(left, ctx)?;
                    let rhs = evaluate(right, ctx)?;
                    apply(*op, lhs, rhs, ctx)
                }
            }
        }
        Expr::Call { function, args } => call(*function, args, ctx),
    }
}

fn apply(op: BinaryOp, lhs: Value, rhs: Value, ctx: &RenderContext) -> Result<Value, TemplateError> {
    let invalid = |lhs: &Value, rhs: &Value, what: &str| TemplateError::InvalidOperation {
        template: ctx.template.clone(),
        message: format!("cannot {} {} and {}", what, lhs.kind(), rhs.kind()),
    };

    match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Markup(a), Value::Markup(b)) => Ok(Value::Markup(format!("{}{}", a, b))),
            (Value::List(a), Value::List(b)) => {
                Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => match (lhs.as_text(), rhs.as_text()) {
                (Some(a), Some(b)) => Ok(Value::Str(format!("{}{}", a, b))),
                _ => Err(invalid(&lhs, &rhs, "add")),
            },
        },
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                _ => match (lhs.as_text(), rhs.as_text()) {
                    (Some(a), Some(b)) => Some(a.cmp(b)),
                    _ => None,
                },
            };
            let ordering = ordering.ok_or_else(|| invalid(&lhs, &rhs, "compare"))?;
            let result = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::LtEq => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::In => match &rhs {
            Value::List(items) => Ok(Value::Bool(items.iter().any(|item| values_equal(item, &lhs)))),
            _ => match (lhs.as_text(), rhs.as_text()) {
                (Some(needle), Some(haystack)) => Ok(Value::Bool(haystack.contains(needle))),
                _ => Err(invalid(&lhs, &rhs, "test membership of")),
            },
        },
        BinaryOp::And => Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
    }
}

/// Equality where strings and markup with the same text are equal
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_text(), b.as_text()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn call(function: Builtin, args: &[Spanned<Expr>], ctx: &RenderContext) -> Result<Value, TemplateError> {
    let name_arg = |index: usize| -> Result<String, TemplateError> {
        let arg = args.get(index).ok_or_else(|| TemplateError::InvalidOperation {
            template: ctx.template.clone(),
            message: format!("{:?} expects a parameter name", function).to_lowercase(),
        })?;
        match evaluate(arg, ctx)? {
            Value::Str(s) => Ok(s),
            other => Err(TemplateError::InvalidOperation {
                template: ctx.template.clone(),
                message: format!("parameter name must be a string, got {}", other.kind()),
            }),
        }
    };

    match function {
        Builtin::Defined => Ok(Value::Bool(ctx.is_defined(&name_arg(0)?))),
        Builtin::Get => {
            let name = name_arg(0)?;
            match ctx.lookup(&name) {
                Some(value) => Ok(value),
                None => match args.get(1) {
                    Some(default) => evaluate(default, ctx),
                    None => Ok(Value::Str(String::new())),
                },
            }
        }
    }
}

/// Evaluate directive arguments into a parameter table
pub fn bind_arguments(args: &[Argument], ctx: &RenderContext) -> Result<ParamTable, TemplateError> {
    let mut table = ParamTable::new();
    for arg in args {
        table.insert(arg.name.node.clone(), evaluate(&arg.value, ctx)?);
    }
    Ok(table)
}
