//! Composition engine
//!
//! Executes compiled templates and composes rebase chains. A template that
//! declares `rebase('parent', ...)` renders its own body first; that output
//! then fills the content slot of the parent, which renders next with the
//! child's parameters overlaid by the directive arguments. The chain is an
//! explicit loop bounded by [`EngineConfig::max_depth`].

mod context;
mod eval;

pub use context::{RebaseRequest, RenderContext};
pub use eval::{bind_arguments, evaluate};

use crate::config::EngineConfig;
use crate::error::TemplateError;
use crate::params::{ParamTable, Value};
use crate::parser::ast::Node;
use crate::template::{FragmentStore, Template};

/// Result of executing one template in isolation
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Rendered body of the template
    pub output: String,
    /// Rebase recorded while executing, if the template declared one
    pub rebase: Option<RebaseRequest>,
    /// Parameters at the end of execution, including `setdefault` values
    pub params: ParamTable,
}

/// Runs templates from a store under one configuration
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    store: &'a FragmentStore,
    config: &'a EngineConfig,
}

impl<'a> Composer<'a> {
    pub fn new(store: &'a FragmentStore, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Execute a single template without following its rebase request
    pub fn execute(&self, template: &Template, params: ParamTable) -> Result<Execution, TemplateError> {
        self.execute_with(template, params, None, &[template.id().to_string()], 0)
    }

    /// Render a template and every layout it is rebased into
    pub fn render(&self, id: &str, params: ParamTable) -> Result<String, TemplateError> {
        self.render_at(id, params, &[], 0)
    }

    /// Render `id` at include nesting `depth`; `trail` names the includers
    fn render_at(
        &self,
        id: &str,
        params: ParamTable,
        trail: &[String],
        depth: usize,
    ) -> Result<String, TemplateError> {
        let mut chain: Vec<String> = trail.to_vec();
        chain.push(id.to_string());

        if depth > self.config.max_depth {
            return Err(self.cycle_error(&chain));
        }

        let mut template = self.store.resolve(id)?;
        let mut params = params;
        let mut child_content = None;
        let mut hops = 0;

        loop {
            let execution = self.execute_with(&template, params, child_content, &chain, depth)?;
            let Some(request) = execution.rebase else {
                return Ok(execution.output);
            };

            hops += 1;
            chain.push(request.parent.clone());
            if hops > self.config.max_depth {
                return Err(self.cycle_error(&chain));
            }

            tracing::debug!(
                child = %template.id(),
                parent = %request.parent,
                hops,
                "rebasing template"
            );

            template = self.store.resolve(&request.parent)?;
            params = execution.params.overlay(request.args);
            child_content = Some(execution.output);
        }
    }

    fn execute_with(
        &self,
        template: &Template,
        params: ParamTable,
        child_content: Option<String>,
        chain: &[String],
        depth: usize,
    ) -> Result<Execution, TemplateError> {
        let compiled = template.compiled()?;
        let mut ctx = RenderContext::new(
            template.id(),
            params,
            &self.config.globals,
            &self.config.content_name,
        )
        .with_child_content(child_content)
        .with_depth(depth);

        self.walk(&compiled.nodes, &mut ctx, chain)?;

        Ok(Execution {
            output: ctx.output,
            rebase: ctx.rebase,
            params: ctx.params,
        })
    }

    fn walk(&self, nodes: &[Node], ctx: &mut RenderContext<'_>, chain: &[String]) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Literal(text) => ctx.output.push_str(text),
                Node::Substitution { expr, raw } => {
                    let value = evaluate(expr, ctx)?;
                    self.emit(&value, *raw, &mut ctx.output);
                }
                Node::Rebase(directive) => {
                    let args = bind_arguments(&directive.args, ctx)?;
                    ctx.rebase = Some(RebaseRequest {
                        parent: directive.target.node.clone(),
                        args,
                    });
                }
                Node::Include(directive) => {
                    let args = bind_arguments(&directive.args, ctx)?;
                    let params = ctx.visible_params().overlay(args);
                    tracing::debug!(
                        template = %ctx.template,
                        include = %directive.target.node,
                        "including template"
                    );
                    let output = self.render_at(&directive.target.node, params, chain, ctx.depth + 1)?;
                    ctx.output.push_str(&output);
                }
                Node::SetDefault { name, value } => {
                    if !ctx.params.contains(name) {
                        let value = evaluate(value, ctx)?;
                        ctx.params.insert(name.clone(), value);
                    }
                }
                Node::If { branches, otherwise } => {
                    let mut taken = None;
                    for branch in branches {
                        if evaluate(&branch.condition, ctx)?.is_truthy() {
                            taken = Some(&branch.body);
                            break;
                        }
                    }
                    if let Some(body) = taken.or(otherwise.as_ref()) {
                        self.walk(body, ctx, chain)?;
                    }
                }
                Node::For { var, iterable, body } => {
                    let items = match evaluate(iterable, ctx)? {
                        Value::List(items) => items,
                        Value::Str(s) | Value::Markup(s) => {
                            s.chars().map(|c| Value::Str(c.to_string())).collect()
                        }
                        other => {
                            return Err(TemplateError::InvalidOperation {
                                template: ctx.template.clone(),
                                message: format!("cannot iterate over {}", other.kind()),
                            })
                        }
                    };
                    for item in items {
                        ctx.push_scope(var, item);
                        let result = self.walk(body, ctx, chain);
                        ctx.pop_scope();
                        result?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Append a substituted value, escaping unless raw or markup
    fn emit(&self, value: &Value, raw: bool, out: &mut String) {
        let text = value.to_string();
        if raw || value.is_markup() || !self.config.escape_html {
            out.push_str(&text);
        } else {
            escape_html(&text, out);
        }
    }

    fn cycle_error(&self, chain: &[String]) -> TemplateError {
        TemplateError::TemplateCycle {
            chain: chain.join(" -> "),
            limit: self.config.max_depth,
        }
    }
}

fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
}
