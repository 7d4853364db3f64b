//! Per-template render state

use crate::params::{ParamTable, Value};

/// A rebase directive recorded while executing a template
#[derive(Debug, Clone, PartialEq)]
pub struct RebaseRequest {
    /// Identifier of the parent layout
    pub parent: String,
    /// Directive arguments, already evaluated
    pub args: ParamTable,
}

/// State for executing one template
///
/// Created for each template in a rebase chain or include and dropped when it
/// finishes.
#[derive(Debug)]
pub struct RenderContext<'g> {
    /// Template being executed, for error messages
    pub template: String,
    /// Active parameters; `setdefault` writes here
    pub params: ParamTable,
    /// Lowest-precedence values from the engine configuration
    globals: &'g ParamTable,
    /// Loop variables, innermost last
    scopes: Vec<(String, Value)>,
    /// Rendered output of the child this template wraps
    child_content: Option<String>,
    content_name: &'g str,
    /// Rebase/include nesting of this template
    pub depth: usize,
    pub output: String,
    pub rebase: Option<RebaseRequest>,
}

impl<'g> RenderContext<'g> {
    pub fn new(
        template: impl Into<String>,
        params: ParamTable,
        globals: &'g ParamTable,
        content_name: &'g str,
    ) -> Self {
        Self {
            template: template.into(),
            params,
            globals,
            scopes: Vec::new(),
            child_content: None,
            content_name,
            depth: 0,
            output: String::new(),
            rebase: None,
        }
    }

    /// Set the nesting depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Fill the child content slot
    pub fn with_child_content(mut self, content: Option<String>) -> Self {
        self.child_content = content;
        self
    }

    /// Look up a name: loop variables, child content, parameters, globals
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some((_, value)) = self.scopes.iter().rev().find(|(n, _)| n == name) {
            return Some(value.clone());
        }
        if name == self.content_name {
            if let Some(content) = &self.child_content {
                return Some(Value::Markup(content.clone()));
            }
        }
        self.params
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Bind a loop variable for the duration of one iteration
    pub fn push_scope(&mut self, name: &str, value: Value) {
        self.scopes.push((name.to_string(), value));
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Parameters visible to a template rendered from this one
    ///
    /// Loop variables in scope are included, so an include inside a `for`
    /// block sees the current item.
    pub fn visible_params(&self) -> ParamTable {
        let mut params = self.params.clone();
        for (name, value) in &self.scopes {
            params.insert(name.clone(), value.clone());
        }
        params
    }
}
