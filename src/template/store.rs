//! Fragment store: registered template sources and their compiled forms

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::TemplateError;
use crate::parser::{compile, CompiledTemplate};

/// A registered template
#[derive(Debug)]
pub struct Template {
    id: String,
    source: Arc<str>,
    /// Compiled lazily on first render
    compiled: OnceLock<Arc<CompiledTemplate>>,
}

impl Template {
    pub fn new(id: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            compiled: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the source has been compiled already
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// The compiled node sequence, compiling on first use
    ///
    /// Concurrent first calls may each compile; the first stored result wins
    /// and every caller gets that same entry.
    pub fn compiled(&self) -> Result<Arc<CompiledTemplate>, TemplateError> {
        if let Some(compiled) = self.compiled.get() {
            tracing::trace!(template = %self.id, "compiled template cache hit");
            return Ok(Arc::clone(compiled));
        }

        let compiled = compile(&self.source).map_err(|errors| TemplateError::Malformed {
            template: self.id.clone(),
            errors,
        })?;
        tracing::debug!(
            template = %self.id,
            nodes = compiled.nodes.len(),
            parent = compiled.parent().unwrap_or("-"),
            "compiled template"
        );

        Ok(Arc::clone(self.compiled.get_or_init(|| Arc::new(compiled))))
    }
}

/// Store of named templates, shared by every render of a [`crate::Renderer`]
#[derive(Debug, Default)]
pub struct FragmentStore {
    templates: RwLock<HashMap<String, Arc<Template>>>,
}

impl FragmentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register template source under `id`
    ///
    /// Registering the same source again keeps the compiled form; a different
    /// source replaces the entry. Returns true if the stored source changed.
    pub fn register(&self, id: impl Into<String>, source: impl Into<String>) -> bool {
        let id = id.into();
        let source = source.into();
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = templates.get(&id) {
            if existing.source() == source {
                return false;
            }
        }

        tracing::debug!(template = %id, bytes = source.len(), "registered template");
        let template = Arc::new(Template::new(id.clone(), source));
        templates.insert(id, template);
        true
    }

    /// Look up a template by identifier
    pub fn resolve(&self, id: &str) -> Result<Arc<Template>, TemplateError> {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        templates
            .get(id)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound { id: id.to_string() })
    }

    /// Raw source of a registered template
    pub fn source(&self, id: &str) -> Option<Arc<str>> {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        templates.get(id).map(|t| Arc::clone(&t.source))
    }

    /// Check if a template exists
    pub fn contains(&self, id: &str) -> bool {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        templates.contains_key(id)
    }

    /// Remove a template, returning whether it was registered
    pub fn remove(&self, id: &str) -> bool {
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        templates.remove(id).is_some()
    }

    /// All registered identifiers, sorted
    pub fn ids(&self) -> Vec<String> {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = templates.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
