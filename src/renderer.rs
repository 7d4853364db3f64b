//! Top-level render entry point

use std::path::Path;

use crate::config::EngineConfig;
use crate::engine::Composer;
use crate::error::TemplateError;
use crate::params::ParamTable;
use crate::template::{load_dir, FragmentStore};

/// Owns a fragment store and a configuration and renders documents from them
///
/// Independent renderers do not share templates or cached compilations. A
/// renderer is `Send + Sync`; share it behind an `Arc` to render from several
/// threads.
#[derive(Debug, Default)]
pub struct Renderer {
    store: FragmentStore,
    config: EngineConfig,
}

impl Renderer {
    /// Create a renderer with an empty store
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(FragmentStore::new(), config)
    }

    /// Create a renderer around an existing store
    pub fn with_store(store: FragmentStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &FragmentStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register template source under `id`
    pub fn register(&self, id: impl Into<String>, source: impl Into<String>) -> bool {
        self.store.register(id, source)
    }

    /// Register all templates under `dir` with a configured extension
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<String>, TemplateError> {
        load_dir(&self.store, dir, &self.config.extensions)
    }

    /// Render the template `id` with `params`, following its rebase chain
    pub fn render(&self, id: &str, params: &ParamTable) -> Result<String, TemplateError> {
        tracing::trace!(template = %id, params = params.len(), "render");
        Composer::new(&self.store, &self.config).render(id, params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_registered_template() {
        let renderer = Renderer::default();
        renderer.register("hello", "Hello {{ name }}!");
        let out = renderer
            .render("hello", &ParamTable::new().with("name", "translator"))
            .expect("Should render");
        assert_eq!(out, "Hello translator!");
    }

    #[test]
    fn test_renderers_are_independent() {
        let first = Renderer::default();
        let second = Renderer::default();
        first.register("page", "first");
        second.register("page", "second");
        assert_eq!(first.render("page", &ParamTable::new()).expect("Should render"), "first");
        assert_eq!(second.render("page", &ParamTable::new()).expect("Should render"), "second");
    }

    #[test]
    fn test_renderer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Renderer>();
    }
}
