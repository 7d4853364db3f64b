//! Configuration for the composition engine

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::params::ParamTable;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration options for rendering
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum rebase chain length and include nesting depth
    pub max_depth: usize,

    /// Name under which a layout sees the content of the template it wraps
    pub content_name: String,

    /// Escape `& < > " '` in substituted values that are not markup
    pub escape_html: bool,

    /// File extensions picked up when loading a template directory
    pub extensions: Vec<String>,

    /// Directory templates are loaded from
    pub template_dir: Option<PathBuf>,

    /// Values visible to every template, below all other parameters
    pub globals: ParamTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            content_name: "content".to_string(),
            escape_html: true,
            extensions: vec!["tpl".to_string(), "html".to_string()],
            template_dir: None,
            globals: ParamTable::new(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep their defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the name of the child content injection point
    pub fn with_content_name(mut self, name: impl Into<String>) -> Self {
        self.content_name = name.into();
        self
    }

    /// Enable or disable HTML escaping of substitutions
    pub fn with_escape_html(mut self, escape: bool) -> Self {
        self.escape_html = escape;
        self
    }

    /// Set the template directory
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Set the global parameter values
    pub fn with_globals(mut self, globals: ParamTable) -> Self {
        self.globals = globals;
        self
    }
}
