//! Fragment Composer - template inheritance for server-rendered pages
//!
//! Page fragments declare the layout they belong in with a `rebase`
//! directive; the engine renders the fragment first and injects its output
//! into the layout, which can itself be rebased into a further layout.
//!
//! # Example
//!
//! ```rust
//! use fragment_composer::{ParamTable, Renderer};
//!
//! let renderer = Renderer::default();
//! renderer.register(
//!     "master",
//!     "<html><title>{{title}}</title><body>{{content}}</body></html>",
//! );
//! renderer.register("page", "% rebase('master', title='Hello')\n<p>Hi</p>");
//!
//! let html = renderer.render("page", &ParamTable::new()).unwrap();
//! assert_eq!(html, "<html><title>Hello</title><body><p>Hi</p></body></html>");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod parser;
pub mod renderer;
pub mod template;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Composer, Execution};
pub use error::{SyntaxError, TemplateError};
pub use params::{ParamTable, Value};
pub use parser::compile;
pub use renderer::Renderer;
pub use template::{FragmentStore, Template};
