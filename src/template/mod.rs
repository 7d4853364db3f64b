//! Template storage and loading
//!
//! Templates are registered by identifier into a [`FragmentStore`], either one
//! at a time or by loading a directory. The store owns the compiled form of
//! each template, so a source compiles once no matter how often it renders.
//!
//! # Example
//!
//! ```rust
//! use fragment_composer::template::FragmentStore;
//!
//! let store = FragmentStore::new();
//! store.register("master", "<title>{{title}}</title>{{content}}");
//! assert!(store.contains("master"));
//! ```

mod loader;
mod store;

pub use loader::load_dir;
pub use store::{FragmentStore, Template};
