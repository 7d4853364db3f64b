//! Template compiler: scanner, code lexer, grammar and block assembly

pub mod ast;
mod compile;
mod grammar;
pub mod lexer;
mod scanner;

pub use ast::*;
pub use compile::compile;
