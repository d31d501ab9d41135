//! Tree-sitter integration for C and C++ sources.
//!
//! This module is the parsing collaborator of the rewriter: it turns a file
//! and its compile command into a [`ParsedUnit`] that implements
//! [`TranslationUnit`](crate::source::TranslationUnit), and walks the tree to
//! find every function declaration and definition.

pub mod errors;
pub mod parser;
pub mod validator;
pub mod walker;

pub use errors::ParseError;
pub use parser::{parse_file, CxxParser, Dialect, ParsedUnit};
pub use validator::validate_rewrite;
pub use walker::collect_functions;
