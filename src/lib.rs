//! remove-void-args: rewrite C/C++ `(void)` parameter lists to `()`
//!
//! Given source files and the compiler invocations that build them, the tool
//! finds zero-parameter functions declared or defined as `f(void)` and
//! produces byte-span edits that turn them into `f()`.
//!
//! # Architecture
//!
//! - [`cxx`] parses a file with tree-sitter and collects its
//!   [`FunctionNode`]s. The parse result implements [`TranslationUnit`], the
//!   only view of the source the rewrite core depends on.
//! - [`extract`] recovers the literal text of a node, giving up when macro
//!   spellings or multi-file spans make that impossible.
//! - [`classify`] decides declaration vs definition, skips `extern "C"`
//!   functions and finds where the declarator ends.
//! - [`emit`] builds the replacement text and records an [`Edit`] in the
//!   process-wide [`EditSet`].
//! - [`edit`] applies an [`EditSet`] to disk, one atomic write per file,
//!   with every offset taken against the original text.
//!
//! Anything that goes wrong for a single function degrades to skipping it.
//! Only a missing or unreadable compilation database, or a file without a
//! compile command, stops a run.
//!
//! # Example
//!
//! ```no_run
//! use remove_void_args::{FixedCompilationDatabase, RewriteTool};
//! use std::path::PathBuf;
//!
//! let db = FixedCompilationDatabase::new(".", vec!["-std=c++17".to_string()]);
//! let output = RewriteTool::new(&db, vec![PathBuf::from("src/main.cpp")]).run()?;
//!
//! for (file, result) in output.save() {
//!     match result {
//!         Ok(rewrite) => println!("{}: {} edits", file.display(), rewrite.applied()),
//!         Err(e) => eprintln!("{}: {}", file.display(), e),
//!     }
//! }
//! # Ok::<(), remove_void_args::ToolError>(())
//! ```

pub mod classify;
pub mod compdb;
pub mod cxx;
pub mod edit;
pub mod emit;
pub mod extract;
pub mod source;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use classify::{classify, Classification, EligibleSpan, SkipReason};
pub use compdb::{
    CompilationDatabase, CompilationDatabaseError, CompileCommand, FixedCompilationDatabase,
    JsonCompilationDatabase,
};
pub use cxx::{collect_functions, parse_file, CxxParser, Dialect, ParseError, ParsedUnit};
pub use edit::{Edit, EditError, EditResult, EditSet, EditVerification, FileRewrite};
pub use emit::{emit, replacement_text, rewrite_unit};
pub use extract::{extract_text, ExtractedText};
pub use source::{FileId, FileLocation, FunctionNode, SourceLocation, SourceSpan, TranslationUnit};
pub use tool::{process_file, FilePreview, RewriteTool, RunOutput, ToolError};
