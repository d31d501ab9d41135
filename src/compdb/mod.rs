//! Compilation databases: the compiler invocation used for each source file.
//!
//! A database is either read from `compile_commands.json` in a build
//! directory or fixed on the command line after `--`. Every input file must
//! have an entry; a missing one stops the run.

pub mod args;
pub mod loader;
pub mod schema;

pub use args::split_command_line;
pub use loader::{
    CompilationDatabase, CompilationDatabaseError, FixedCompilationDatabase,
    JsonCompilationDatabase, COMPILE_COMMANDS_FILE,
};
pub use schema::CompileCommand;
