//! Drive the rewrite over a list of source files.
//!
//! Every file's compile command is looked up before any file is parsed, so a
//! database miss stops the run without computing partial results. Files are
//! then parsed and walked one at a time, threading a single [`EditSet`]
//! through each step.

use crate::compdb::{CompilationDatabase, CompilationDatabaseError, CompileCommand};
use crate::cxx::{collect_functions, parse_file, validate_rewrite, Dialect, ParseError};
use crate::edit::{EditError, EditSet, FileRewrite};
use crate::emit::rewrite_unit;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Database(#[from] CompilationDatabaseError),

    #[error("failed to process {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Edits computed for a run, plus what is needed to save them.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub edits: EditSet,
    /// Dialect each file was parsed as, for re-validation before writing
    pub dialects: BTreeMap<PathBuf, Dialect>,
    /// Number of function declarations and definitions visited
    pub functions_seen: usize,
}

/// Original and rewritten text of one file, computed without writing.
#[derive(Debug)]
pub struct FilePreview {
    pub original: String,
    pub rewrite: FileRewrite,
}

pub struct RewriteTool<'a> {
    database: &'a dyn CompilationDatabase,
    sources: Vec<PathBuf>,
}

impl<'a> RewriteTool<'a> {
    pub fn new(database: &'a dyn CompilationDatabase, sources: Vec<PathBuf>) -> Self {
        Self { database, sources }
    }

    /// Compute the edits for every source file.
    pub fn run(&self) -> Result<RunOutput, ToolError> {
        let commands = self
            .sources
            .iter()
            .map(|source| self.database.require(source))
            .collect::<Result<Vec<CompileCommand>, _>>()?;

        let mut output = RunOutput::default();
        for command in &commands {
            output = process_file(command, output)?;
        }
        Ok(output)
    }
}

/// Parse, walk and classify one file, returning the updated output.
pub fn process_file(
    command: &CompileCommand,
    mut output: RunOutput,
) -> Result<RunOutput, ToolError> {
    let dialect = command.dialect();
    let unit = parse_file(&command.file, dialect).map_err(|source| ToolError::Parse {
        path: command.file.clone(),
        source,
    })?;

    let errors = unit.error_count();
    if errors > 0 {
        warn!(
            file = %command.file.display(),
            errors,
            "file has syntax errors (unexpanded macros?), continuing"
        );
    }

    let functions = collect_functions(&unit);
    let before = output.edits.len();
    output.edits = rewrite_unit(&unit, &functions, output.edits);

    info!(
        file = %command.file.display(),
        %dialect,
        functions = functions.len(),
        edits = output.edits.len() - before,
        "processed"
    );

    output.functions_seen += functions.len();
    output.dialects.insert(command.file.clone(), dialect);
    Ok(output)
}

impl RunOutput {
    /// Rewritten text for every file with edits, without touching disk.
    pub fn preview(&self) -> Vec<(PathBuf, Result<FilePreview, EditError>)> {
        self.edits
            .files()
            .map(|file| (file.to_path_buf(), preview_file(&self.edits, file)))
            .collect()
    }

    /// Write every file's edits. A file whose rewrite parses worse than the
    /// original is left untouched and reported.
    pub fn save(&self) -> Vec<(PathBuf, Result<FileRewrite, EditError>)> {
        self.edits.apply_with(|file, original, rewritten| {
            let dialect = self.dialects.get(file).copied().unwrap_or_default();
            validate_rewrite(dialect, original, rewritten).map_err(|e| EditError::Rejected {
                file: file.to_path_buf(),
                reason: e.to_string(),
            })
        })
    }
}

fn preview_file(edits: &EditSet, file: &Path) -> Result<FilePreview, EditError> {
    let original = fs::read_to_string(file).map_err(|source| EditError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let rewrite = edits.rewrite_in_memory(file, &original)?;
    Ok(FilePreview { original, rewrite })
}
