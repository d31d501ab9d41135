use crate::compdb::args::split_command_line;
use crate::compdb::schema::{normalize, CompileCommand, RawCompileCommand};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name looked up inside a build directory.
pub const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

#[derive(Error, Debug)]
pub enum CompilationDatabaseError {
    #[error("failed to read compilation database {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse compilation database {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("compile command for {file} has neither `arguments` nor `command`")]
    MissingCommand { file: PathBuf },

    #[error("unterminated quote in compile command for {file}")]
    UnterminatedQuote { file: PathBuf },

    #[error("no compile command found for {0}")]
    NotFound(PathBuf),
}

/// Source of compiler invocations, one lookup per input file.
pub trait CompilationDatabase {
    fn compile_command(&self, file: &Path) -> Option<CompileCommand>;

    /// Like [`CompilationDatabase::compile_command`], failing when the file
    /// has no entry.
    fn require(&self, file: &Path) -> Result<CompileCommand, CompilationDatabaseError> {
        self.compile_command(file)
            .ok_or_else(|| CompilationDatabaseError::NotFound(file.to_path_buf()))
    }
}

/// Database read from `compile_commands.json`.
#[derive(Debug, Clone, Default)]
pub struct JsonCompilationDatabase {
    commands: Vec<CompileCommand>,
    /// Directory relative inputs are resolved against
    working_dir: PathBuf,
}

impl JsonCompilationDatabase {
    /// Load `<build_dir>/compile_commands.json`.
    pub fn load_from_directory(build_dir: &Path) -> Result<Self, CompilationDatabaseError> {
        let path = build_dir.join(COMPILE_COMMANDS_FILE);
        let contents = fs::read_to_string(&path).map_err(|source| CompilationDatabaseError::Io {
            path: path.clone(),
            source,
        })?;
        let db = Self::load_from_str(&contents).map_err(|error| match error {
            CompilationDatabaseError::Json { source, .. } => {
                CompilationDatabaseError::Json { path: path.clone(), source }
            }
            other => other,
        })?;
        debug!(path = %path.display(), entries = db.commands.len(), "loaded compilation database");
        Ok(db)
    }

    pub fn load_from_str(json: &str) -> Result<Self, CompilationDatabaseError> {
        let raw: Vec<RawCompileCommand> =
            serde_json::from_str(json).map_err(|source| CompilationDatabaseError::Json {
                path: PathBuf::from(COMPILE_COMMANDS_FILE),
                source,
            })?;

        let commands = raw
            .into_iter()
            .map(CompileCommand::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            commands,
            working_dir: std::env::current_dir().unwrap_or_default(),
        })
    }

    /// Resolve relative input paths against `dir` instead of the process's
    /// current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }
}

impl TryFrom<RawCompileCommand> for CompileCommand {
    type Error = CompilationDatabaseError;

    fn try_from(raw: RawCompileCommand) -> Result<Self, Self::Error> {
        let file = normalize(&raw.file, &raw.directory);
        let arguments = match (raw.arguments, raw.command) {
            (Some(arguments), _) if !arguments.is_empty() => arguments,
            (_, Some(command)) => split_command_line(&command)
                .map_err(|_| CompilationDatabaseError::UnterminatedQuote { file: file.clone() })?,
            _ => return Err(CompilationDatabaseError::MissingCommand { file }),
        };
        if arguments.is_empty() {
            return Err(CompilationDatabaseError::MissingCommand { file });
        }

        Ok(CompileCommand {
            directory: raw.directory,
            file,
            arguments,
            output: raw.output,
        })
    }
}

impl CompilationDatabase for JsonCompilationDatabase {
    /// Exact match on the normalized path first. A relative input that
    /// matches nothing exactly is accepted as a path suffix of exactly one
    /// entry, after stripping leading `./`.
    fn compile_command(&self, file: &Path) -> Option<CompileCommand> {
        let wanted = normalize(file, &self.working_dir);
        if let Some(command) = self.commands.iter().find(|c| c.file == wanted) {
            return Some(command.clone());
        }

        if file.is_absolute() {
            return None;
        }
        let suffix: PathBuf = file
            .components()
            .skip_while(|c| matches!(c, std::path::Component::CurDir))
            .collect();
        if suffix.as_os_str().is_empty() {
            return None;
        }

        let mut candidates = self.commands.iter().filter(|c| c.file.ends_with(&suffix));
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        }
    }
}

/// Database given on the command line after `--`: the same arguments for
/// every file, compiled from the current directory.
#[derive(Debug, Clone)]
pub struct FixedCompilationDatabase {
    directory: PathBuf,
    arguments: Vec<String>,
}

impl FixedCompilationDatabase {
    /// Driver name placed in front of the fixed arguments.
    const DRIVER: &'static str = "clang-tool";

    pub fn new(directory: impl Into<PathBuf>, arguments: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            arguments,
        }
    }

    /// Split a full argument vector at the first `--`.
    ///
    /// Returns the arguments before `--` and a database built from those
    /// after it, or `None` for the database when there is no `--`.
    pub fn from_command_line(
        args: Vec<String>,
        directory: impl Into<PathBuf>,
    ) -> (Vec<String>, Option<Self>) {
        match args.iter().position(|arg| arg == "--") {
            Some(split) => {
                let mut head = args;
                let tail = head.split_off(split + 1);
                head.pop();
                (head, Some(Self::new(directory, tail)))
            }
            None => (args, None),
        }
    }
}

impl CompilationDatabase for FixedCompilationDatabase {
    fn compile_command(&self, file: &Path) -> Option<CompileCommand> {
        let file = normalize(file, &self.directory);
        let mut arguments = Vec::with_capacity(self.arguments.len() + 2);
        arguments.push(Self::DRIVER.to_string());
        arguments.extend(self.arguments.iter().cloned());
        arguments.push(file.to_string_lossy().into_owned());

        Some(CompileCommand {
            directory: self.directory.clone(),
            file,
            arguments,
            output: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cxx::Dialect;

    const DB: &str = r#"[
        {
            "directory": "/proj/build",
            "file": "../src/main.cpp",
            "arguments": ["clang++", "-c", "../src/main.cpp", "-o", "main.o"],
            "output": "main.o"
        },
        {
            "directory": "/proj/build",
            "file": "/proj/src/util.c",
            "command": "cc -std=c99 -c \"/proj/src/util.c\""
        },
        {
            "directory": "/proj/build",
            "file": "/proj/lib/util.c",
            "command": "cc -c /proj/lib/util.c"
        }
    ]"#;

    fn db() -> JsonCompilationDatabase {
        JsonCompilationDatabase::load_from_str(DB)
            .unwrap()
            .with_working_dir("/proj")
    }

    #[test]
    fn entries_are_normalized() {
        let db = db();
        assert_eq!(db.commands().len(), 3);
        assert_eq!(db.commands()[0].file, PathBuf::from("/proj/src/main.cpp"));
        assert_eq!(db.commands()[0].output, Some(PathBuf::from("main.o")));
        assert_eq!(
            db.commands()[1].arguments,
            vec!["cc", "-std=c99", "-c", "/proj/src/util.c"]
        );
    }

    #[test]
    fn lookup_absolute_and_relative() {
        let db = db();
        let by_abs = db.compile_command(Path::new("/proj/src/main.cpp")).unwrap();
        let by_rel = db.compile_command(Path::new("./src/main.cpp")).unwrap();
        assert_eq!(by_abs, by_rel);
        assert_eq!(by_abs.dialect(), Dialect::Cpp);
    }

    #[test]
    fn lookup_by_unique_suffix() {
        let db = JsonCompilationDatabase::load_from_str(DB)
            .unwrap()
            .with_working_dir("/elsewhere");
        assert!(db.compile_command(Path::new("main.cpp")).is_some());
        // Two entries end in util.c
        assert!(db.compile_command(Path::new("util.c")).is_none());
        assert!(db.compile_command(Path::new("lib/util.c")).is_some());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = db().require(Path::new("/proj/src/other.cpp")).unwrap_err();
        assert!(matches!(err, CompilationDatabaseError::NotFound(_)));
    }

    #[test]
    fn entry_without_command_is_rejected() {
        let json = r#"[{"directory": "/d", "file": "a.c"}]"#;
        let err = JsonCompilationDatabase::load_from_str(json).unwrap_err();
        assert!(matches!(err, CompilationDatabaseError::MissingCommand { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = JsonCompilationDatabase::load_from_str("{not json").unwrap_err();
        assert!(matches!(err, CompilationDatabaseError::Json { .. }));
    }

    #[test]
    fn load_from_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonCompilationDatabase::load_from_directory(dir.path()).unwrap_err();
        assert!(matches!(err, CompilationDatabaseError::Io { .. }));
    }

    #[test]
    fn load_from_directory_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(COMPILE_COMMANDS_FILE), DB).unwrap();
        let db = JsonCompilationDatabase::load_from_directory(dir.path()).unwrap();
        assert_eq!(db.commands().len(), 3);
    }

    #[test]
    fn fixed_database_splits_at_double_dash() {
        let args: Vec<String> = ["tool", "a.c", "--", "-std=c11", "-DX"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (head, db) = FixedCompilationDatabase::from_command_line(args, "/work");
        assert_eq!(head, vec!["tool", "a.c"]);

        let command = db.unwrap().compile_command(Path::new("a.c")).unwrap();
        assert_eq!(command.file, PathBuf::from("/work/a.c"));
        assert_eq!(command.arguments, vec!["clang-tool", "-std=c11", "-DX", "/work/a.c"]);
        assert_eq!(command.dialect(), Dialect::C);
    }

    #[test]
    fn no_double_dash_means_no_fixed_database() {
        let args = vec!["tool".to_string(), "a.c".to_string()];
        let (head, db) = FixedCompilationDatabase::from_command_line(args, "/work");
        assert_eq!(head.len(), 2);
        assert!(db.is_none());
    }
}
