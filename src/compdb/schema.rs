use crate::cxx::Dialect;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// One entry of `compile_commands.json` as written by build systems.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCompileCommand {
    pub directory: PathBuf,
    pub file: PathBuf,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// The compiler invocation for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// Working directory of the compiler
    pub directory: PathBuf,
    /// Absolute, lexically normalized source path
    pub file: PathBuf,
    /// Full argument vector, driver first
    pub arguments: Vec<String>,
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Language the file is compiled as.
    ///
    /// An explicit `-x` wins, then `-std=`, then a C++ driver name, then the
    /// file extension.
    pub fn dialect(&self) -> Dialect {
        if let Some(dialect) = self.explicit_language() {
            return dialect;
        }
        if let Some(dialect) = self.standard() {
            return dialect;
        }

        let driver_is_cpp = self
            .arguments
            .first()
            .and_then(|driver| Path::new(driver).file_name())
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with("++"))
            .unwrap_or(false);
        if driver_is_cpp {
            return Dialect::Cpp;
        }

        match self.file.extension().and_then(|e| e.to_str()) {
            Some("c") | Some("i") => Dialect::C,
            _ => Dialect::Cpp,
        }
    }

    /// Language named by the last `-x <lang>` or `-x<lang>`.
    fn explicit_language(&self) -> Option<Dialect> {
        let mut language = None;
        let mut args = self.arguments.iter();
        while let Some(arg) = args.next() {
            let value = if arg == "-x" {
                args.next().map(String::as_str)
            } else {
                arg.strip_prefix("-x")
            };
            if let Some(value) = value {
                language = match value {
                    "c" | "c-header" | "cpp-output" => Some(Dialect::C),
                    "c++" | "c++-header" | "c++-cpp-output" => Some(Dialect::Cpp),
                    _ => language,
                };
            }
        }
        language
    }

    fn standard(&self) -> Option<Dialect> {
        let std = self
            .arguments
            .iter()
            .rev()
            .find_map(|arg| arg.strip_prefix("-std=").or_else(|| arg.strip_prefix("--std=")))?;
        if std.contains("++") {
            Some(Dialect::Cpp)
        } else if std.starts_with('c') || std.starts_with("gnu") || std.starts_with("iso9899") {
            Some(Dialect::C)
        } else {
            None
        }
    }
}

/// Resolve `path` against `base` and drop `.`/`..` components without
/// touching the filesystem.
pub(crate) fn normalize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
