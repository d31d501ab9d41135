use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to set {dialect} language for parser")]
    LanguageSet { dialect: &'static str },

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is too large to index ({len} bytes)")]
    TooLarge { path: PathBuf, len: usize },

    #[error("rewrite introduces syntax errors ({before} ERROR nodes before, {after} after)")]
    IntroducedSyntaxErrors { before: usize, after: usize },
}
