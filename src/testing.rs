//! In-memory translation unit for unit tests.

use crate::source::{FileId, FileLocation, FunctionNode, SourceLocation, TranslationUnit};
use std::path::{Path, PathBuf};

enum Entry {
    File(FileLocation),
    Expansion(SourceLocation),
}

/// A translation unit whose locations are handed out explicitly, so tests can
/// build macro expansions and multi-file spans by hand.
pub struct MockUnit {
    files: Vec<(PathBuf, String)>,
    entries: Vec<Entry>,
}

impl MockUnit {
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            files: vec![(PathBuf::from(path), text.to_string())],
            entries: Vec::new(),
        }
    }

    pub fn add_file(&mut self, path: &str, text: &str) -> u32 {
        self.files.push((PathBuf::from(path), text.to_string()));
        (self.files.len() - 1) as u32
    }

    pub fn loc(&mut self, file: u32, offset: usize) -> SourceLocation {
        self.push(Entry::File(FileLocation {
            file: FileId(file),
            offset,
        }))
    }

    /// A location inside a macro expansion whose token was spelled at `spelling`.
    pub fn macro_loc(&mut self, spelling: SourceLocation) -> SourceLocation {
        self.push(Entry::Expansion(spelling))
    }

    pub fn declaration(&mut self, snippet: &str) -> FunctionNode {
        self.node(snippet, false)
    }

    pub fn definition(&mut self, snippet: &str) -> FunctionNode {
        self.node(snippet, true)
    }

    fn node(&mut self, snippet: &str, is_definition: bool) -> FunctionNode {
        let text = &self.files[0].1;
        let start = text.find(snippet).expect("snippet not in mock file");
        let last = start + last_token_start(snippet);
        FunctionNode {
            name: String::new(),
            param_count: 0,
            is_definition,
            is_extern_c: false,
            begin: self.loc(0, start),
            end: self.loc(0, last),
        }
    }

    fn push(&mut self, entry: Entry) -> SourceLocation {
        self.entries.push(entry);
        SourceLocation::from_raw((self.entries.len() - 1) as u32)
    }
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn last_token_start(snippet: &str) -> usize {
    let bytes = snippet.trim_end().as_bytes();
    let mut i = bytes.len() - 1;
    if is_ident(bytes[i]) {
        while i > 0 && is_ident(bytes[i - 1]) {
            i -= 1;
        }
    }
    i
}

impl TranslationUnit for MockUnit {
    fn spelling_location(&self, loc: SourceLocation) -> Option<FileLocation> {
        if !loc.is_valid() {
            return None;
        }
        match self.entries.get(loc.raw() as usize)? {
            Entry::File(at) => Some(*at),
            Entry::Expansion(spelling) => self.spelling_location(*spelling),
        }
    }

    fn end_of_token(&self, loc: FileLocation) -> Option<FileLocation> {
        let bytes = self.buffer(loc.file)?.as_bytes();
        let first = *bytes.get(loc.offset)?;
        if first.is_ascii_whitespace() {
            return None;
        }
        let mut end = loc.offset + 1;
        if is_ident(first) {
            while end < bytes.len() && is_ident(bytes[end]) {
                end += 1;
            }
        }
        Some(FileLocation {
            file: loc.file,
            offset: end,
        })
    }

    fn buffer(&self, file: FileId) -> Option<&str> {
        self.files.get(file.0 as usize).map(|(_, text)| text.as_str())
    }

    fn path(&self, file: FileId) -> Option<&Path> {
        self.files.get(file.0 as usize).map(|(path, _)| path.as_path())
    }
}
