use crate::cxx::errors::ParseError;
use crate::source::{FileId, FileLocation, SourceLocation, TranslationUnit};
use ast_grep_language::{LanguageExt, SupportLang};
use std::fmt;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// The only file a [`ParsedUnit`] knows about.
pub const MAIN_FILE: FileId = FileId(0);

/// Source language a file is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    C,
    #[default]
    Cpp,
}

impl Dialect {
    fn support_lang(self) -> SupportLang {
        match self {
            Dialect::C => SupportLang::C,
            Dialect::Cpp => SupportLang::Cpp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::C => "C",
            Dialect::Cpp => "C++",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tree-sitter parser wrapper for C or C++ source code.
pub struct CxxParser {
    parser: Parser,
    dialect: Dialect,
}

impl CxxParser {
    pub fn new(dialect: Dialect) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        let ts_lang = dialect.support_lang().get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| ParseError::LanguageSet {
                dialect: dialect.as_str(),
            })?;

        Ok(Self { parser, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        self.parser
            .parse(source, None)
            .ok_or(ParseError::ParseFailed)
    }

    /// Parse a file's text into a translation unit.
    pub fn parse_unit(
        &mut self,
        path: impl Into<PathBuf>,
        source: String,
    ) -> Result<ParsedUnit, ParseError> {
        let path = path.into();
        // Locations are u32 offsets with u32::MAX reserved as invalid
        if source.len() >= u32::MAX as usize {
            return Err(ParseError::TooLarge {
                path,
                len: source.len(),
            });
        }

        let tree = self.parse(&source)?;
        let mut tokens = Vec::new();
        collect_tokens(tree.root_node(), &mut tokens);
        tokens.sort_unstable();

        Ok(ParsedUnit {
            path,
            source,
            tree,
            dialect: self.dialect,
            tokens,
        })
    }
}

/// Read and parse one file with the dialect its compile command selects.
pub fn parse_file(path: &Path, dialect: Dialect) -> Result<ParsedUnit, ParseError> {
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CxxParser::new(dialect)?.parse_unit(path, source)
}

/// One parsed source file.
///
/// Tree-sitter does not expand macros, so every token's spelling location is
/// its own offset in the file. Positions taken from MISSING nodes (inserted
/// by error recovery) are invalid.
pub struct ParsedUnit {
    path: PathBuf,
    source: String,
    tree: Tree,
    dialect: Dialect,
    /// Byte ranges of every non-empty leaf, sorted by start
    tokens: Vec<(usize, usize)>,
}

impl ParsedUnit {
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Location of the first byte of `node`.
    pub fn begin_location(&self, node: Node<'_>) -> SourceLocation {
        let first = first_token(node);
        if first.is_missing() {
            return SourceLocation::INVALID;
        }
        offset_location(first.start_byte())
    }

    /// Location of the start of the last token of `node`.
    pub fn end_location(&self, node: Node<'_>) -> SourceLocation {
        let last = last_token(node);
        if last.is_missing() || last.start_byte() == last.end_byte() {
            return SourceLocation::INVALID;
        }
        offset_location(last.start_byte())
    }

    /// Number of ERROR and MISSING nodes in the tree.
    pub fn error_count(&self) -> usize {
        count_error_nodes(self.tree.root_node())
    }
}

impl TranslationUnit for ParsedUnit {
    fn spelling_location(&self, loc: SourceLocation) -> Option<FileLocation> {
        if !loc.is_valid() {
            return None;
        }
        let offset = loc.raw() as usize;
        if offset > self.source.len() {
            return None;
        }
        Some(FileLocation {
            file: MAIN_FILE,
            offset,
        })
    }

    fn end_of_token(&self, loc: FileLocation) -> Option<FileLocation> {
        if loc.file != MAIN_FILE {
            return None;
        }
        let index = self
            .tokens
            .binary_search_by_key(&loc.offset, |&(start, _)| start)
            .ok()?;
        Some(FileLocation {
            file: MAIN_FILE,
            offset: self.tokens[index].1,
        })
    }

    fn buffer(&self, file: FileId) -> Option<&str> {
        (file == MAIN_FILE).then_some(self.source.as_str())
    }

    fn path(&self, file: FileId) -> Option<&Path> {
        (file == MAIN_FILE).then_some(self.path.as_path())
    }
}

fn offset_location(offset: usize) -> SourceLocation {
    u32::try_from(offset)
        .map(SourceLocation::from_raw)
        .unwrap_or(SourceLocation::INVALID)
}

fn first_token(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    loop {
        let first = {
            let mut cursor = current.walk();
            let child = current.children(&mut cursor).next();
            child
        };
        match first {
            Some(child) => current = child,
            None => return current,
        }
    }
}

fn last_token(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    loop {
        let last = {
            let mut cursor = current.walk();
            let child = current.children(&mut cursor).last();
            child
        };
        match last {
            Some(child) => current = child,
            None => return current,
        }
    }
}

fn collect_tokens(node: Node<'_>, tokens: &mut Vec<(usize, usize)>) {
    if node.child_count() == 0 {
        if node.start_byte() < node.end_byte() {
            tokens.push((node.start_byte(), node.end_byte()));
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, tokens);
    }
}

fn count_error_nodes(node: Node<'_>) -> usize {
    let own = usize::from(node.is_error() || node.is_missing());
    if !node.has_error() {
        return own;
    }

    let mut cursor = node.walk();
    let nested: usize = node
        .children(&mut cursor)
        .map(count_error_nodes)
        .sum();
    own + nested
}
