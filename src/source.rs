//! Source locations, spans and the translation-unit interface.
//!
//! The rewrite core never looks at a parser directly. It sees a
//! [`TranslationUnit`], which resolves opaque [`SourceLocation`]s to the place
//! their token was literally spelled and exposes the original file bytes.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Identity of one file known to a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// An opaque location handed out by a translation unit.
///
/// Only the unit that produced it knows how to interpret the raw value. A
/// location may point into a macro expansion, so it has to be resolved with
/// [`TranslationUnit::spelling_location`] before it can be turned into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation(u32);

impl SourceLocation {
    /// The location used when a node has no usable position.
    pub const INVALID: SourceLocation = SourceLocation(u32::MAX);

    pub fn from_raw(raw: u32) -> Self {
        SourceLocation(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// A resolved position: a byte offset inside one file's original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileLocation {
    pub file: FileId,
    pub offset: usize,
}

/// A contiguous byte range inside exactly one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file: FileId,
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
}

impl SourceSpan {
    /// Build a span from two resolved endpoints.
    ///
    /// Returns `None` when the endpoints live in different files or are out
    /// of order.
    pub fn between(start: FileLocation, end: FileLocation) -> Option<Self> {
        if start.file != end.file || end.offset < start.offset {
            return None;
        }
        Some(SourceSpan {
            file: start.file,
            start: start.offset,
            end: end.offset,
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the two spans share at least one byte of the same file.
    pub fn overlaps(&self, other: &SourceSpan) -> bool {
        self.file == other.file && self.start < other.end && other.start < self.end
    }

    /// `other` lies entirely within this span.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.file == other.file && self.start <= other.start && other.end <= self.end
    }
}

/// Read access to one parsed source file and its location history.
pub trait TranslationUnit {
    /// Resolve a location to where its token was literally written.
    ///
    /// Returns `None` for invalid locations.
    fn spelling_location(&self, loc: SourceLocation) -> Option<FileLocation>;

    /// Given the start of a token, return the position just past its last
    /// byte. Returns `None` when no token starts there.
    fn end_of_token(&self, loc: FileLocation) -> Option<FileLocation>;

    /// Original text of a file.
    fn buffer(&self, file: FileId) -> Option<&str>;

    /// Path of a file, used to key edits.
    fn path(&self, file: FileId) -> Option<&Path>;
}

/// One function declaration or definition found in a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    /// Function name as written, for logging only.
    pub name: String,
    pub param_count: usize,
    pub is_definition: bool,
    /// Declared with foreign ("C") language linkage.
    pub is_extern_c: bool,
    /// Start of the first token of the node.
    pub begin: SourceLocation,
    /// Start of the last token of the node.
    pub end: SourceLocation,
}
