use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A byte-span replacement with verification of the text it replaces.
///
/// Offsets always refer to the original, unedited file. Every rewrite the
/// tool produces compiles down to one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until it is recorded in an EditSet"]
pub struct Edit {
    /// Path of the file to edit
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text for [byte_start, byte_end)
    pub new_text: String,
    /// What we expect to find at the span before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (for large spans such as long bodies)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, hashing anything over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Before-text verification failed at {file}:{byte_start}")]
    BeforeTextMismatch {
        file: PathBuf,
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in file of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("Overlapping edits in {file}: [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    Overlap {
        file: PathBuf,
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("Rewrite of {file} rejected: {reason}")]
    Rejected { file: PathBuf, reason: String },

    #[error("File I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid edit would create malformed UTF-8")]
    InvalidUtf8Edit,
}

/// Result of applying one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditResult {
    Applied { bytes_changed: usize },
    /// The span already holds the replacement text
    AlreadyApplied,
}

impl Edit {
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl AsRef<str>,
    ) -> Self {
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before.as_ref()),
        }
    }

    /// Check the edit at `range` of `content` and report whether the
    /// replacement is already in place there.
    ///
    /// `range` is the edit's span moved by whatever earlier edits of the same
    /// file were found already applied.
    fn validate(&self, content: &str, range: Range<usize>) -> Result<EditResult, EditError> {
        if range.start > range.end {
            return Err(self.invalid_range(content));
        }

        if let Some(current) = content.get(range.clone()) {
            if self.expected_before.matches(current) {
                return Ok(EditResult::Applied {
                    bytes_changed: self.new_text.len(),
                });
            }
        }

        let applied_end = range.start + self.new_text.len();
        if content.get(range.start..applied_end) == Some(self.new_text.as_str()) {
            return Ok(EditResult::AlreadyApplied);
        }

        if range.end > content.len() {
            return Err(self.invalid_range(content));
        }
        let current = content.get(range).ok_or(EditError::InvalidUtf8Edit)?;

        Err(EditError::BeforeTextMismatch {
            file: self.file.clone(),
            byte_start: self.byte_start,
            byte_end: self.byte_end,
            found: current.to_string(),
        })
    }

    fn invalid_range(&self, content: &str) -> EditError {
        EditError::InvalidByteRange {
            byte_start: self.byte_start,
            byte_end: self.byte_end,
            file_len: content.len(),
        }
    }
}

/// Process-wide collection of edits, grouped and ordered by file.
///
/// Append-only: edits are recorded while walking translation units and read
/// once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    files: BTreeMap<PathBuf, Vec<Edit>>,
}

/// The rewritten text of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRewrite {
    pub text: String,
    pub results: Vec<EditResult>,
}

impl FileRewrite {
    pub fn applied(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, EditResult::Applied { .. }))
            .count()
    }
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit. Returns `false` if an identical edit is already present.
    pub fn push(&mut self, edit: Edit) -> bool {
        let edits = self.files.entry(edit.file.clone()).or_default();
        if edits.contains(&edit) {
            return false;
        }
        edits.push(edit);
        true
    }

    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.values().all(Vec::is_empty)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn edits_for(&self, file: &Path) -> &[Edit] {
        self.files.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.files.values().flatten()
    }

    /// Apply this set's edits for `file` to its original text.
    ///
    /// Edits are sorted, checked for overlap and verified against `original`,
    /// then spliced from the end of the file backwards so that every offset
    /// refers to the original text.
    pub fn rewrite_in_memory(&self, file: &Path, original: &str) -> Result<FileRewrite, EditError> {
        let mut edits: Vec<&Edit> = self.edits_for(file).iter().collect();
        edits.sort_by_key(|e| (e.byte_start, e.byte_end));

        for pair in edits.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if first.byte_end > second.byte_start {
                return Err(EditError::Overlap {
                    file: file.to_path_buf(),
                    first_start: first.byte_start,
                    first_end: first.byte_end,
                    second_start: second.byte_start,
                    second_end: second.byte_end,
                });
            }
        }

        // Spans after an already-applied edit sit at shifted offsets
        let mut drift: isize = 0;
        let mut ranges = Vec::with_capacity(edits.len());
        let mut results = Vec::with_capacity(edits.len());
        for edit in &edits {
            let shifted = |offset: usize| {
                offset
                    .checked_add_signed(drift)
                    .ok_or_else(|| edit.invalid_range(original))
            };
            let range = shifted(edit.byte_start)?..shifted(edit.byte_end)?;
            let result = edit.validate(original, range.clone())?;
            if result == EditResult::AlreadyApplied {
                drift += edit.new_text.len() as isize - range.len() as isize;
            }
            ranges.push(range);
            results.push(result);
        }

        let mut text = original.to_string();
        for ((edit, range), result) in edits.iter().zip(ranges).zip(&results).rev() {
            if let EditResult::Applied { .. } = result {
                text.replace_range(range, &edit.new_text);
            }
        }

        Ok(FileRewrite { text, results })
    }

    /// Apply every file's edits, writing each file atomically.
    ///
    /// Files are handled independently: a failure is reported for that file
    /// and the remaining files are still written.
    pub fn apply(&self) -> Vec<(PathBuf, Result<FileRewrite, EditError>)> {
        self.apply_with(|_, _, _| Ok(()))
    }

    /// Like [`EditSet::apply`], running `check(file, original, rewritten)`
    /// before each write. A failing check leaves that file untouched.
    pub fn apply_with<F>(&self, mut check: F) -> Vec<(PathBuf, Result<FileRewrite, EditError>)>
    where
        F: FnMut(&Path, &str, &str) -> Result<(), EditError>,
    {
        self.files
            .keys()
            .map(|file| {
                let result = apply_file(self, file, &mut check);
                (file.clone(), result)
            })
            .collect()
    }

    /// Serializable view for `--export-fixes`.
    pub fn to_export(&self) -> ExportedFixes {
        ExportedFixes {
            files: self
                .files
                .iter()
                .map(|(path, edits)| ExportedFile {
                    path: path.clone(),
                    replacements: edits
                        .iter()
                        .map(|e| ExportedReplacement {
                            offset: e.byte_start,
                            length: e.byte_end - e.byte_start,
                            replacement_text: e.new_text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFixes {
    pub files: Vec<ExportedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub replacements: Vec<ExportedReplacement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedReplacement {
    pub offset: usize,
    pub length: usize,
    pub replacement_text: String,
}

fn apply_file<F>(set: &EditSet, file: &Path, check: &mut F) -> Result<FileRewrite, EditError>
where
    F: FnMut(&Path, &str, &str) -> Result<(), EditError>,
{
    let original = fs::read_to_string(file).map_err(|source| EditError::Io {
        path: file.to_path_buf(),
        source,
    })?;

    let rewrite = set.rewrite_in_memory(file, &original)?;
    if rewrite.applied() == 0 {
        return Ok(rewrite);
    }

    check(file, &original, &rewrite.text)?;

    atomic_write(file, rewrite.text.as_bytes())?;

    // Bump mtime so build systems notice the change
    let now = filetime::FileTime::now();
    filetime::set_file_mtime(file, now).map_err(|source| EditError::Io {
        path: file.to_path_buf(),
        source,
    })?;

    Ok(rewrite)
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let io_err = |source| EditError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(content).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}
