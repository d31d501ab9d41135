//! Recover the literal source text covered by a node.

use crate::source::{SourceLocation, SourceSpan, TranslationUnit};
use tracing::trace;

/// Text of a node together with the span it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedText<'a> {
    pub span: SourceSpan,
    pub text: &'a str,
}

/// Return the exact text between `begin` and the end of the token at `end`.
///
/// Both endpoints are resolved to their spelling location first. Anything
/// that prevents a faithful single-file byte range (invalid locations,
/// endpoints in different files, reversed endpoints after macro shuffling)
/// yields `None` instead of an error.
pub fn extract_text<'a, U: TranslationUnit + ?Sized>(
    unit: &'a U,
    begin: SourceLocation,
    end: SourceLocation,
) -> Option<ExtractedText<'a>> {
    let start = unit.spelling_location(begin)?;
    let last_token = unit.spelling_location(end)?;

    if start.file != last_token.file {
        trace!(?start, ?last_token, "node spans more than one file");
        return None;
    }

    let end = unit.end_of_token(last_token)?;
    let span = match SourceSpan::between(start, end) {
        Some(span) => span,
        None => {
            trace!(?start, ?end, "node end precedes its start");
            return None;
        }
    };

    let text = unit.buffer(span.file)?.get(span.start..span.end)?;
    Some(ExtractedText { span, text })
}
