//! Turn eligible functions into edits.

use crate::classify::{classify, Classification, EligibleSpan, VOID_PARAMS};
use crate::edit::{Edit, EditSet};
use crate::source::{FunctionNode, SourceSpan, TranslationUnit};
use std::cmp::Reverse;
use tracing::debug;

/// Replacement for the whole node span: the declarator with `()` in place of
/// its trailing `(void)`, followed by the untouched suffix.
pub fn replacement_text(eligible: &EligibleSpan<'_>) -> String {
    splice(eligible.declarator, eligible.suffix)
}

fn splice(declarator: &str, suffix: &str) -> String {
    let head = &declarator[..declarator.len() - VOID_PARAMS.len()];
    let mut text = String::with_capacity(head.len() + 2 + suffix.len());
    text.push_str(head);
    text.push_str("()");
    text.push_str(suffix);
    text
}

/// Build the edit for an eligible node. The edit covers the node's full span,
/// so definitions carry their body in the replacement.
pub fn emit<U: TranslationUnit + ?Sized>(unit: &U, eligible: &EligibleSpan<'_>) -> Option<Edit> {
    edit_for(unit, &eligible.span, replacement_text(eligible))
}

fn edit_for<U: TranslationUnit + ?Sized>(
    unit: &U,
    span: &SourceSpan,
    new_text: String,
) -> Option<Edit> {
    let path = unit.path(span.file)?;
    let original = unit.buffer(span.file)?.get(span.start..span.end)?;
    Some(Edit::new(path, span.start, span.end, new_text, original))
}

/// An eligible node and the eligible nodes inside its body.
struct Nested<'a> {
    eligible: EligibleSpan<'a>,
    inner: Vec<Nested<'a>>,
}

/// Group eligible spans so each one sits under the innermost span that
/// contains it.
fn nest(mut spans: Vec<EligibleSpan<'_>>) -> Vec<Nested<'_>> {
    spans.sort_by_key(|e| (e.span.file.0, e.span.start, Reverse(e.span.end)));
    spans.dedup_by_key(|e| e.span);

    let mut roots = Vec::new();
    let mut open: Vec<Nested<'_>> = Vec::new();
    for eligible in spans {
        while open
            .last()
            .is_some_and(|top| !top.eligible.span.contains(&eligible.span))
        {
            if let Some(done) = open.pop() {
                close(done, &mut open, &mut roots);
            }
        }
        open.push(Nested {
            eligible,
            inner: Vec::new(),
        });
    }
    while let Some(done) = open.pop() {
        close(done, &mut open, &mut roots);
    }
    roots
}

fn close<'a>(done: Nested<'a>, open: &mut [Nested<'a>], roots: &mut Vec<Nested<'a>>) {
    match open.last_mut() {
        Some(parent) => parent.inner.push(done),
        None => roots.push(done),
    }
}

/// Replacement text with every nested rewrite applied inside the suffix.
fn nested_replacement(node: &Nested<'_>) -> String {
    let eligible = &node.eligible;
    let suffix_start = eligible.span.start + eligible.declarator.len();

    let mut suffix = String::with_capacity(eligible.suffix.len());
    let mut cursor = 0;
    for inner in &node.inner {
        let start = match inner.eligible.span.start.checked_sub(suffix_start) {
            Some(start) if start >= cursor => start,
            _ => continue,
        };
        suffix.push_str(&eligible.suffix[cursor..start]);
        suffix.push_str(&nested_replacement(inner));
        cursor = inner.eligible.span.end - suffix_start;
    }
    suffix.push_str(&eligible.suffix[cursor..]);

    splice(eligible.declarator, &suffix)
}

/// Classify every function of a unit and record one edit per outermost
/// eligible node.
///
/// A rewrite nested in the body of another eligible definition is folded into
/// that definition's edit, so edits of one file never overlap. The edit set is
/// threaded through by value so each unit's contribution is explicit at the
/// call site.
pub fn rewrite_unit<U: TranslationUnit + ?Sized>(
    unit: &U,
    functions: &[FunctionNode],
    mut edits: EditSet,
) -> EditSet {
    let mut eligible = Vec::new();
    for node in functions {
        match classify(node, unit) {
            Classification::Eligible(span) => {
                debug!(
                    function = %node.name,
                    start = span.span.start,
                    end = span.span.end,
                    "rewriting (void) parameter list"
                );
                eligible.push(span);
            }
            Classification::NotEligible(reason) => {
                debug!(function = %node.name, %reason, "skipping");
            }
        }
    }

    for node in nest(eligible) {
        if !node.inner.is_empty() {
            debug!(
                start = node.eligible.span.start,
                nested = node.inner.len(),
                "folding nested rewrites into enclosing edit"
            );
        }
        match edit_for(unit, &node.eligible.span, nested_replacement(&node)) {
            Some(edit) => {
                edits.push(edit);
            }
            None => debug!(start = node.eligible.span.start, "no path for file, skipping"),
        }
    }
    edits
}
