//! Decide whether a zero-parameter function is spelled with `(void)` and
//! where its declarator text ends.

use crate::extract::extract_text;
use crate::source::{FunctionNode, SourceSpan, TranslationUnit};
use std::fmt;

/// The only parameter-list spelling that is rewritten.
pub const VOID_PARAMS: &str = "(void)";

/// Outcome of classifying one function node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    Eligible(EligibleSpan<'a>),
    NotEligible(SkipReason),
}

/// A node whose declarator ends in exactly `(void)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleSpan<'a> {
    /// Full span of the node in its file.
    pub span: SourceSpan,
    /// Node text up to and including the closing `)` of the parameter list.
    pub declarator: &'a str,
    /// Everything after the declarator, kept byte-for-byte. Empty for
    /// declarations.
    pub suffix: &'a str,
}

impl<'a> EligibleSpan<'a> {
    /// The trailing `(void)` of the declarator.
    pub fn trailing(&self) -> &'a str {
        &self.declarator[self.declarator.len() - VOID_PARAMS.len()..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Foreign ("C") linkage keeps its spelling.
    ExternC,
    /// The node has parameters.
    HasParameters,
    /// The node's source text could not be recovered.
    NoText,
    /// No `)` before the body.
    NoParameterList,
    /// The declarator does not end in exactly `(void)`.
    NotVoidSpelling,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::ExternC => "extern \"C\" linkage",
            SkipReason::HasParameters => "has parameters",
            SkipReason::NoText => "source text unavailable",
            SkipReason::NoParameterList => "no parameter list before body",
            SkipReason::NotVoidSpelling => "not spelled (void)",
        };
        f.write_str(reason)
    }
}

/// Classify a function node against the text of its translation unit.
pub fn classify<'a, U: TranslationUnit + ?Sized>(
    node: &FunctionNode,
    unit: &'a U,
) -> Classification<'a> {
    if node.is_extern_c {
        return Classification::NotEligible(SkipReason::ExternC);
    }
    if node.param_count != 0 {
        return Classification::NotEligible(SkipReason::HasParameters);
    }

    let extracted = match extract_text(unit, node.begin, node.end) {
        Some(extracted) if !extracted.text.is_empty() => extracted,
        _ => return Classification::NotEligible(SkipReason::NoText),
    };
    let text = extracted.text;

    let declarator_end = if node.is_definition {
        match declarator_end(text) {
            Some(end) => end,
            None => return Classification::NotEligible(SkipReason::NoParameterList),
        }
    } else {
        text.len()
    };

    let (declarator, suffix) = text.split_at(declarator_end);
    if !ends_with_void(declarator) {
        return Classification::NotEligible(SkipReason::NotVoidSpelling);
    }

    Classification::Eligible(EligibleSpan {
        span: extracted.span,
        declarator,
        suffix,
    })
}

/// Byte offset just past the last `)` that precedes the first `{`.
///
/// A `)` between the parameter list and the body (initializer lists,
/// trailing return types, `noexcept(...)`) is taken as the boundary, which
/// makes such definitions ineligible.
fn declarator_end(text: &str) -> Option<usize> {
    let body_start = text.find('{').unwrap_or(text.len());
    text[..body_start].rfind(')').map(|close| close + 1)
}

fn ends_with_void(declarator: &str) -> bool {
    declarator.len() > VOID_PARAMS.len() && declarator.ends_with(VOID_PARAMS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockUnit;

    fn eligible<'a>(c: Classification<'a>) -> EligibleSpan<'a> {
        match c {
            Classification::Eligible(e) => e,
            other => panic!("expected eligible, got {:?}", other),
        }
    }

    fn reason(c: Classification<'_>) -> SkipReason {
        match c {
            Classification::NotEligible(r) => r,
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn declaration_with_void() {
        let mut unit = MockUnit::new("a.cpp", "int foo(void);\n");
        let node = unit.declaration("int foo(void)");

        let e = eligible(classify(&node, &unit));
        assert_eq!(e.declarator, "int foo(void)");
        assert_eq!(e.suffix, "");
        assert_eq!(e.trailing(), "(void)");
    }

    #[test]
    fn declaration_with_spaced_void_is_left_alone() {
        let mut unit = MockUnit::new("a.cpp", "int foo( void );\n");
        let node = unit.declaration("int foo( void )");

        assert_eq!(reason(classify(&node, &unit)), SkipReason::NotVoidSpelling);
    }

    #[test]
    fn declaration_with_commented_void_is_left_alone() {
        let mut unit = MockUnit::new("a.cpp", "int foo(void /*nothing*/);\n");
        let node = unit.declaration("int foo(void /*nothing*/)");

        assert_eq!(reason(classify(&node, &unit)), SkipReason::NotVoidSpelling);
    }

    #[test]
    fn declaration_already_empty() {
        let mut unit = MockUnit::new("a.cpp", "int foo();\n");
        let node = unit.declaration("int foo()");

        assert_eq!(reason(classify(&node, &unit)), SkipReason::NotVoidSpelling);
    }

    #[test]
    fn bare_void_params_too_short() {
        let mut unit = MockUnit::new("a.cpp", "(void)");
        let node = unit.declaration("(void)");

        assert_eq!(reason(classify(&node, &unit)), SkipReason::NotVoidSpelling);
    }

    #[test]
    fn definition_splits_at_body() {
        let source = "int foo(void)\n{\n    return 0;\n}\n";
        let mut unit = MockUnit::new("a.cpp", source);
        let node = unit.definition("int foo(void)\n{\n    return 0;\n}");

        let e = eligible(classify(&node, &unit));
        assert_eq!(e.declarator, "int foo(void)");
        assert_eq!(e.suffix, "\n{\n    return 0;\n}");
    }

    #[test]
    fn definition_body_parens_do_not_count() {
        let source = "void run(void) { call(1); }";
        let mut unit = MockUnit::new("a.cpp", source);
        let node = unit.definition(source);

        let e = eligible(classify(&node, &unit));
        assert_eq!(e.declarator, "void run(void)");
        assert_eq!(e.suffix, " { call(1); }");
    }

    #[test]
    fn defaulted_definition_without_body() {
        let source = "gronk(void) = default";
        let mut unit = MockUnit::new("a.cpp", source);
        let node = unit.definition(source);

        let e = eligible(classify(&node, &unit));
        assert_eq!(e.declarator, "gronk(void)");
        assert_eq!(e.suffix, " = default");
    }

    #[test]
    fn initializer_list_moves_boundary() {
        let source = "gronk::gronk(void) : x(1) {}";
        let mut unit = MockUnit::new("a.cpp", source);
        let node = unit.definition(source);

        assert_eq!(reason(classify(&node, &unit)), SkipReason::NotVoidSpelling);
    }

    #[test]
    fn definition_without_paren_is_skipped() {
        let source = "auto x {}";
        let mut unit = MockUnit::new("a.cpp", source);
        let node = unit.definition(source);

        assert_eq!(reason(classify(&node, &unit)), SkipReason::NoParameterList);
    }

    #[test]
    fn extern_c_is_skipped_before_reading_text() {
        let mut unit = MockUnit::new("a.cpp", "int foo(void);");
        let mut node = unit.declaration("int foo(void)");
        node.is_extern_c = true;

        assert_eq!(reason(classify(&node, &unit)), SkipReason::ExternC);
    }

    #[test]
    fn nodes_with_parameters_are_skipped() {
        let mut unit = MockUnit::new("a.cpp", "int foo(int);");
        let mut node = unit.declaration("int foo(int)");
        node.param_count = 1;

        assert_eq!(reason(classify(&node, &unit)), SkipReason::HasParameters);
    }

    #[test]
    fn unresolvable_text_is_skipped() {
        let mut unit = MockUnit::new("a.cpp", "int foo(void);");
        let mut node = unit.declaration("int foo(void)");
        node.end = crate::source::SourceLocation::INVALID;

        assert_eq!(reason(classify(&node, &unit)), SkipReason::NoText);
    }
}
