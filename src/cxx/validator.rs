use crate::cxx::errors::ParseError;
use crate::cxx::parser::{CxxParser, Dialect};

/// Count ERROR and MISSING nodes in source parsed as `dialect`.
pub fn syntax_error_count(dialect: Dialect, source: &str) -> Result<usize, ParseError> {
    let mut parser = CxxParser::new(dialect)?;
    let unit = parser.parse_unit("<validate>", source.to_string())?;
    Ok(unit.error_count())
}

/// Check that a rewritten file parses at least as cleanly as the original.
///
/// Files that already contain syntax errors (unexpanded macros are common in
/// C and C++) are accepted as long as the rewrite does not add more.
pub fn validate_rewrite(
    dialect: Dialect,
    original: &str,
    rewritten: &str,
) -> Result<(), ParseError> {
    let before = syntax_error_count(dialect, original)?;
    let after = syntax_error_count(dialect, rewritten)?;

    if after > before {
        return Err(ParseError::IntroducedSyntaxErrors { before, after });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_rewrite_is_accepted() {
        let result = validate_rewrite(Dialect::Cpp, "int foo(void);\n", "int foo();\n");
        assert!(result.is_ok());
    }

    #[test]
    fn broken_rewrite_is_rejected() {
        let result = validate_rewrite(Dialect::Cpp, "int foo(void);\n", "int foo(;\n");
        assert!(matches!(
            result,
            Err(ParseError::IntroducedSyntaxErrors { before: 0, .. })
        ));
    }

    #[test]
    fn already_broken_source_is_tolerated() {
        let original = "int foo(void);\nint bar( { }\n";
        let rewritten = "int foo();\nint bar( { }\n";
        assert!(validate_rewrite(Dialect::Cpp, original, rewritten).is_ok());
    }

    #[test]
    fn error_count_of_valid_c() {
        assert_eq!(syntax_error_count(Dialect::C, "int main(void) { return 0; }").unwrap(), 0);
    }
}
