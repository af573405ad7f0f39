//! E001: Syntax error. The script does not tokenize or its brackets do
//! not balance.

use kiln_diagnostics::{DiagnosticCode, DiagnosticSink, Severity};
use kiln_js::SYNTAX_ERROR;

use crate::{LintContext, LintRule};

/// Reports the lexer and bracket errors collected by [`LintContext::new`]:
/// unterminated strings, comments, templates and regular expressions, stray
/// characters, and unbalanced `()[]{}`.
pub struct SyntaxError;

impl LintRule for SyntaxError {
    fn code(&self) -> DiagnosticCode {
        SYNTAX_ERROR
    }

    fn name(&self) -> &str {
        "syntax-error"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        sink.extend(ctx.syntax_errors.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::check;

    #[test]
    fn reports_unterminated_string() {
        let diags = check(&SyntaxError, "var s = 'abc;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, SYNTAX_ERROR);
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn reports_unbalanced_brackets() {
        let diags = check(&SyntaxError, "foo(bar];\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "expected ')' but found ']'");
    }

    #[test]
    fn valid_script_passes() {
        assert!(check(&SyntaxError, "var re = /[/]/g; var t = `a${b}`;\n").is_empty());
    }
}
