//! W002: `debugger` statement left in the code.

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};

use crate::{LintContext, LintRule};

/// Flags `debugger` statements.
pub struct NoDebugger;

impl LintRule for NoDebugger {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 2)
    }

    fn name(&self) -> &str {
        "no-debugger"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        for (_, tok) in ctx.significant() {
            if tok.is_keyword(ctx.source, "debugger") {
                sink.emit(
                    Diagnostic::warning(self.code(), "forgotten 'debugger' statement", tok.span)
                        .with_help("remove it before shipping"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::check;

    #[test]
    fn flags_debugger() {
        let diags = check(&NoDebugger, "function f() {\n  debugger;\n}\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].primary_span.start, 17);
    }

    #[test]
    fn ignores_property_and_string() {
        assert!(check(&NoDebugger, "var s = 'debugger';\n").is_empty());
    }
}
