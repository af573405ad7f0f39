//! W006: `with` statement.

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};

use crate::{LintContext, LintRule};

/// Flags `with` statements.
pub struct NoWith;

impl LintRule for NoWith {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 6)
    }

    fn name(&self) -> &str {
        "no-with"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        for (_, tok) in ctx.significant() {
            if tok.is_keyword(ctx.source, "with") {
                sink.emit(Diagnostic::warning(self.code(), "don't use 'with'", tok.span));
            }
        }
    }
}
