//! W003: `eval(...)` call.

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Label, Severity};
use kiln_js::JsToken;

use crate::{LintContext, LintRule};

/// Flags direct calls to the global `eval`.
///
/// Method calls such as `obj.eval(x)` are not reported.
pub struct NoEval;

impl LintRule for NoEval {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 3)
    }

    fn name(&self) -> &str {
        "no-eval"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        let tokens = &ctx.tokens;
        for (i, tok) in ctx.significant() {
            if tok.kind != JsToken::Identifier || ctx.text(tok) != "eval" {
                continue;
            }
            let called = tokens.get(i + 1).is_some_and(|n| n.is_punct(ctx.source, "("));
            let member = i > 0
                && (tokens[i - 1].is_punct(ctx.source, ".") || tokens[i - 1].is_punct(ctx.source, "?."));
            if called && !member {
                sink.emit(
                    Diagnostic::warning(self.code(), "eval can be harmful", tok.span)
                        .with_label(Label::primary(tok.span, "code evaluated from a string")),
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
    fn flags_eval_call() {
        let diags = check(&NoEval, "var x = eval('1 + 1');\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].primary_span.start, 8);
    }

    #[test]
    fn ignores_members_and_references() {
        assert!(check(&NoEval, "scope.eval(expr);\nvar e = eval;\n").is_empty());
    }
}
