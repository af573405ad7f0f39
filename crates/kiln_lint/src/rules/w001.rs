//! W001: `==` / `!=`, loose equality instead of `===` / `!==`.

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Label, Severity};
use kiln_js::JsToken;

use crate::{LintContext, LintRule};

/// Flags every `==` and `!=` operator.
pub struct Eqeqeq;

impl LintRule for Eqeqeq {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 1)
    }

    fn name(&self) -> &str {
        "eqeqeq"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        for (_, tok) in ctx.significant().filter(|(_, t)| t.kind == JsToken::Punct) {
            let strict = match ctx.text(tok) {
                "==" => "===",
                "!=" => "!==",
                _ => continue,
            };
            sink.emit(
                Diagnostic::warning(
                    self.code(),
                    format!("expected '{strict}' and instead saw '{}'", ctx.text(tok)),
                    tok.span,
                )
                .with_label(Label::primary(tok.span, format!("use '{strict}'"))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_util::check;

    #[test]
    fn flags_loose_operators() {
        let diags = check(&Eqeqeq, "if (a == b || c != d) {}\n");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message, "expected '===' and instead saw '=='");
        assert_eq!(diags[1].message, "expected '!==' and instead saw '!='");
        assert_eq!(diags[0].primary_span.start, 6);
    }

    #[test]
    fn strict_operators_pass() {
        assert!(check(&Eqeqeq, "if (a === b && c !== d) {}\nvar s = 'a == b';\n").is_empty());
    }
}
