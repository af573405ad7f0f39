//! W004: Trailing whitespace: spaces or tabs before a line break.

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use kiln_js::JsToken;
use kiln_source::Span;

use crate::{LintContext, LintRule};

/// Flags spaces and tabs at the end of a line.
///
/// Lines that end inside a template literal are left alone since the
/// whitespace is part of the string value.
pub struct TrailingWhitespace;

impl LintRule for TrailingWhitespace {
    fn code(&self) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, 4)
    }

    fn name(&self) -> &str {
        "trailing-whitespace"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        let templates: Vec<Span> = ctx
            .tokens
            .iter()
            .filter(|t| t.kind == JsToken::Template)
            .map(|t| t.span)
            .collect();

        let mut line_start = 0usize;
        for line in ctx.source.split('\n') {
            let content = line.strip_suffix('\r').unwrap_or(line);
            let trimmed = content.trim_end_matches([' ', '\t']);
            if trimmed.len() < content.len() {
                let start = (line_start + trimmed.len()) as u32;
                let end = (line_start + content.len()) as u32;
                if !templates.iter().any(|t| t.start < start && end < t.end) {
                    sink.emit(Diagnostic::warning(
                        self.code(),
                        "trailing whitespace",
                        Span::new(ctx.file, start, end),
                    ));
                }
            }
            line_start += line.len() + 1;
        }
    }
}
