//! Formatting diagnostics for people and for tools.

use crate::diagnostic::Diagnostic;
use crate::label::{Label, LabelStyle};
use crate::severity::Severity;
use kiln_source::{SourceDb, Span};
use serde_json::json;

/// Formats a diagnostic as text.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic. The result ends with a newline.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// rustc-style output:
///
/// ```text
/// warning[W001]: expected '===' and instead saw '=='
///   --> app/main.js:3:7
///    |
///  3 | if (a == b) {
///    |       ^^ use '==='
///    |
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Emit ANSI colours.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, ansi: &str) -> String {
        if self.color {
            format!("\x1b[{ansi}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn severity_colour(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
            Severity::Note => "1;36",
        }
    }

    fn excerpt(
        &self,
        out: &mut String,
        label_span: Span,
        marker: char,
        message: &str,
        db: &SourceDb,
        gutter: usize,
    ) {
        let file = db.get_file(label_span.file);
        let (line, col) = file.line_col(label_span.start);
        let text = file.line_text(line);
        let room = text.len().saturating_sub(col as usize - 1).max(1);
        let width = (label_span.len() as usize).clamp(1, room);
        let underline: String = std::iter::repeat(marker).take(width).collect();
        let pad = " ".repeat(col as usize - 1);
        let bar = self.paint("|", "1;34");
        let suffix = if message.is_empty() {
            String::new()
        } else {
            format!(" {message}")
        };
        out.push_str(&format!("{line:>gutter$} {bar} {text}\n"));
        out.push_str(&format!("{:gutter$} {bar} {pad}{underline}{suffix}\n", ""));
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();
        let head = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(&head, Self::severity_colour(diag.severity)),
            diag.message
        ));

        let located = !diag.primary_span.is_dummy()
            && source_db.try_get_file(diag.primary_span.file).is_some();
        if located {
            let resolved = source_db.resolve_span(diag.primary_span);
            let mut labels: Vec<&Label> = diag.labels.iter().collect();
            let primary_message = labels
                .iter()
                .position(|l| l.style == LabelStyle::Primary)
                .map(|i| labels.remove(i).message.clone())
                .unwrap_or_default();
            let last_line = labels
                .iter()
                .filter(|l| !l.span.is_dummy())
                .map(|l| source_db.resolve_span(l.span).start_line)
                .chain(std::iter::once(resolved.start_line))
                .max()
                .unwrap_or(resolved.start_line);
            let gutter = last_line.to_string().len();
            let bar = self.paint("|", "1;34");

            let arrow = self.paint("-->", "1;34");
            out.push_str(&format!("{:gutter$}{arrow} {resolved}\n", ""));
            out.push_str(&format!("{:gutter$} {bar}\n", ""));
            let primary = diag.primary_span;
            self.excerpt(&mut out, primary, '^', &primary_message, source_db, gutter);
            for label in labels.iter().filter(|l| !l.span.is_dummy()) {
                let (span, marker) = (label.span, label.marker());
                self.excerpt(&mut out, span, marker, &label.message, source_db, gutter);
            }
            if !diag.notes.is_empty() || !diag.help.is_empty() {
                out.push_str(&format!("{:gutter$} {bar}\n", ""));
            }
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// One JSON object per diagnostic, newline-terminated.
///
/// Located diagnostics carry `file`, `line` and `column`; the rest carry
/// `null` in those fields.
#[derive(Default)]
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let span = diag.primary_span;
        let location = source_db
            .try_get_file(span.file)
            .filter(|_| !span.is_dummy())
            .map(|_| source_db.resolve_span(span));
        let value = json!({
            "severity": diag.severity,
            "code": diag.code,
            "message": diag.message,
            "file": location.as_ref().map(|l| l.file_path.display().to_string()),
            "line": location.as_ref().map(|l| l.start_line),
            "column": location.as_ref().map(|l| l.start_col),
            "notes": diag.notes,
            "help": diag.help,
        });
        format!("{value}\n")
    }
}
