//! `kiln jshint`: lint application scripts and report the findings.

use kiln_diagnostics::{DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer};
use kiln_pipeline::{lint_engine, lint_scripts, PipelineError};

use crate::session::Session;
use crate::ReportFormat;

/// Runs the lint task.
///
/// Returns exit code 1 if any finding is an error, 0 otherwise. Findings
/// never stop later tasks.
pub fn run(session: &mut Session) -> Result<i32, PipelineError> {
    let engine = lint_engine(&session.project);
    for entry in engine.unknown_rules() {
        eprintln!("warning: unknown lint rule `{entry}` in allow/deny lists");
    }
    session.status("Checking", session.project.source_root.display());

    let (project, db, cache) = session.parts();
    let report = lint_scripts(project, &engine, db, cache)?;
    cache.save()?;

    match session.global.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(session.global.color);
            for diag in &report.diagnostics {
                eprintln!("{}", renderer.render(diag, &session.db));
            }
        }
        ReportFormat::Json => {
            for diag in &report.diagnostics {
                print!("{}", JsonRenderer.render(diag, &session.db));
            }
        }
    }

    let errors = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    if session.global.format == ReportFormat::Text {
        session.status(
            "Result",
            format!(
                "{errors} error(s), {warnings} warning(s) in {} file(s), {} unchanged",
                report.files, report.cached
            ),
        );
    }

    Ok(if report.has_errors() { 1 } else { 0 })
}
