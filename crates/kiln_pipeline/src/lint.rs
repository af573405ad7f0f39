//! The lint task: every application script through the lint engine, with
//! passing files remembered in the transformation cache.

use crate::asset::Asset;
use crate::error::PipelineError;
use crate::select::FileSelector;
use kiln_cache::{CacheKey, TransformCache};
use kiln_config::{LintConfig, ResolvedProject};
use kiln_diagnostics::{Diagnostic, DiagnosticSink};
use kiln_lint::LintEngine;
use kiln_source::SourceDb;
use tracing::debug;

/// Cache operation for lint passes.
pub const LINT_OP: &str = "jshint";

const PASS_MARKER: &[u8] = b"pass";

/// Findings of one lint run.
#[derive(Debug, Default)]
pub struct LintReport {
    /// All diagnostics, file by file.
    pub diagnostics: Vec<Diagnostic>,
    /// Scripts looked at.
    pub files: usize,
    /// Scripts skipped because an identical version already passed.
    pub cached: usize,
}

impl LintReport {
    /// Whether any finding has error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }
}

/// Builds the lint engine with the project's rule levels.
pub fn lint_engine(project: &ResolvedProject) -> LintEngine {
    LintEngine::new(&LintConfig {
        deny: project.lint_deny.clone(),
        allow: project.lint_allow.clone(),
    })
}

/// Lints every application script.
///
/// Scripts whose content already passed are skipped; a script that passes
/// now is recorded under `jshint|sha1(content)`. Failing scripts are never
/// cached, so their findings are reported on every run.
pub fn lint_scripts(
    project: &ResolvedProject,
    engine: &LintEngine,
    db: &mut SourceDb,
    cache: &mut TransformCache,
) -> Result<LintReport, PipelineError> {
    let mut selector = FileSelector::for_project(project)?.include("**/*.js")?;
    for pattern in &project.script_excludes {
        selector = selector.exclude(pattern)?;
    }

    let mut report = LintReport::default();
    for path in selector.select()? {
        report.files += 1;
        let script = Asset::read(&project.source_root, path)?;
        let key = CacheKey::new(LINT_OP, &script.content);
        if cache.get(&key).is_some() {
            report.cached += 1;
            continue;
        }

        let file = db.add_source(script.path.to_string(), script.text()?.to_string());
        let sink = DiagnosticSink::new();
        engine.check_source(&db.get_file(file).content, file, &sink);
        let findings = sink.take_all();
        debug!(target: "kiln::script", script = %script.path, findings = findings.len(), "linted");
        if findings.is_empty() {
            cache.put(&key, PASS_MARKER)?;
        }
        report.diagnostics.extend(findings);
    }
    Ok(report)
}
