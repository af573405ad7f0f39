//! The task graph and its sequential runner.
//!
//! `copy` and `build` depend on `clean`; `default` is `jshint`, `copy` and
//! `build`. Requested tasks run in the order given, each after its
//! dependencies, and no task runs twice in one invocation.

use clap::ValueEnum;
use kiln_cache::clear_dir;
use kiln_diagnostics::{DiagnosticRenderer, TerminalRenderer};
use kiln_pipeline::{build, clean, copy_entry, PipelineError};

use crate::lint;
use crate::session::Session;
use crate::TaskName;

fn dependencies(task: TaskName) -> &'static [TaskName] {
    match task {
        TaskName::Copy | TaskName::Build => &[TaskName::Clean],
        TaskName::Default => &[TaskName::Jshint, TaskName::Copy, TaskName::Build],
        TaskName::Jshint | TaskName::Clean | TaskName::ClearCache => &[],
    }
}

/// The tasks to run for `requested`, dependencies first, each once.
///
/// Nothing requested means `default`. `default` itself has no action and
/// does not appear in the plan.
pub fn plan(requested: &[TaskName]) -> Vec<TaskName> {
    let requested = if requested.is_empty() {
        &[TaskName::Default][..]
    } else {
        requested
    };
    let mut order = Vec::new();
    for &task in requested {
        visit(task, &mut order);
    }
    order
}

fn visit(task: TaskName, order: &mut Vec<TaskName>) {
    for &dep in dependencies(task) {
        visit(dep, order);
    }
    if task != TaskName::Default && !order.contains(&task) {
        order.push(task);
    }
}

fn name(task: TaskName) -> String {
    task.to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_else(|| format!("{task:?}"))
}

/// Runs the planned tasks and returns the process exit code.
///
/// A failing task stops the run with exit code 1. Lint findings of error
/// severity also yield 1 but do not stop the tasks after `jshint`.
pub fn run(requested: &[TaskName], session: &mut Session) -> Result<i32, Box<dyn std::error::Error>> {
    let mut code = 0;
    for task in plan(requested) {
        tracing::debug!(task = %name(task), "running task");
        match run_task(task, session) {
            Ok(task_code) => code = code.max(task_code),
            Err(err) => {
                report_failure(task, &err, session);
                return Ok(1);
            }
        }
    }
    Ok(code)
}

fn run_task(task: TaskName, session: &mut Session) -> Result<i32, PipelineError> {
    match task {
        TaskName::Jshint => lint::run(session),
        TaskName::Clean => {
            let removed = clean(&session.project.dist_dir)?;
            session.status(
                "Cleaned",
                format!("{} ({removed} file(s))", session.project.dist_dir.display()),
            );
            Ok(0)
        }
        TaskName::Copy => {
            let written = copy_entry(&session.project)?;
            session.status("Copied", written.display());
            Ok(0)
        }
        TaskName::Build => {
            session.status("Building", &session.project.module_name);
            let (project, db, cache) = session.parts();
            let report = build(project, db, cache)?;
            let stats = cache.stats();
            session.status(
                "Bundled",
                format!(
                    "{} script(s), {} from cache",
                    report.scripts, report.scripts_cached
                ),
            );
            if session.global.verbose {
                for (original, fingerprinted) in &report.outputs {
                    session.status("Wrote", format!("{original} -> {fingerprinted}"));
                }
                session.status(
                    "Cache",
                    format!("{} hit(s), {} miss(es)", stats.hits, stats.misses),
                );
            }
            session.status(
                "Finished",
                format!(
                    "{} asset(s) in {}",
                    report.outputs.len(),
                    session.project.dist_dir.display()
                ),
            );
            Ok(0)
        }
        TaskName::ClearCache => {
            match session.open_cache() {
                Some(cache) => cache.clear()?,
                None => clear_dir(&session.project.cache_dir)?,
            }
            session.status("Cleared", session.project.cache_dir.display());
            Ok(0)
        }
        TaskName::Default => Ok(0),
    }
}

fn report_failure(task: TaskName, err: &PipelineError, session: &Session) {
    let diagnostics = err.diagnostics();
    if diagnostics.is_empty() {
        eprintln!("error: {err}");
    } else {
        let renderer = TerminalRenderer::new(session.global.color);
        for diag in &diagnostics {
            eprintln!("{}", renderer.render(diag, &session.db));
        }
    }
    eprintln!("error: task `{}` failed", name(task));
}
