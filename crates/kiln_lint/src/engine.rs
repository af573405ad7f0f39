//! Lint engine that manages rule registration, configuration, and execution.
//!
//! The `LintEngine` accepts a `LintConfig` to control which rules are denied
//! or allowed, then runs every enabled rule over a script. Rules are matched
//! by name (`eqeqeq`) or by code (`W001`).

use std::collections::HashSet;

use kiln_config::LintConfig;
use kiln_diagnostics::{DiagnosticSink, Severity};
use kiln_source::FileId;

use crate::context::LintContext;
use crate::rules::register_builtin_rules;
use crate::LintRule;

/// The lint engine that orchestrates running lint rules on scripts.
///
/// Rules are registered at construction time. The engine respects the
/// `LintConfig` to suppress rules (allow) or promote rules to errors (deny).
pub struct LintEngine {
    /// All registered lint rules.
    rules: Vec<Box<dyn LintRule>>,
    /// Rule names or codes that should be promoted to error severity.
    denied: HashSet<String>,
    /// Rule names or codes that should be suppressed (not reported).
    allowed: HashSet<String>,
}

impl LintEngine {
    /// Creates a new lint engine configured by the given `LintConfig`.
    ///
    /// All builtin rules are registered automatically.
    pub fn new(config: &LintConfig) -> Self {
        let mut engine = Self {
            rules: Vec::new(),
            denied: config.deny.iter().cloned().collect(),
            allowed: config.allow.iter().cloned().collect(),
        };
        register_builtin_rules(&mut engine);
        engine
    }

    /// Registers a lint rule with the engine.
    pub fn register(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }

    /// Returns the configured allow/deny entries that match no rule.
    pub fn unknown_rules(&self) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .denied
            .iter()
            .chain(self.allowed.iter())
            .filter(|entry| !self.rules.iter().any(|r| matches_rule(r.as_ref(), entry)))
            .map(String::as_str)
            .collect();
        unknown.sort_unstable();
        unknown.dedup();
        unknown
    }

    fn is_listed(&self, set: &HashSet<String>, rule: &dyn LintRule) -> bool {
        set.iter().any(|entry| matches_rule(rule, entry))
    }

    /// Runs all enabled lint rules on one script.
    ///
    /// Syntax errors are reported by the `syntax-error` rule; when there are
    /// any, the other rules are skipped for the file. If a rule is allowed it
    /// is skipped, and if it is denied its diagnostics are promoted to error
    /// severity.
    pub fn run(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink) {
        let syntax_only = ctx.has_syntax_errors();
        for rule in &self.rules {
            if self.is_listed(&self.allowed, rule.as_ref()) {
                continue;
            }
            if syntax_only && rule.default_severity() != Severity::Error {
                continue;
            }

            // Use a temporary sink to capture and possibly modify diagnostics
            let temp_sink = DiagnosticSink::new();
            rule.check_file(ctx, &temp_sink);

            let is_denied = self.is_listed(&self.denied, rule.as_ref());
            for mut diag in temp_sink.take_all() {
                if is_denied {
                    diag.severity = Severity::Error;
                }
                sink.emit(diag);
            }
        }
    }

    /// Lexes `source` and runs all enabled rules on it.
    pub fn check_source(&self, source: &str, file: FileId, sink: &DiagnosticSink) {
        let ctx = LintContext::new(source, file);
        self.run(&ctx, sink);
    }
}

fn matches_rule(rule: &dyn LintRule, entry: &str) -> bool {
    rule.name() == entry || rule.code().to_string().eq_ignore_ascii_case(entry)
}
