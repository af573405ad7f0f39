//! Lint rules and engine for application JavaScript.
//!
//! The rules are token-level checks in the spirit of jshint: they look at the
//! stream produced by `kiln_js::lex` and never build a syntax tree. Files
//! with syntax errors only report those; the other rules are skipped for
//! them.
//!
//! # Rules
//!
//! | Code | Name | Default |
//! |---|---|---|
//! | E001 | `syntax-error` | error |
//! | W001 | `eqeqeq` | warning |
//! | W002 | `no-debugger` | warning |
//! | W003 | `no-eval` | warning |
//! | W004 | `trailing-whitespace` | warning |
//! | W005 | `missing-semicolon` | warning |
//! | W006 | `no-with` | warning |

#![warn(missing_docs)]

mod context;
mod engine;
mod rules;

pub use context::LintContext;
pub use engine::LintEngine;
pub use rules::register_builtin_rules;
pub use rules::{Eqeqeq, MissingSemicolon, NoDebugger, NoEval, NoWith, SyntaxError, TrailingWhitespace};

use kiln_diagnostics::{DiagnosticCode, DiagnosticSink, Severity};

/// A single lint rule that checks one script.
///
/// Each rule has a unique diagnostic code, a human-readable name and a
/// default severity. `check_file` is called once per
/// script and emits diagnostics via the provided sink.
pub trait LintRule: Send + Sync {
    /// Returns the diagnostic code for this rule (e.g., W001).
    fn code(&self) -> DiagnosticCode;

    /// Returns the short kebab-case name of this rule (e.g., "eqeqeq").
    fn name(&self) -> &str;

    /// Returns the default severity for diagnostics emitted by this rule.
    fn default_severity(&self) -> Severity;

    /// Checks one script and emits diagnostics to the sink.
    fn check_file(&self, ctx: &LintContext<'_>, sink: &DiagnosticSink);
}
