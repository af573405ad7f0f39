//! All built-in lint rule implementations.
//!
//! This module re-exports all individual rule types and provides
//! `register_builtin_rules` to add all 7 rules to a `LintEngine`.

mod e001;
mod w001;
mod w002;
mod w003;
mod w004;
mod w005;
mod w006;

pub use e001::SyntaxError;
pub use w001::Eqeqeq;
pub use w002::NoDebugger;
pub use w003::NoEval;
pub use w004::TrailingWhitespace;
pub use w005::MissingSemicolon;
pub use w006::NoWith;

use crate::LintEngine;

/// Registers all 7 built-in lint rules with the engine.
///
/// This adds E001 and W001-W006.
pub fn register_builtin_rules(engine: &mut LintEngine) {
    engine.register(Box::new(SyntaxError));
    engine.register(Box::new(Eqeqeq));
    engine.register(Box::new(NoDebugger));
    engine.register(Box::new(NoEval));
    engine.register(Box::new(TrailingWhitespace));
    engine.register(Box::new(MissingSemicolon));
    engine.register(Box::new(NoWith));
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::{LintContext, LintRule};
    use kiln_diagnostics::{Diagnostic, DiagnosticSink};
    use kiln_source::FileId;

    /// Runs one rule over `src`.
    pub fn check(rule: &dyn LintRule, src: &str) -> Vec<Diagnostic> {
        let ctx = LintContext::new(src, FileId::from_raw(0));
        let sink = DiagnosticSink::new();
        rule.check_file(&ctx, &sink);
        sink.take_all()
    }
}
