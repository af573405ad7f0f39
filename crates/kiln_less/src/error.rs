//! Errors produced while compiling a LESS stylesheet.

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode};
use kiln_source::{ResolvedSpan, Span};
use std::path::PathBuf;

/// Code attached to every LESS compilation diagnostic.
pub const LESS_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);

/// A fatal stylesheet compilation error.
///
/// Source-level variants carry both the raw [`Span`] (for rendering through
/// a `SourceDb`) and the resolved `file:line:col` location used by `Display`.
#[derive(Debug, thiserror::Error)]
pub enum LessError {
    /// Malformed input: an unterminated block, string or comment, or a
    /// statement that is neither a declaration nor a rule.
    #[error("{location}: {message}")]
    Syntax {
        /// Human-readable description.
        message: String,
        /// Where the problem starts.
        span: Span,
        /// `span` resolved to line and column.
        location: ResolvedSpan,
    },

    /// An `@import` names a file that does not exist.
    #[error("{location}: cannot find imported file '{path}'")]
    MissingImport {
        /// The import target as written.
        path: String,
        /// The `@import` statement.
        span: Span,
        /// `span` resolved to line and column.
        location: ResolvedSpan,
    },

    /// A file imports itself, directly or through other imports.
    #[error("{location}: import cycle through '{path}'")]
    ImportCycle {
        /// The import target as written.
        path: String,
        /// The `@import` statement closing the cycle.
        span: Span,
        /// `span` resolved to line and column.
        location: ResolvedSpan,
    },

    /// A `@name` or `@{name}` reference with no visible definition.
    #[error("{location}: variable @{name} is undefined")]
    UndefinedVariable {
        /// Variable name without the `@`.
        name: String,
        /// The declaration or rule using it.
        span: Span,
        /// `span` resolved to line and column.
        location: ResolvedSpan,
    },

    /// A mixin call with no matching ruleset.
    #[error("{location}: mixin {name} is undefined")]
    UndefinedMixin {
        /// Mixin selector as called, e.g. `.rounded`.
        name: String,
        /// The call statement.
        span: Span,
        /// `span` resolved to line and column.
        location: ResolvedSpan,
    },

    /// The entry stylesheet could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl LessError {
    /// Source span of the problem, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            LessError::Syntax { span, .. }
            | LessError::MissingImport { span, .. }
            | LessError::ImportCycle { span, .. }
            | LessError::UndefinedVariable { span, .. }
            | LessError::UndefinedMixin { span, .. } => Some(*span),
            LessError::Io { .. } => None,
        }
    }

    /// Converts the error into a diagnostic pointing at its span.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        let span = self.span()?;
        let message = match self {
            LessError::Syntax { message, .. } => message.clone(),
            LessError::MissingImport { path, .. } => format!("cannot find imported file '{path}'"),
            LessError::ImportCycle { path, .. } => format!("import cycle through '{path}'"),
            LessError::UndefinedVariable { name, .. } => format!("variable @{name} is undefined"),
            LessError::UndefinedMixin { name, .. } => format!("mixin {name} is undefined"),
            LessError::Io { .. } => return None,
        };
        Some(Diagnostic::error(LESS_ERROR, message, span))
    }
}
