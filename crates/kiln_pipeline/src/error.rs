//! Error types for the build tasks.

use kiln_cache::CacheError;
use kiln_common::{LogicalPath, PathError};
use kiln_diagnostics::Diagnostic;
use kiln_js::MinifyError;
use kiln_less::LessError;
use std::path::PathBuf;

/// Errors from resolving glob patterns to files.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// A pattern is not valid glob syntax.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// What is wrong with it.
        source: glob::PatternError,
    },

    /// A directory could not be listed.
    #[error("cannot read directory {path}: {source}")]
    Io {
        /// The directory being walked.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that abort a task.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// File selection failed.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// A script could not be minified.
    #[error("failed to minify {path}: {source}")]
    Minify {
        /// The script's logical path.
        path: LogicalPath,
        /// The lexer and bracket errors.
        source: MinifyError,
    },

    /// The LESS entry failed to compile.
    #[error(transparent)]
    Less(#[from] LessError),

    /// The entry HTML refers to a file that does not exist.
    #[error("{html} references '{reference}', which does not exist")]
    MissingReference {
        /// The entry HTML.
        html: LogicalPath,
        /// The `src` or `href` value as written.
        reference: String,
    },

    /// The style bundle refers to a file that does not exist.
    #[error("stylesheet references '{reference}', but {path} does not exist")]
    MissingImage {
        /// The `url()` value as written.
        reference: String,
        /// The logical path it resolves to.
        path: LogicalPath,
    },

    /// A text asset is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    NotUtf8 {
        /// The offending asset.
        path: LogicalPath,
    },

    /// An asset path could not be normalized.
    #[error("invalid asset path: {0}")]
    Path(#[from] PathError),

    /// Writing to the transformation cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest could not be serialized.
    #[error("failed to serialize rev-manifest: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Source-located diagnostics carried by the error, if any.
    ///
    /// Their spans refer to files registered in the `SourceDb` that was
    /// passed to the failing task.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            PipelineError::Minify { source, .. } => source.diagnostics.clone(),
            PipelineError::Less(err) => err.to_diagnostic().into_iter().collect(),
            _ => Vec::new(),
        }
    }
}
