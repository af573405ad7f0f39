//! Error types for cache operations.

use std::path::PathBuf;

/// Errors from writing or clearing the cache.
///
/// Reads never fail: a missing, truncated or corrupt entry is a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A filesystem operation on the cache directory failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path being read, written or removed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact header or the index could not be encoded.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
