//! Errors raised while loading and resolving project configuration.

use kiln_common::PathError;

/// Everything that can go wrong before a task starts running.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading a configuration file failed.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// `kiln.toml` is not valid TOML or has fields of the wrong type.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// `package.json` exists but is not a JSON object.
    #[error("failed to parse package.json: {0}")]
    PackageJson(String),

    /// A configured path is not a usable relative path.
    #[error("invalid path in `{field}`: {source}")]
    InvalidPath {
        /// Dotted name of the offending field.
        field: String,
        /// Why the path was rejected.
        source: PathError,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ConfigError::ParseError("expected `=` at line 2".to_string());
        assert_eq!(err.to_string(), "failed to parse configuration: expected `=` at line 2");

        let err = ConfigError::InvalidPath {
            field: "build.dist".to_string(),
            source: PathError::EscapesRoot("../out".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "invalid path in `build.dist`: path '../out' escapes the source root"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io.into();
        assert!(err.to_string().starts_with("failed to read configuration:"));
    }
}
