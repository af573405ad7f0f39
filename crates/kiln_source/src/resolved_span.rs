//! Spans translated to file, line and column for display.

use std::fmt;
use std::path::PathBuf;

/// A span resolved to 1-indexed line/column coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// Path of the file, as registered.
    pub file_path: PathBuf,
    /// Line of the first byte.
    pub start_line: u32,
    /// Column of the first byte.
    pub start_col: u32,
    /// Line of the last byte.
    pub end_line: u32,
    /// Column of the last byte.
    pub end_col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_path.display(),
            self.start_line,
            self.start_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_start_position_only() {
        let rs = ResolvedSpan {
            file_path: PathBuf::from("app/controllers/home.js"),
            start_line: 4,
            start_col: 12,
            end_line: 6,
            end_col: 1,
        };
        assert_eq!(rs.to_string(), "app/controllers/home.js:4:12");
    }
}
