//! Normalized, forward-slash relative paths identifying assets.
//!
//! Every asset is identified by its path relative to the source root. The
//! same string is the manifest key, the fingerprinting input and the text
//! searched for when rewriting references, so it must be normalized once:
//! `/` separators, no `.` segments, `..` segments folded away.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Errors produced when a path cannot be turned into a [`LogicalPath`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path has no segments left after normalization.
    #[error("empty asset path")]
    Empty,

    /// A `..` segment climbs above the source root.
    #[error("path '{0}' escapes the source root")]
    EscapesRoot(String),

    /// The path is not located under the given base directory.
    #[error("path '{path}' is not under '{base}'")]
    NotUnderBase {
        /// The offending path.
        path: PathBuf,
        /// The base directory it was expected under.
        base: PathBuf,
    },
}

/// A normalized relative asset path such as `img/logo.png`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalPath(String);

impl LogicalPath {
    /// Normalizes a slash- or backslash-separated relative path.
    pub fn new(raw: &str) -> Result<Self, PathError> {
        let mut segments: Vec<&str> = Vec::new();
        for seg in raw.split(['/', '\\']) {
            match seg {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::EscapesRoot(raw.to_string()));
                    }
                }
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    /// Builds a logical path from a filesystem path located under `base`.
    pub fn from_base(base: &Path, path: &Path) -> Result<Self, PathError> {
        let rel = path
            .strip_prefix(base)
            .map_err(|_| PathError::NotUnderBase {
                path: path.to_path_buf(),
                base: base.to_path_buf(),
            })?;
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect();
        Self::new(&parts.join("/"))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final segment (the file name).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the directory part, or `""` for files at the root.
    pub fn dir(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Returns the extension of the file name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Inserts `-<hash>` between the file stem and the extension.
    ///
    /// `js/app.js` with hash `d41d8cd98f` becomes `js/app-d41d8cd98f.js`.
    pub fn with_fingerprint(&self, hash: &str) -> Self {
        let name = self.file_name();
        let renamed = match self.extension() {
            Some(ext) => {
                let stem = &name[..name.len() - ext.len() - 1];
                format!("{stem}-{hash}.{ext}")
            }
            None => format!("{name}-{hash}"),
        };
        match self.dir() {
            "" => Self(renamed),
            dir => Self(format!("{dir}/{renamed}")),
        }
    }

    /// Returns the relative reference that reaches this path from `from_dir`.
    ///
    /// `from_dir` is a logical directory (`""` for the root). Reaching
    /// `img/a.png` from `css` gives `../img/a.png`.
    pub fn relative_from(&self, from_dir: &str) -> String {
        let target: Vec<&str> = self.0.split('/').collect();
        let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
        let common = target
            .iter()
            .zip(from.iter())
            .take(target.len() - 1)
            .take_while(|(a, b)| a == b)
            .count();
        let mut parts: Vec<&str> = vec![".."; from.len() - common];
        parts.extend_from_slice(&target[common..]);
        parts.join("/")
    }

    /// Converts the logical path into a filesystem path under `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for seg in self.0.split('/') {
            path.push(seg);
        }
        path
    }
}

/// Resolves `relative` against a logical directory (`""` for the root).
pub fn join_dir(dir: &str, relative: &str) -> Result<LogicalPath, PathError> {
    if dir.is_empty() {
        LogicalPath::new(relative)
    } else {
        LogicalPath::new(&format!("{dir}/{relative}"))
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicalPath({})", self.0)
    }
}

impl TryFrom<String> for LogicalPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<LogicalPath> for String {
    fn from(value: LogicalPath) -> Self {
        value.0
    }
}

impl AsRef<str> for LogicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lp(s: &str) -> LogicalPath {
        LogicalPath::new(s).unwrap()
    }

    #[test]
    fn normalizes_segments() {
        assert_eq!(lp("./a//b/../c.js").as_str(), "a/c.js");
        assert_eq!(lp("a\\b\\c.css").as_str(), "a/b/c.css");
    }

    #[test]
    fn rejects_escape_and_empty() {
        assert_eq!(
            LogicalPath::new("../x.js"),
            Err(PathError::EscapesRoot("../x.js".to_string()))
        );
        assert_eq!(LogicalPath::new("./"), Err(PathError::Empty));
    }

    #[test]
    fn from_base_strips_prefix() {
        let base = Path::new("/proj");
        let p = LogicalPath::from_base(base, Path::new("/proj/src/app/main.js")).unwrap();
        assert_eq!(p.as_str(), "src/app/main.js");
        assert!(LogicalPath::from_base(base, Path::new("/other/x.js")).is_err());
    }

    #[test]
    fn name_dir_extension() {
        let p = lp("img/icons/logo.svg");
        assert_eq!(p.file_name(), "logo.svg");
        assert_eq!(p.dir(), "img/icons");
        assert_eq!(p.extension(), Some("svg"));
        assert_eq!(lp("README").extension(), None);
        assert_eq!(lp(".hidden").extension(), None);
        assert_eq!(lp("app.js").dir(), "");
    }

    #[test]
    fn fingerprint_insertion() {
        assert_eq!(lp("app.js").with_fingerprint("a1b2").as_str(), "app-a1b2.js");
        assert_eq!(
            lp("img/logo.min.png").with_fingerprint("ff00").as_str(),
            "img/logo.min-ff00.png"
        );
        assert_eq!(lp("LICENSE").with_fingerprint("01").as_str(), "LICENSE-01");
    }

    #[test]
    fn join_dir_climbs() {
        let css = lp("vendor/lib/css/lib.css");
        assert_eq!(
            join_dir(css.dir(), "../fonts/a.woff").unwrap().as_str(),
            "vendor/lib/fonts/a.woff"
        );
        assert_eq!(join_dir(lp("app.css").dir(), "img/a.png").unwrap().as_str(), "img/a.png");
    }

    #[test]
    fn relative_from_directories() {
        assert_eq!(lp("img/a.png").relative_from(""), "img/a.png");
        assert_eq!(lp("img/a.png").relative_from("css"), "../img/a.png");
        assert_eq!(lp("styles/img/a.png").relative_from("styles"), "img/a.png");
        assert_eq!(lp("a/b/c.png").relative_from("a/x/y"), "../../b/c.png");
    }

    #[test]
    fn serde_as_string() {
        let p = lp("img/a.png");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"img/a.png\"");
        let back: LogicalPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
