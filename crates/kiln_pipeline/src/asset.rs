//! In-memory files flowing through the pipelines.

use crate::error::PipelineError;
use kiln_common::{ContentHash, LogicalPath};
use std::path::Path;

/// A named file and its bytes.
///
/// Assets are read from the source root at the start of a build, replaced
/// wholesale by each stage and written to the output directory at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Path relative to the source root.
    pub path: LogicalPath,
    /// File content.
    pub content: Vec<u8>,
}

impl Asset {
    /// Creates an asset from its path and content.
    pub fn new(path: LogicalPath, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path,
            content: content.into(),
        }
    }

    /// Reads the file at `path` under `root`.
    pub fn read(root: &Path, path: LogicalPath) -> Result<Self, PipelineError> {
        let fs_path = path.to_fs_path(root);
        let content = std::fs::read(&fs_path).map_err(|e| PipelineError::io(fs_path, e))?;
        Ok(Self { path, content })
    }

    /// XXH3 hash of the content.
    pub fn hash(&self) -> ContentHash {
        ContentHash::from_bytes(&self.content)
    }

    /// The content as text.
    pub fn text(&self) -> Result<&str, PipelineError> {
        std::str::from_utf8(&self.content).map_err(|_| PipelineError::NotUtf8 {
            path: self.path.clone(),
        })
    }

    /// Whether the asset is a stylesheet.
    pub fn is_css(&self) -> bool {
        self.path.extension() == Some("css")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_follows_content() {
        let a = Asset::new(LogicalPath::new("a.js").unwrap(), "x");
        let b = Asset::new(LogicalPath::new("b.js").unwrap(), "x");
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn rejects_invalid_utf8() {
        let a = Asset::new(LogicalPath::new("a.css").unwrap(), vec![0xff, 0xfe]);
        assert!(a.is_css());
        assert!(matches!(a.text(), Err(PipelineError::NotUtf8 { .. })));
    }

    #[test]
    fn reads_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/a.png"), [1u8, 2, 3]).unwrap();
        let asset = Asset::read(dir.path(), LogicalPath::new("img/a.png").unwrap()).unwrap();
        assert_eq!(asset.content, vec![1, 2, 3]);
        assert!(Asset::read(dir.path(), LogicalPath::new("nope.png").unwrap()).is_err());
    }
}
