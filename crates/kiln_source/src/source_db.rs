//! Registry of every source text read during one invocation.

use crate::file_id::FileId;
use crate::resolved_span::ResolvedSpan;
use crate::source_file::SourceFile;
use crate::span::Span;
use std::io;
use std::path::{Path, PathBuf};

/// Owns the source texts diagnostics point into.
#[derive(Default)]
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a UTF-8 file from disk and registers it under its own path.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path, content))
    }

    /// Registers in-memory text under a display name.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(id, name.into(), content));
        id
    }

    /// Returns the file registered under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this database.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Returns the file registered under `id`, if any.
    pub fn try_get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.as_raw() as usize)
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolves a span to line/column coordinates.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        let file = self.get_file(span.file);
        let last = span.end.saturating_sub(1).max(span.start);
        let (start_line, start_col) = file.line_col(span.start);
        let (end_line, end_col) = file.line_col(last);
        ResolvedSpan {
            file_path: file.path.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Returns the text a span covers.
    pub fn snippet(&self, span: Span) -> &str {
        self.get_file(span.file).snippet(span.start, span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_registration_order() {
        let mut db = SourceDb::new();
        let a = db.add_source("a.js", "var a;".to_string());
        let b = db.add_source("b.js", "var b;".to_string());
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(db.len(), 2);
        assert_eq!(db.get_file(b).content, "var b;");
        assert!(db.try_get_file(FileId::from_raw(5)).is_none());
    }

    #[test]
    fn resolves_multiline_span() {
        let mut db = SourceDb::new();
        let id = db.add_source("main.less", "a {\n  color: red;\n}\n".to_string());
        let resolved = db.resolve_span(Span::new(id, 6, 17));
        assert_eq!(resolved.file_path, PathBuf::from("main.less"));
        assert_eq!((resolved.start_line, resolved.start_col), (2, 3));
        assert_eq!((resolved.end_line, resolved.end_col), (2, 13));
        assert_eq!(db.snippet(Span::new(id, 6, 11)), "color");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.js");
        std::fs::write(&path, "angular.module('app', []);\n").unwrap();

        let mut db = SourceDb::new();
        let id = db.load_file(&path).unwrap();
        assert_eq!(db.get_file(id).path, path);
        assert!(db.get_file(id).content.starts_with("angular"));
        assert!(db.load_file(&dir.path().join("missing.js")).is_err());
    }
}
