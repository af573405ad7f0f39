//! A single registered source text with a line index.

use crate::file_id::FileId;
use kiln_common::sha1_hex;
use std::path::PathBuf;

/// Source text plus the bookkeeping needed to report positions in it.
pub struct SourceFile {
    /// Id assigned by the owning [`SourceDb`](crate::SourceDb).
    pub id: FileId,
    /// Path shown in diagnostics, usually the asset's logical path.
    pub path: PathBuf,
    /// Full text.
    pub content: String,
    /// Hex SHA-1 of `content`, the digest half of transformation cache keys.
    pub digest: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Indexes `content` and computes its digest.
    pub fn new(id: FileId, path: PathBuf, content: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                content
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| (i + 1) as u32),
            )
            .collect();
        let digest = sha1_hex(content.as_bytes());
        Self {
            id,
            path,
            content,
            digest,
            line_starts,
        }
    }

    /// Converts a byte offset into a 1-indexed `(line, column)` pair.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let idx = self
            .line_starts
            .partition_point(|&start| start <= byte_offset)
            .saturating_sub(1);
        (idx as u32 + 1, byte_offset - self.line_starts[idx] + 1)
    }

    /// Returns the text of a 1-indexed line without its line terminator.
    pub fn line_text(&self, line: u32) -> &str {
        let idx = (line.max(1) - 1) as usize;
        let Some(&start) = self.line_starts.get(idx) else {
            return "";
        };
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.content.len(), |&next| next as usize - 1);
        self.content[start as usize..end].trim_end_matches('\r')
    }

    /// Returns the text between two byte offsets.
    pub fn snippet(&self, start: u32, end: u32) -> &str {
        &self.content[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content: &str) -> SourceFile {
        SourceFile::new(FileId::from_raw(0), PathBuf::from("app.js"), content.to_string())
    }

    #[test]
    fn line_index() {
        let f = file("var a;\nvar b;\n");
        assert_eq!(f.line_starts, vec![0, 7, 14]);
    }

    #[test]
    fn offsets_to_line_col() {
        let f = file("abc\ndef\nghi");
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_col(3), (1, 4));
        assert_eq!(f.line_col(4), (2, 1));
        assert_eq!(f.line_col(10), (3, 3));
    }

    #[test]
    fn line_text_strips_terminators() {
        let f = file("one\r\ntwo\nthree");
        assert_eq!(f.line_text(1), "one");
        assert_eq!(f.line_text(2), "two");
        assert_eq!(f.line_text(3), "three");
        assert_eq!(f.line_text(9), "");
    }

    #[test]
    fn digest_is_sha1_of_content() {
        let f = file("abc");
        assert_eq!(f.digest, "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn empty_content() {
        let f = file("");
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_text(1), "");
    }
}
