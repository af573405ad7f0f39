//! Source text storage and location tracking for diagnostics.
//!
//! Scripts and stylesheets read during a build are registered in a
//! [`SourceDb`], which hands out a [`FileId`] per file. Lexers and rule checks
//! report positions as [`Span`]s, and the database turns them back into
//! 1-indexed [`ResolvedSpan`] coordinates when diagnostics are rendered.

#![warn(missing_docs)]

pub mod file_id;
pub mod resolved_span;
pub mod source_db;
pub mod source_file;
pub mod span;

pub use file_id::FileId;
pub use resolved_span::ResolvedSpan;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::Span;
