//! Handles for files registered in a [`SourceDb`](crate::SourceDb).

use serde::{Deserialize, Serialize};

/// Index of a file inside a [`SourceDb`](crate::SourceDb).
///
/// Ids are dense and assigned in registration order, so the first file added
/// to a database is always `FileId::from_raw(0)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Placeholder for positions that do not come from any registered file,
    /// such as diagnostics about configuration or the command line.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Wraps a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for [`FileId::DUMMY`].
    pub fn is_dummy(self) -> bool {
        self == Self::DUMMY
    }
}
