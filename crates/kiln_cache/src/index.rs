//! The JSON index of live cache entries.
//!
//! `index.json` lists every key the cache knows about. An entry file without
//! an index record is garbage; an index record without a readable entry file
//! is a miss. The index also records which kiln version wrote it, and an
//! index from another version is discarded wholesale.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::key::CacheKey;

const INDEX_FILE: &str = "index.json";

/// Bookkeeping for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Payload size in bytes.
    pub size: u64,
}

/// All known entries, keyed by [`CacheKey`] display form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheIndex {
    /// kiln version that wrote the index.
    pub kiln_version: String,
    /// Known entries.
    pub entries: BTreeMap<String, IndexEntry>,
}

impl CacheIndex {
    /// An empty index.
    pub fn new(kiln_version: &str) -> Self {
        Self {
            kiln_version: kiln_version.to_string(),
            entries: BTreeMap::new(),
        }
    }

    /// Reads `<cache_dir>/index.json`. Missing or unparsable files give `None`.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(cache_dir.join(INDEX_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Writes `<cache_dir>/index.json`, creating the directory if needed.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::io(cache_dir, e))?;
        let path = cache_dir.join(INDEX_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::io(&path, e))
    }

    /// Returns `true` if the index was written by `current_version`.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.kiln_version == current_version
    }

    /// Whether `key` has a record.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(&key.to_string())
    }

    /// Records `key`.
    pub fn insert(&mut self, key: &CacheKey, size: u64) {
        self.entries.insert(key.to_string(), IndexEntry { size });
    }

    /// Drops the record for `key`.
    pub fn remove(&mut self, key: &CacheKey) {
        self.entries.remove(&key.to_string());
    }

    /// Parsed keys of all records. Malformed keys are skipped.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.keys().filter_map(|k| k.parse().ok()).collect()
    }
}
