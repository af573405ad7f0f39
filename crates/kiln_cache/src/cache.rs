//! The cache handle passed to tasks.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::artifact::ArtifactStore;
use crate::error::CacheError;
use crate::index::CacheIndex;
use crate::key::CacheKey;

/// Lookup counters for one invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from disk.
    pub hits: usize,
    /// Lookups that had to run the operation.
    pub misses: usize,
}

/// Persistent `operation|sha1` to bytes store.
///
/// One value is created per invocation and handed to every task that needs
/// it. Entries written through [`put`](Self::put) are on disk immediately;
/// the index that makes them visible to later invocations is written by
/// [`save`](Self::save).
pub struct TransformCache {
    cache_dir: PathBuf,
    index: CacheIndex,
    store: ArtifactStore,
    kiln_version: String,
    stats: CacheStats,
}

impl TransformCache {
    /// Opens the cache at `cache_dir`, starting empty if there is no index or
    /// the index was written by a different kiln version.
    pub fn load_or_create(cache_dir: &Path, kiln_version: &str) -> Self {
        let index = CacheIndex::load(cache_dir)
            .filter(|i| i.is_compatible(kiln_version))
            .unwrap_or_else(|| CacheIndex::new(kiln_version));
        debug!(
            target: "kiln::cache",
            dir = %cache_dir.display(),
            entries = index.entries.len(),
            "opened transformation cache"
        );
        Self {
            cache_dir: cache_dir.to_path_buf(),
            index,
            store: ArtifactStore::new(cache_dir),
            kiln_version: kiln_version.to_string(),
            stats: CacheStats::default(),
        }
    }

    /// Returns the stored bytes for `key`, counting a hit or a miss.
    ///
    /// An indexed entry whose file is unreadable is dropped from the index.
    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<u8>> {
        let found = if self.index.contains(key) {
            let bytes = self.store.read_artifact(key);
            if bytes.is_none() {
                debug!(target: "kiln::cache", %key, "discarding unreadable entry");
                self.index.remove(key);
            }
            bytes
        } else {
            None
        };
        match found {
            Some(_) => self.stats.hits += 1,
            None => self.stats.misses += 1,
        }
        found
    }

    /// Stores `data` under `key`.
    pub fn put(&mut self, key: &CacheKey, data: &[u8]) -> Result<(), CacheError> {
        self.store.write_artifact(key, data, &self.kiln_version)?;
        self.index.insert(key, data.len() as u64);
        debug!(target: "kiln::cache", %key, bytes = data.len(), "stored entry");
        Ok(())
    }

    /// Returns the cached bytes for `key`, or runs `compute` and stores its
    /// output. The flag is `true` on a hit.
    pub fn get_or_compute<E, F>(&mut self, key: &CacheKey, compute: F) -> Result<(Vec<u8>, bool), E>
    where
        E: From<CacheError>,
        F: FnOnce() -> Result<Vec<u8>, E>,
    {
        if let Some(bytes) = self.get(key) {
            return Ok((bytes, true));
        }
        let bytes = compute()?;
        self.put(key, &bytes)?;
        Ok((bytes, false))
    }

    /// Counters since the cache was opened.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Writes the index.
    pub fn save(&self) -> Result<(), CacheError> {
        self.index.save(&self.cache_dir)
    }

    /// Deletes entry files that the index does not list, such as outputs
    /// of an earlier invocation that stopped before saving.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let keys = self.index.keys();
        let live: Vec<&CacheKey> = keys.iter().collect();
        let removed = self.store.gc(&live)?;
        if removed > 0 {
            debug!(target: "kiln::cache", removed, "removed unindexed entries");
        }
        Ok(removed)
    }

    /// Empties the cache, on disk and in memory.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        clear_dir(&self.cache_dir)?;
        self.index = CacheIndex::new(&self.kiln_version);
        Ok(())
    }
}

/// Removes a cache directory and everything in it. A missing directory is fine.
pub fn clear_dir(cache_dir: &Path) -> Result<(), CacheError> {
    match std::fs::remove_dir_all(cache_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(cache_dir, e)),
    }
}
