//! On-disk storage of cached transformation outputs.
//!
//! Each entry is one file at `<cache_dir>/<operation>/<digest>.bin`: a
//! little-endian `u32` header length, a bincode [`ArtifactHeader`], then the
//! payload bytes. The header carries magic bytes, a format version, the full
//! key and an XXH3 checksum of the payload, so a truncated or foreign file is
//! detected and treated as absent.

use std::path::{Path, PathBuf};

use kiln_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::key::CacheKey;

const ARTIFACT_MAGIC: [u8; 4] = *b"KILN";

/// Bumped whenever the header or payload layout changes.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

const ARTIFACT_EXT: &str = "bin";

/// Header stored in front of every payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Always `b"KILN"`.
    pub magic: [u8; 4],
    /// Layout version.
    pub format_version: u32,
    /// Version of kiln that wrote the entry.
    pub kiln_version: String,
    /// The entry's key in display form.
    pub key: String,
    /// Checksum of the payload.
    pub checksum: ContentHash,
}

/// Reads and writes entry files under a cache directory.
pub struct ArtifactStore {
    cache_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at `cache_dir`. Nothing is touched on disk yet.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Where the entry for `key` lives.
    pub fn artifact_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(key.op())
            .join(format!("{}.{ARTIFACT_EXT}", key.digest()))
    }

    /// Writes `data` as the entry for `key`, replacing any previous entry.
    pub fn write_artifact(
        &self,
        key: &CacheKey,
        data: &[u8],
        kiln_version: &str,
    ) -> Result<PathBuf, CacheError> {
        let dir = self.cache_dir.join(key.op());
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            kiln_version: kiln_version.to_string(),
            key: key.to_string(),
            checksum: ContentHash::from_bytes(data),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        let path = self.artifact_path(key);
        std::fs::write(&path, &output).map_err(|e| CacheError::io(&path, e))?;
        Ok(path)
    }

    /// Reads the entry for `key`.
    ///
    /// Any problem with the file (missing, short, bad magic, other format
    /// version, key or checksum mismatch) yields `None`.
    pub fn read_artifact(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let raw = std::fs::read(self.artifact_path(key)).ok()?;
        let len_bytes: [u8; 4] = raw.get(..4)?.try_into().ok()?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_end = 4usize.checked_add(header_len)?;
        let (header, _): (ArtifactHeader, usize) = bincode::serde::decode_from_slice(
            raw.get(4..header_end)?,
            bincode::config::standard(),
        )
        .ok()?;

        if header.magic != ARTIFACT_MAGIC
            || header.format_version != ARTIFACT_FORMAT_VERSION
            || header.key != key.to_string()
        {
            return None;
        }
        let payload = &raw[header_end..];
        (ContentHash::from_bytes(payload) == header.checksum).then(|| payload.to_vec())
    }

    /// Deletes entry files whose key is not in `live`, returning how many were removed.
    ///
    /// Only `<op>/<digest>.bin` files are considered; anything else in the
    /// cache directory is left alone.
    pub fn gc(&self, live: &[&CacheKey]) -> Result<usize, CacheError> {
        if !self.cache_dir.is_dir() {
            return Ok(0);
        }
        let mut removed = 0;
        for op_entry in read_dir(&self.cache_dir)? {
            let op_dir = op_entry.path();
            let Some(op) = op_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if !op_dir.is_dir() {
                continue;
            }
            for entry in read_dir(&op_dir)? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
                    continue;
                }
                let Some(digest) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let is_live = live.iter().any(|k| k.op() == op && k.digest() == digest);
                if !is_live {
                    std::fs::remove_file(&path).map_err(|e| CacheError::io(&path, e))?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<std::fs::DirEntry>, CacheError> {
    std::fs::read_dir(dir)
        .and_then(|entries| entries.collect())
        .map_err(|e| CacheError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        (dir, store)
    }

    fn write_raw(store: &ArtifactStore, key: &CacheKey, header: &ArtifactHeader, payload: &[u8]) {
        let bytes = bincode::serde::encode_to_vec(header, bincode::config::standard()).unwrap();
        let mut out = Vec::new();
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&bytes);
        out.extend_from_slice(payload);
        let path = store.artifact_path(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, out).unwrap();
    }

    fn header_for(key: &CacheKey, payload: &[u8]) -> ArtifactHeader {
        ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            kiln_version: "0.1.0".to_string(),
            key: key.to_string(),
            checksum: ContentHash::from_bytes(payload),
        }
    }

    #[test]
    fn write_then_read() {
        let (_dir, store) = make_store();
        let key = CacheKey::new("uglify", b"var a = 1;");
        let path = store.write_artifact(&key, b"var a=1;", "0.1.0").unwrap();
        assert!(path.ends_with(format!("uglify/{}.bin", key.digest())));
        assert_eq!(store.read_artifact(&key).unwrap(), b"var a=1;");
    }

    #[test]
    fn missing_and_garbage_are_misses() {
        let (_dir, store) = make_store();
        let key = CacheKey::new("uglify", b"x");
        assert!(store.read_artifact(&key).is_none());

        let path = store.artifact_path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"AB").unwrap();
        assert!(store.read_artifact(&key).is_none());
        std::fs::write(&path, [0xff, 0xff, 0xff, 0xff, 1, 2, 3]).unwrap();
        assert!(store.read_artifact(&key).is_none());
    }

    #[test]
    fn wrong_magic_is_miss() {
        let (_dir, store) = make_store();
        let key = CacheKey::new("jshint", b"a");
        let mut header = header_for(&key, b"ok");
        header.magic = *b"JUNK";
        write_raw(&store, &key, &header, b"ok");
        assert!(store.read_artifact(&key).is_none());
    }

    #[test]
    fn other_format_version_is_miss() {
        let (_dir, store) = make_store();
        let key = CacheKey::new("jshint", b"a");
        let mut header = header_for(&key, b"ok");
        header.format_version = 99;
        write_raw(&store, &key, &header, b"ok");
        assert!(store.read_artifact(&key).is_none());
    }

    #[test]
    fn tampered_payload_is_miss() {
        let (_dir, store) = make_store();
        let key = CacheKey::new("uglify", b"a");
        write_raw(&store, &key, &header_for(&key, b"original"), b"tampered");
        assert!(store.read_artifact(&key).is_none());
    }

    #[test]
    fn entry_under_wrong_key_is_miss() {
        let (_dir, store) = make_store();
        let key = CacheKey::new("uglify", b"a");
        let other = CacheKey::new("uglify", b"b");
        write_raw(&store, &key, &header_for(&other, b"x"), b"x");
        assert!(store.read_artifact(&key).is_none());
    }

    #[test]
    fn gc_keeps_live_keys_only() {
        let (dir, store) = make_store();
        let keep = CacheKey::new("uglify", b"keep");
        let drop = CacheKey::new("jshint", b"drop");
        store.write_artifact(&keep, b"1", "0.1.0").unwrap();
        store.write_artifact(&drop, b"2", "0.1.0").unwrap();
        std::fs::write(dir.path().join("index.json"), "{}").unwrap();

        assert_eq!(store.gc(&[&keep]).unwrap(), 1);
        assert!(store.read_artifact(&keep).is_some());
        assert!(store.read_artifact(&drop).is_none());
        assert!(dir.path().join("index.json").exists());
    }

    #[test]
    fn gc_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(&dir.path().join("absent"));
        assert_eq!(store.gc(&[]).unwrap(), 0);
    }
}
