// src/stage/cache.rs

//! Content-hash cache used by the image stage.
//!
//! Re-encoding images is by far the slowest stage, so files whose source
//! content is unchanged since the last committed run are skipped. The cache
//! is an explicit blake3-keyed store with an explicit clear operation; there
//! is no eviction policy because entries are only ever as numerous as the
//! source files.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, info};

/// Relative path (from the project root) to the cache file.
pub const CACHE_FILE_PATH: &str = ".assetpipe/cache";

fn cache_file_path(root: &Path) -> PathBuf {
    root.join(CACHE_FILE_PATH)
}

/// Hash of a file's contents.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// File-backed content-hash store, keyed by stage-relative source path.
#[derive(Debug)]
pub struct HashCache {
    path: Option<PathBuf>,
    map: Mutex<HashMap<String, String>>,
}

impl HashCache {
    /// Load the cache stored under `root` (missing file means empty cache).
    pub fn load(root: &Path) -> Self {
        let path = cache_file_path(root);
        let map = read_cache_file(&path).unwrap_or_default();
        Self {
            path: Some(path),
            map: Mutex::new(map),
        }
    }

    /// Cache that never persists; used in tests.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            map: Mutex::new(HashMap::new()),
        }
    }

    /// True if the stored hash for `key` matches `hash`.
    pub fn is_unchanged(&self, key: &str, hash: &str) -> bool {
        match self.map.lock() {
            Ok(map) => map.get(key).is_some_and(|h| h == hash),
            Err(_) => false,
        }
    }

    pub fn record(&self, key: &str, hash: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.insert(key.to_string(), hash.to_string());
        }
    }

    /// Write the cache back to disk (no-op for in-memory caches).
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let map = self
            .map
            .lock()
            .map_err(|_| anyhow::anyhow!("cache mutex poisoned"))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory at {parent:?}"))?;
        }

        let file =
            File::create(path).with_context(|| format!("creating cache file at {path:?}"))?;
        let mut writer = BufWriter::new(file);
        for (key, hash) in map.iter() {
            writeln!(writer, "{key} {hash}")?;
        }
        writer.flush()?;

        debug!(entries = map.len(), "persisted content-hash cache");
        Ok(())
    }

    /// Delete the on-disk cache under `root`.
    pub fn clear(root: &Path) -> Result<()> {
        let path = cache_file_path(root);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("removing cache file at {path:?}"))?;
            info!(?path, "cleared content-hash cache");
        }
        Ok(())
    }
}

fn read_cache_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let file = File::open(path).with_context(|| format!("opening cache file at {path:?}"))?;
    let reader = BufReader::new(file);

    let mut map = HashMap::new();
    for line_res in reader.lines() {
        let line = line_res?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some((key, hash)) = trimmed.rsplit_once(char::is_whitespace) {
            map.insert(key.to_string(), hash.trim().to_string());
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_only_after_record() {
        let cache = HashCache::in_memory();
        let hash = content_hash(b"pixels");

        assert!(!cache.is_unchanged("images/logo.png", &hash));
        cache.record("images/logo.png", &hash);
        assert!(cache.is_unchanged("images/logo.png", &hash));
        assert!(!cache.is_unchanged("images/logo.png", &content_hash(b"other")));
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HashCache::load(dir.path());
        cache.record("images/a.png", "abc123");
        cache.persist().unwrap();

        let reloaded = HashCache::load(dir.path());
        assert!(reloaded.is_unchanged("images/a.png", "abc123"));

        HashCache::clear(dir.path()).unwrap();
        let cleared = HashCache::load(dir.path());
        assert!(!cleared.is_unchanged("images/a.png", "abc123"));
    }
}
