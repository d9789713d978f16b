//! File-backed response cache
//!
//! Provides a `CacheManager` that stores each upstream payload as
//! `<key>.json` in a cache directory. The file holds the raw payload only;
//! freshness comes from the file's modification time.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tracing::{debug, warn};

use super::ResponseStore;
use crate::error::CacheError;

/// Extension of every cache entry file
const ENTRY_EXTENSION: &str = "json";

/// Manages reading and writing cached responses on disk
///
/// Entries older than the TTL, and entries that cannot be read back as JSON,
/// are deleted the next time they are looked at. Writes go through a temp file
/// and a rename so a reader never sees a half-written entry from this process.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// Maximum age of a servable entry
    ttl: Duration,
}

impl CacheManager {
    /// Creates a CacheManager rooted at `cache_dir`
    ///
    /// The directory is created lazily on first write.
    pub fn new(cache_dir: PathBuf, ttl: Duration) -> Self {
        Self { cache_dir, ttl }
    }

    /// Directory holding the entry files
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, ENTRY_EXTENSION))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Age of a file according to its modification time
    ///
    /// A timestamp in the future counts as age zero.
    fn age_of(path: &Path) -> io::Result<Duration> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }

    fn is_entry(path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some(ENTRY_EXTENSION)
    }

    fn read_entry(path: &Path) -> Result<Value, CacheError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_entry(&self, key: &str, payload: &Value) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let path = self.cache_path(key);
        let json = serde_json::to_string_pretty(payload)?;

        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Removes a file, ignoring a file that is already gone
    fn remove(path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove cache entry");
            }
        }
    }

    /// Entry files currently in the cache directory
    fn entries(&self) -> Vec<PathBuf> {
        match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| Self::is_entry(path))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl ResponseStore for CacheManager {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.cache_path(key);

        let age = match Self::age_of(&path) {
            Ok(age) => age,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, error = %e, "unreadable cache entry, removing");
                Self::remove(&path);
                return None;
            }
        };

        if age > self.ttl {
            debug!(key, age_secs = age.as_secs(), "cache entry expired");
            Self::remove(&path);
            return None;
        }

        match Self::read_entry(&path) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(key, error = %e, "corrupt cache entry, removing");
                Self::remove(&path);
                None
            }
        }
    }

    fn set(&self, key: &str, payload: &Value) {
        if let Err(e) = self.write_entry(key, payload) {
            warn!(key, error = %e, "failed to write cache entry");
        }
    }

    fn clear(&self) -> usize {
        let mut removed = 0;
        for path in self.entries() {
            if fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    fn clear_expired(&self) -> usize {
        let mut removed = 0;
        for path in self.entries() {
            let expired = matches!(Self::age_of(&path), Ok(age) if age > self.ttl);
            if expired && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}
