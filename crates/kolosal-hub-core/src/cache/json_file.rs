//! One-JSON-file-per-record cache backend.
//!
//! Disk holds every record. A bounded in-memory tier in front of it saves
//! re-reading files this process has already seen.

use super::atomic::{atomic_read_json, atomic_write_json};
use super::store::CacheNamespace;
use super::traits::{CacheBackend, CacheRecord};
use crate::config::CacheConfig;
use crate::error::{HubError, Result};
use mini_moka::sync::Cache;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// Characters that can't appear in a file name on every platform.
const INVALID_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// File names written by [`JsonFileBackend::record_path`].
static RECORD_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    let namespaces: Vec<&str> = CacheNamespace::ALL.iter().map(|ns| ns.as_str()).collect();
    Regex::new(&format!(
        r"^(?:{})-.+-[0-9a-f]{{8}}\.json$",
        namespaces.join("|")
    ))
    .expect("record filename regex must compile")
});

/// Cache backend writing `<namespace>-<key>-<hash>.json` files into a
/// directory.
///
/// Only files matching that naming scheme are treated as records, so the
/// directory may be shared with other JSON files.
pub struct JsonFileBackend {
    dir: PathBuf,
    memory: Cache<(String, String), CacheRecord>,
}

impl JsonFileBackend {
    /// Open a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_memory_limits(dir, CacheConfig::MEMORY_CAPACITY, CacheConfig::MEMORY_TTL)
    }

    /// Like [`JsonFileBackend::new`] with an explicit size and lifetime for
    /// the in-memory tier.
    pub fn with_memory_limits(dir: impl AsRef<Path>, capacity: u64, ttl: Duration) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| HubError::Io {
            message: format!("Failed to create cache directory: {}", e),
            path: Some(dir.clone()),
            source: Some(e),
        })?;

        Ok(Self {
            dir,
            memory: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key` in `namespace`.
    ///
    /// The hash suffix keeps keys that sanitise to the same text apart.
    pub fn record_path(&self, namespace: &str, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.dir.join(format!(
            "{}-{}-{}.json",
            namespace,
            sanitize_key(key),
            &digest[..8]
        ))
    }

    /// Record files currently in the directory.
    fn record_files(&self) -> Result<Vec<PathBuf>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HubError::io_with_path(e, &self.dir)),
        };

        let mut files = Vec::new();
        for entry in read_dir {
            let path = entry.map_err(|e| HubError::io_with_path(e, &self.dir))?.path();
            let is_record = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| RECORD_FILENAME.is_match(name));
            if is_record && path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Replace characters that are invalid in file names with `_`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

impl CacheBackend for JsonFileBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    fn load(&self, namespace: &str, key: &str) -> Result<Option<CacheRecord>> {
        let memory_key = (namespace.to_string(), key.to_string());
        if let Some(record) = self.memory.get(&memory_key) {
            return Ok(Some(record));
        }

        let path = self.record_path(namespace, key);
        let Some(record) = atomic_read_json::<CacheRecord>(&path)? else {
            return Ok(None);
        };
        if record.key != key {
            debug!(
                "Ignoring {}: holds key '{}', expected '{}'",
                path.display(),
                record.key,
                key
            );
            return Ok(None);
        }

        self.memory.insert(memory_key, record.clone());
        Ok(Some(record))
    }

    fn store(&self, namespace: &str, record: &CacheRecord) -> Result<()> {
        let path = self.record_path(namespace, &record.key);
        atomic_write_json(&path, record)?;
        self.memory
            .insert((namespace.to_string(), record.key.clone()), record.clone());
        Ok(())
    }

    fn clear_all(&self) -> Result<usize> {
        self.memory.invalidate_all();

        let mut removed = 0;
        for path in self.record_files()? {
            fs::remove_file(&path).map_err(|e| HubError::io_with_path(e, &path))?;
            removed += 1;
        }
        debug!("Removed {} cache files from {}", removed, self.dir.display());
        Ok(removed)
    }

    fn has_any(&self) -> Result<bool> {
        Ok(!self.record_files()?.is_empty())
    }
}
