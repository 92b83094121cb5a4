//! Crash-safe JSON persistence.
//!
//! Writes go to a sibling temp file that is synced and then renamed over the
//! target, so a reader sees either the previous document or the new one.

use crate::error::{HubError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if it can't be read
/// or parsed.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(HubError::Io {
                message: format!("Failed to read {}", path.display()),
                path: Some(path.to_path_buf()),
                source: Some(e),
            })
        }
    };

    let data: T = serde_json::from_str(&contents).map_err(|e| HubError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically.
///
/// Parent directories are created as needed.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| HubError::Io {
                message: format!("Failed to create directory {}", parent.display()),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }
    }

    let serialized = serde_json::to_string_pretty(data).map_err(|e| HubError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    let temp_path = temp_path_for(path);
    if let Err(e) = write_synced(&temp_path, serialized.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        HubError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Unique temp path next to `path`: `<name>.<pid>.<n>.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.tmp", process::id(), n));
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |what: &str, e: std::io::Error| HubError::Io {
        message: format!("Failed to {} temp file {}", what, path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| io_err("create", e))?;
    file.write_all(bytes).map_err(|e| io_err("write", e))?;
    file.flush().map_err(|e| io_err("flush", e))?;
    file.sync_all().map_err(|e| io_err("sync", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.json");
        let data = Sample {
            name: "sample".to_string(),
            value: 42,
        };

        atomic_write_json(&path, &data).unwrap();

        let read: Option<Sample> = atomic_read_json(&path).unwrap();
        assert_eq!(read, Some(data));
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.json");

        for value in 0..3 {
            let data = Sample {
                name: "x".to_string(),
                value,
            };
            atomic_write_json(&path, &data).unwrap();
        }

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("sample.json")]);
        let read: Option<Sample> = atomic_read_json(&path).unwrap();
        assert_eq!(read.unwrap().value, 2);
    }

    #[test]
    fn test_read_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let read: Option<Sample> = atomic_read_json(&temp_dir.path().join("none.json")).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn test_read_corrupt_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{\"name\": ").unwrap();

        let err = atomic_read_json::<Sample>(&path).unwrap_err();
        assert!(matches!(err, HubError::Json { .. }));
    }

    #[test]
    fn test_write_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("sample.json");

        atomic_write_json(&path, &vec![1, 2, 3]).unwrap();
        assert!(path.exists());
    }
}
